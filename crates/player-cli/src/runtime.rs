//! Player runtime.
//!
//! Builds the engine, prints its events, and drives it from stdin until `quit`,
//! Ctrl-C, or stdin closing after Ctrl-C.

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use audio_player::{Player, PlayerEvent, SystemBackend, TransportState};
use crossbeam_channel::{Receiver, select};

use crate::config::ResolvedConfig;
use crate::control::{self, ControlCommand, HELP};

/// List output devices and print them to stdout.
pub fn list_devices() -> Result<()> {
    SystemBackend::list_devices()
}

pub fn run(config: ResolvedConfig, paths: Vec<PathBuf>) -> Result<()> {
    let player = Player::with_system_output(config.player, config.output);

    let events = player.subscribe();
    let printer = thread::Builder::new()
        .name("events".to_string())
        .spawn(move || print_events(events))
        .context("spawn event printer")?;

    let (quit_tx, quit_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = quit_tx.try_send(());
    })
    .context("install Ctrl-C handler")?;

    if !paths.is_empty() {
        let added = if config.shuffle {
            player.add_tracks_shuffled(&paths)?
        } else {
            player.add_tracks(&paths)?
        };
        tracing::info!(count = added, "queued");
    }

    let lines = spawn_stdin_reader()?;
    loop {
        select! {
            recv(quit_rx) -> _ => break,
            recv(lines) -> line => match line {
                Ok(line) => match control::parse(&line) {
                    Ok(Some(ControlCommand::Quit)) => break,
                    Ok(Some(cmd)) => execute(&player, cmd),
                    Ok(None) => {}
                    Err(e) => eprintln!("{e:#}"),
                },
                Err(_) => {
                    // stdin closed: keep playing until Ctrl-C.
                    tracing::debug!("stdin closed");
                    let _ = quit_rx.recv();
                    break;
                }
            },
        }
    }

    let clean = match player.shutdown() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "shutdown");
            false
        }
    };
    drop(player);
    // An abandoned render thread keeps the event bus alive; don't wait on it.
    if clean {
        let _ = printer.join();
    }
    Ok(())
}

fn execute(player: &Player, cmd: ControlCommand) {
    match cmd {
        ControlCommand::Add(paths) => match player.add_tracks(&paths) {
            Ok(n) => println!("queued {n} track(s)"),
            Err(e) => eprintln!("add failed: {e}"),
        },
        ControlCommand::Remove(index) => match player.remove_at(index) {
            Ok(track) => println!("removed {track}"),
            Err(e) => eprintln!("{e}"),
        },
        ControlCommand::Shuffle => {
            if !player.shuffle() {
                println!("nothing to shuffle");
            }
        }
        ControlCommand::Clear => player.clear_queue(),
        ControlCommand::Pause => {
            player.pause();
        }
        ControlCommand::Resume => {
            player.resume();
        }
        ControlCommand::Toggle => {
            player.toggle_pause();
        }
        ControlCommand::Next => {
            if !player.skip_next() {
                println!("not playing");
            }
        }
        ControlCommand::Volume(percent) => println!("volume {}%", player.set_volume(percent)),
        ControlCommand::List => {
            let entries = player.queue_snapshot();
            if entries.is_empty() {
                println!("(queue empty)");
            }
            for entry in entries {
                let marker = if entry.current { '*' } else { ' ' };
                println!("{marker} {:>3}  {}", entry.index, entry.path);
            }
        }
        ControlCommand::Status => match serde_json::to_string_pretty(&player.status()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("status: {e}"),
        },
        ControlCommand::Help => println!("{HELP}"),
        ControlCommand::Quit => {}
    }
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawn stdin reader")?;
    Ok(rx)
}

/// Runs until every sender is gone, i.e. the player was dropped.
fn print_events(events: Receiver<PlayerEvent>) {
    for event in events.iter() {
        match event {
            PlayerEvent::TrackChanged { track, index } => println!("now playing [{index}] {track}"),
            PlayerEvent::TrackFailed { track, reason } => eprintln!("skipped {track}: {reason}"),
            PlayerEvent::TrackEnded { track, reason } => {
                tracing::debug!(path = %track, ?reason, "track ended");
            }
            PlayerEvent::QueueChanged { len } => tracing::debug!(len, "queue changed"),
            PlayerEvent::StateChanged(TransportState::Paused) => println!("paused"),
            PlayerEvent::StateChanged(state) => tracing::debug!(?state, "state"),
            PlayerEvent::PlaybackEnded => println!("stopped"),
        }
    }
}
