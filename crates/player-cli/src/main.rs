//! `player`: queue local audio files and play them on an output device.
//!
//! Tracks given on the command line are queued and played in order, looping back to
//! the head. Commands typed on stdin (`help` lists them) edit the queue and drive the
//! transport while it plays.

mod cli;
mod config;
mod control;
mod runtime;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,audio_player=info,player=info")
        }))
        .init();

    if args.list_devices {
        return runtime::list_devices();
    }

    let file = match &args.config {
        Some(path) => config::FileConfig::load(path)?,
        None => config::FileConfig::default(),
    };
    let resolved = config::resolve(&args, &file);
    tracing::debug!(?resolved, "config");

    runtime::run(resolved, args.paths.clone())
}
