//! Transport controller.
//!
//! [`Player`] is the single handle a front-end holds. Commands are fire-and-forget
//! in-memory updates under the engine mutex, followed by a condvar notification so a
//! waiting render thread reacts within one chunk or one bounded wait. `shutdown` is the
//! only command that waits on the render thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use player_types::{PlayerStatus, QueueEntry, TransportState};

use crate::backend::{AudioBackend, SystemBackend};
use crate::config::{OutputConfig, PlayerConfig};
use crate::error::{PlayerError, Result};
use crate::events::PlayerEvent;
use crate::render;
use crate::state::{EngineState, Shared};
use crate::status;
use crate::track::Track;

pub struct Player {
    shared: Arc<Shared>,
    backend: Arc<dyn AudioBackend>,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    join: JoinHandle<()>,
    /// Disconnects when the render thread returns.
    done: Receiver<()>,
}

impl Player {
    pub fn new(config: PlayerConfig, backend: impl AudioBackend) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
            backend: Arc::new(backend),
            worker: Mutex::new(None),
        }
    }

    /// Player decoding local files with Symphonia and playing through CPAL.
    pub fn with_system_output(config: PlayerConfig, output: OutputConfig) -> Self {
        Self::new(config, SystemBackend::new(output))
    }

    /// Append tracks. Starts the render thread if the engine is idle.
    ///
    /// The queue is unchanged if storage cannot grow. If the render thread cannot be
    /// spawned the tracks stay queued and the engine stays idle.
    pub fn add_tracks<I, T>(&self, tracks: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: Into<Track>,
    {
        self.enqueue(tracks, false)
    }

    /// Append tracks and shuffle the whole queue before anything starts rendering.
    pub fn add_tracks_shuffled<I, T>(&self, tracks: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: Into<Track>,
    {
        self.enqueue(tracks, true)
    }

    fn enqueue<I, T>(&self, tracks: I, shuffle: bool) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: Into<Track>,
    {
        let mut st = self.shared.lock();
        let added = st.queue.extend(tracks.into_iter().map(Into::into))?;
        if added == 0 {
            return Ok(0);
        }
        if shuffle {
            st.queue.shuffle(&mut rand::rng());
        }
        let len = st.queue.len();
        tracing::debug!(added, len, shuffle, "tracks added");
        self.shared.events.emit(PlayerEvent::QueueChanged { len });
        self.shared.notify();

        if st.transport == TransportState::Idle {
            self.start_render(&mut st)?;
        }
        Ok(added)
    }

    /// Remove the track at `index`. Removing the playing track moves on to its successor.
    pub fn remove_at(&self, index: usize) -> Result<Track> {
        let mut st = self.shared.lock();
        let removed = st.queue.remove_at(index)?;
        let len = st.queue.len();
        tracing::debug!(index, path = %removed, len, "track removed");
        self.shared.events.emit(PlayerEvent::QueueChanged { len });
        self.shared.notify();
        Ok(removed)
    }

    /// Shuffle the queue and restart from the new head. Returns `false` for `len <= 1`.
    pub fn shuffle(&self) -> bool {
        let mut st = self.shared.lock();
        if !st.queue.shuffle(&mut rand::rng()) {
            return false;
        }
        let len = st.queue.len();
        tracing::debug!(len, "queue shuffled");
        self.shared.events.emit(PlayerEvent::QueueChanged { len });
        self.shared.notify();
        true
    }

    pub fn clear_queue(&self) {
        let mut st = self.shared.lock();
        st.queue.clear();
        tracing::debug!("queue cleared");
        self.shared.events.emit(PlayerEvent::QueueChanged { len: 0 });
        self.shared.notify();
    }

    /// `Playing -> Paused`. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.transition(TransportState::Playing, TransportState::Paused)
    }

    /// `Paused -> Playing`. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        self.transition(TransportState::Paused, TransportState::Playing)
    }

    /// Flip between playing and paused; returns the resulting state.
    pub fn toggle_pause(&self) -> TransportState {
        let mut st = self.shared.lock();
        let next = match st.transport {
            TransportState::Playing => TransportState::Paused,
            TransportState::Paused => TransportState::Playing,
            other => return other,
        };
        self.shared.set_transport(&mut st, next);
        self.shared.notify();
        next
    }

    /// Abandon the playing track and advance one position. Resumes if paused.
    ///
    /// Returns `false` when the engine is not running.
    pub fn skip_next(&self) -> bool {
        let mut st = self.shared.lock();
        if !st.transport.is_active() {
            return false;
        }
        if st.now_playing.is_none() {
            // Between tracks: `begin_track` would discard a pending skip.
            st.queue.skip_unstarted();
        } else {
            st.queue.request_skip();
        }
        self.shared.set_transport(&mut st, TransportState::Playing);
        self.shared.notify();
        true
    }

    /// Set the volume in percent (clamped to 100). Effective from the next chunk.
    pub fn set_volume(&self, percent: u8) -> u8 {
        self.shared.volume.set_percent(percent);
        let percent = self.shared.volume.percent();
        tracing::debug!(percent, "volume");
        percent
    }

    /// Set the gain factor directly (clamped to `[0.0, 1.0]`).
    pub fn set_volume_level(&self, level: f32) -> f32 {
        self.shared.volume.set_level(level)
    }

    pub fn volume_percent(&self) -> u8 {
        self.shared.volume.percent()
    }

    pub fn state(&self) -> TransportState {
        self.shared.lock().transport
    }

    pub fn status(&self) -> PlayerStatus {
        let st = self.shared.lock();
        status::snapshot(&st, self.shared.volume.percent())
    }

    pub fn queue_snapshot(&self) -> Vec<QueueEntry> {
        status::queue_entries(&self.shared.lock().queue)
    }

    /// New event receiver. Dropping it unsubscribes.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    /// Stop the render thread and return to `Idle`.
    ///
    /// Waits up to the configured shutdown timeout. On timeout the thread is abandoned:
    /// the engine is reclaimed as `Idle` anyway and the thread releases its handles once
    /// it observes the stop. The queue and cursor are kept.
    pub fn shutdown(&self) -> Result<()> {
        let stop_generation = {
            let mut st = self.shared.lock();
            if matches!(
                st.transport,
                TransportState::Idle | TransportState::Stopping
            ) {
                return Ok(());
            }
            self.shared.set_transport(&mut st, TransportState::Stopping);
            self.shared.notify();
            st.generation
        };

        let timeout = self.shared.config.shutdown_timeout;
        let mut timed_out = false;
        if let Some(worker) = self.worker().take() {
            match worker.done.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(?timeout, "render thread did not stop; abandoning it");
                    timed_out = true;
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if worker.join.join().is_err() {
                        tracing::warn!("render thread panicked");
                    }
                }
            }
        }

        let mut st = self.shared.lock();
        if st.generation == stop_generation {
            st.generation = st.generation.wrapping_add(1);
            st.now_playing = None;
            self.shared.set_transport(&mut st, TransportState::Idle);
            self.shared.events.emit(PlayerEvent::PlaybackEnded);
        }
        drop(st);

        if timed_out {
            return Err(PlayerError::ShutdownTimeout(timeout));
        }
        Ok(())
    }

    fn transition(&self, from: TransportState, to: TransportState) -> bool {
        let mut st = self.shared.lock();
        if st.transport != from {
            return false;
        }
        self.shared.set_transport(&mut st, to);
        self.shared.notify();
        true
    }

    fn start_render(&self, st: &mut EngineState) -> Result<()> {
        let generation = st.generation;
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let backend = Arc::clone(&self.backend);

        let join = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || {
                let _done = done_tx;
                render::run(shared, backend, generation);
            })
            .map_err(PlayerError::Spawn)?;

        *self.worker() = Some(Worker {
            join,
            done: done_rx,
        });
        self.shared.set_transport(st, TransportState::Playing);
        Ok(())
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "shutdown on drop");
        }
    }
}
