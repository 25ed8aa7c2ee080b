//! Engine state shared between the control surface and the render thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use player_types::{TrackEndReason, TransportState};

use crate::config::PlayerConfig;
use crate::events::{EventBus, PlayerEvent};
use crate::gain::Volume;
use crate::queue::TrackQueue;
use crate::track::Track;

/// Everything guarded by the engine mutex.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) queue: TrackQueue,
    pub(crate) transport: TransportState,
    /// Bumped whenever a render thread is retired; a thread whose generation no
    /// longer matches must exit without touching the queue.
    pub(crate) generation: u64,
    pub(crate) now_playing: Option<Track>,
    pub(crate) last_end_reason: Option<TrackEndReason>,
}

pub(crate) struct Shared {
    state: Mutex<EngineState>,
    changed: Condvar,
    pub(crate) volume: Volume,
    pub(crate) events: EventBus,
    pub(crate) config: PlayerConfig,
}

impl Shared {
    pub(crate) fn new(config: PlayerConfig) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            changed: Condvar::new(),
            volume: Volume::from_percent(config.initial_volume_percent),
            events: EventBus::new(),
            config,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake every waiter (idle wait, pause wait).
    pub(crate) fn notify(&self) {
        self.changed.notify_all();
    }

    pub(crate) fn wait<'a>(
        &self,
        guard: MutexGuard<'a, EngineState>,
        timeout: Duration,
    ) -> MutexGuard<'a, EngineState> {
        let (guard, _timeout) = self
            .changed
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }

    /// Change transport state and publish it. No-op if unchanged.
    pub(crate) fn set_transport(&self, st: &mut EngineState, next: TransportState) {
        if st.transport == next {
            return;
        }
        tracing::info!(from = ?st.transport, to = ?next, "transport");
        st.transport = next;
        self.events.emit(PlayerEvent::StateChanged(next));
    }
}

impl EngineState {
    /// Whether the render thread started as `generation` must exit.
    pub(crate) fn stop_requested(&self, generation: u64) -> bool {
        self.generation != generation || self.transport == TransportState::Stopping
    }
}
