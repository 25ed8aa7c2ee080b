//! Engine notifications for the control surface.
//!
//! Every subscriber gets its own unbounded channel; emitting never blocks the
//! caller, so events can be published while the engine state lock is held.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use player_types::{TrackEndReason, TransportState};

use crate::track::Track;

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    /// A track began rendering.
    TrackChanged { track: Track, index: usize },
    /// A track stopped rendering.
    TrackEnded { track: Track, reason: TrackEndReason },
    /// A track was skipped because it could not be opened, decoded, or played.
    TrackFailed { track: Track, reason: String },
    /// The queue length changed. Published under the queue lock.
    QueueChanged { len: usize },
    /// Transport state changed.
    StateChanged(TransportState),
    /// The engine returned to idle.
    PlaybackEnded,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<PlayerEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver to every live subscriber, pruning the ones that hung up.
    pub fn emit(&self, event: PlayerEvent) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
