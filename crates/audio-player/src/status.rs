//! Read-only views over the engine state for front-ends.

use player_types::{PlayerStatus, QueueEntry};

use crate::queue::TrackQueue;
use crate::state::EngineState;

pub(crate) fn snapshot(st: &EngineState, volume_percent: u8) -> PlayerStatus {
    PlayerStatus {
        state: st.transport,
        now_playing: st.now_playing.as_ref().map(|t| t.display_name()),
        cursor: st.queue.cursor(),
        queue_len: st.queue.len(),
        volume_percent,
        last_end_reason: st.last_end_reason,
    }
}

pub(crate) fn queue_entries(queue: &TrackQueue) -> Vec<QueueEntry> {
    let cursor = queue.cursor();
    queue
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| QueueEntry {
            index,
            path: track.display_name(),
            current: cursor == Some(index),
        })
        .collect()
}
