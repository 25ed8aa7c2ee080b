use serde::{Deserialize, Serialize};

/// Transport state of the playback engine.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// No render thread is active.
    #[default]
    Idle,
    /// Render thread active and writing samples.
    Playing,
    /// Render thread active, sample writes suspended.
    Paused,
    /// Shutdown requested; render thread draining to exit.
    Stopping,
}

impl TransportState {
    /// `true` while a render thread owns the output (playing or paused).
    pub fn is_active(self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Paused)
    }
}

/// Why the render loop stopped rendering a track.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackEndReason {
    /// Natural end of stream.
    Eof,
    /// The user asked for the next track.
    Skipped,
    /// The track was removed from the queue (or the queue was cleared/reshuffled).
    Removed,
    /// Playback was shut down.
    Stopped,
    /// Decoder or sink failure.
    Error,
}

/// One row of a queue view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntry {
    /// Position in the queue.
    pub index: usize,
    /// Resource path, lossily converted for display.
    pub path: String,
    /// `true` for the entry under the cursor.
    pub current: bool,
}

/// Point-in-time engine status for front-ends.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerStatus {
    /// Transport state.
    pub state: TransportState,
    /// Track currently being rendered, if any.
    pub now_playing: Option<String>,
    /// Cursor position, `None` when the queue is empty.
    pub cursor: Option<usize>,
    /// Number of queued tracks.
    pub queue_len: usize,
    /// Volume as a 0..=100 percent.
    pub volume_percent: u8,
    /// Reason the last track stopped rendering.
    pub last_end_reason: Option<TrackEndReason>,
}
