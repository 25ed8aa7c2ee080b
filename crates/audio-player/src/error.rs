//! Error types for the playback engine and its collaborators.
//!
//! Queue and transport errors are surfaced to the caller. Decoder and sink errors are
//! per-track: the render loop reports them as `TrackFailed` and moves on.

use std::time::Duration;

use thiserror::Error;

/// Queue mutation failures. The queue is left unchanged when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Backing storage could not grow to hold the new tracks.
    #[error("queue storage exhausted while adding {requested} track(s)")]
    ResourceExhausted { requested: usize },

    /// Remove index past the end of the queue.
    #[error("index {index} out of range for queue of length {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Decoder collaborator failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The resource could not be opened or probed.
    #[error("open failed: {0}")]
    Open(String),

    /// The stream opened but its format is not playable by the engine.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding failed mid-stream.
    #[error("decode failed: {0}")]
    Read(String),

    /// `read_chunk` called without an open stream.
    #[error("no stream open")]
    NotOpen,

    /// The stream has no more samples.
    #[error("end of stream")]
    EndOfStream,
}

/// Output sink collaborator failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// No device or stream could be opened for the requested format.
    #[error("output open failed: {0}")]
    Open(String),

    /// A sample write was rejected.
    #[error("output write failed: {0}")]
    Write(String),
}

/// Errors returned by [`crate::Player`] commands.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The render thread did not exit within the shutdown bound.
    #[error("render loop did not exit within {0:?}")]
    ShutdownTimeout(Duration),

    /// The render thread could not be started.
    #[error("failed to start render thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Convenience alias for engine commands.
pub type Result<T> = std::result::Result<T, PlayerError>;
