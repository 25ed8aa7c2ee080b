//! Queue-driven local audio playback engine.
//!
//! A [`Player`] owns a [`TrackQueue`], a transport state machine and one render thread
//! that streams the track under the cursor from a [`Decoder`] through the gain stage
//! into a [`Sink`]. [`SystemBackend`] supplies the real collaborators: Symphonia for
//! decoding and CPAL (with Rubato resampling) for output.

pub mod backend;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod device;
pub mod error;
pub mod events;
pub mod gain;
pub mod output;
pub mod playback;
pub mod player;
pub mod queue;
pub mod resample;
pub mod sink;
pub mod track;

mod render;
mod state;
mod status;

pub use backend::{AudioBackend, SystemBackend};
pub use config::{OutputConfig, PlayerConfig};
pub use decode::{Decoder, SampleEncoding, StreamFormat, SymphoniaDecoder};
pub use error::{DecodeError, PlayerError, QueueError, SinkError};
pub use events::PlayerEvent;
pub use gain::Volume;
pub use output::CpalSink;
pub use player::Player;
pub use player_types::{PlayerStatus, QueueEntry, TrackEndReason, TransportState};
pub use queue::{PendingAdvance, TrackQueue};
pub use sink::Sink;
pub use track::Track;
