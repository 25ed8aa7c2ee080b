//! Render loop.
//!
//! One thread per [`crate::Player`] run. It pulls the track under the cursor, streams it
//! chunk by chunk from the decoder through the gain stage into the sink, and advances
//! the cursor when the track ends. Every wait happens on the engine condvar with a
//! bounded timeout; cancellation (skip, removal, stop) is observed between chunks.

use std::sync::Arc;

use player_types::{TrackEndReason, TransportState};

use crate::backend::AudioBackend;
use crate::decode::Decoder;
use crate::error::DecodeError;
use crate::events::PlayerEvent;
use crate::gain;
use crate::queue::PendingAdvance;
use crate::sink::Sink;
use crate::state::Shared;
use crate::track::Track;

/// How rendering of one track ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Finished,
    /// A skip or removal was signalled.
    Interrupted,
    Stopped,
    Failed(String),
}

enum Checkpoint {
    Continue,
    Interrupted,
    Stop,
}

pub(crate) fn run(shared: Arc<Shared>, backend: Arc<dyn AudioBackend>, generation: u64) {
    let mut decoder = backend.decoder();
    let mut sink = backend.sink();
    let mut failures_in_row = 0usize;

    tracing::debug!(generation, "render loop started");

    while let Some((index, track)) = next_track(&shared, generation, &mut failures_in_row) {
        let outcome = play_track(
            &shared,
            generation,
            decoder.as_mut(),
            sink.as_mut(),
            index,
            &track,
        );
        if matches!(outcome, Outcome::Failed(_)) {
            failures_in_row += 1;
        } else {
            failures_in_row = 0;
        }
        if !finish_track(&shared, generation, &track, outcome) {
            break;
        }
    }

    tracing::debug!(generation, "render loop exited");
}

/// Block until there is a track to play or a stop is requested.
///
/// Backs off for one idle interval once every queued track has failed in a row.
fn next_track(
    shared: &Shared,
    generation: u64,
    failures_in_row: &mut usize,
) -> Option<(usize, Track)> {
    let idle_wait = shared.config.idle_wait;
    let mut st = shared.lock();
    loop {
        if st.stop_requested(generation) {
            return None;
        }
        if !st.queue.is_empty() && *failures_in_row >= st.queue.len() {
            tracing::warn!(failures = *failures_in_row, "every queued track failed; backing off");
            *failures_in_row = 0;
            st = shared.wait(st, idle_wait);
            continue;
        }
        if let Some((index, track)) = st.queue.begin_track() {
            st.now_playing = Some(track.clone());
            return Some((index, track));
        }
        st = shared.wait(st, idle_wait);
    }
}

fn play_track(
    shared: &Shared,
    generation: u64,
    decoder: &mut dyn Decoder,
    sink: &mut dyn Sink,
    index: usize,
    track: &Track,
) -> Outcome {
    let format = match decoder.open(track) {
        Ok(format) => format,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    if let Err(e) = format.validate() {
        decoder.close();
        return Outcome::Failed(e.to_string());
    }
    if let Err(e) = sink.open(&format) {
        decoder.close();
        return Outcome::Failed(e.to_string());
    }

    tracing::info!(
        path = %track,
        index,
        rate_hz = format.sample_rate,
        channels = format.channels,
        "track started"
    );
    shared.events.emit(PlayerEvent::TrackChanged {
        track: track.clone(),
        index,
    });

    let chunk_samples = shared.config.chunk_frames.max(1) * usize::from(format.channels);
    let outcome = stream_chunks(shared, generation, decoder, sink, chunk_samples);

    if outcome != Outcome::Finished {
        sink.stop();
    }
    sink.close();
    decoder.close();
    outcome
}

fn stream_chunks(
    shared: &Shared,
    generation: u64,
    decoder: &mut dyn Decoder,
    sink: &mut dyn Sink,
    chunk_samples: usize,
) -> Outcome {
    let mut buf = vec![0i16; chunk_samples];
    loop {
        match checkpoint(shared, generation) {
            Checkpoint::Continue => {}
            Checkpoint::Interrupted => return Outcome::Interrupted,
            Checkpoint::Stop => return Outcome::Stopped,
        }

        let n = match decoder.read_chunk(&mut buf) {
            Ok(0) | Err(DecodeError::EndOfStream) => return Outcome::Finished,
            Ok(n) => n,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        let chunk = &mut buf[..n];
        gain::apply(chunk, shared.volume.level());
        if let Err(e) = sink.write(chunk) {
            return Outcome::Failed(e.to_string());
        }
    }
}

/// Chunk boundary: observe stop and pending advance, and hold here while paused.
fn checkpoint(shared: &Shared, generation: u64) -> Checkpoint {
    let mut st = shared.lock();
    loop {
        if st.stop_requested(generation) {
            return Checkpoint::Stop;
        }
        if st.queue.pending() != PendingAdvance::None {
            return Checkpoint::Interrupted;
        }
        if st.transport != TransportState::Paused {
            return Checkpoint::Continue;
        }
        st = shared.wait(st, shared.config.pause_poll);
    }
}

/// Record how the track ended and move the cursor.
///
/// Returns `false` when the loop must exit.
fn finish_track(shared: &Shared, generation: u64, track: &Track, outcome: Outcome) -> bool {
    let mut st = shared.lock();
    if st.generation != generation {
        // Abandoned by a timed-out shutdown; the engine state belongs to someone else.
        return false;
    }
    st.now_playing = None;

    let reason = match outcome {
        Outcome::Stopped => TrackEndReason::Stopped,
        Outcome::Finished => {
            st.queue.advance();
            TrackEndReason::Eof
        }
        Outcome::Interrupted => match st.queue.advance() {
            PendingAdvance::Removed => TrackEndReason::Removed,
            PendingAdvance::UserSkip | PendingAdvance::None => TrackEndReason::Skipped,
        },
        Outcome::Failed(reason) => {
            st.queue.advance();
            tracing::warn!(path = %track, error = %reason, "track failed");
            shared.events.emit(PlayerEvent::TrackFailed {
                track: track.clone(),
                reason,
            });
            TrackEndReason::Error
        }
    };
    st.last_end_reason = Some(reason);

    if reason != TrackEndReason::Error {
        tracing::info!(path = %track, reason = ?reason, "track ended");
        shared.events.emit(PlayerEvent::TrackEnded {
            track: track.clone(),
            reason,
        });
    }

    !st.stop_requested(generation)
}
