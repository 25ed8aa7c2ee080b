//! CPAL output stream.
//!
//! Builds the device stream and the real-time callback. The callback:
//! - refills a small local buffer from the [`SampleBuffer`] without blocking
//! - applies basic channel mapping (mono↔stereo, best-effort otherwise)
//! - converts `f32` samples to the device sample format

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use cpal::traits::DeviceTrait;

use crate::buffer::SampleBuffer;

#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Maximum number of frames to pull from the buffer per refill.
    pub refill_max_frames: usize,
    /// Incremented by the number of frames filled with silence.
    pub underrun_frames: Arc<AtomicU64>,
}

/// Build a CPAL output stream that plays audio from `buffer`.
///
/// `buffer` must hold interleaved `f32` samples already at the device sample rate.
/// Underruns are filled with silence; the callback never waits.
pub fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    buffer: &Arc<SampleBuffer>,
    cfg: PlaybackConfig,
) -> Result<cpal::Stream> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, buffer, cfg),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, buffer, cfg),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, buffer, cfg),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, buffer, cfg),
        other => Err(anyhow!("Unsupported sample format: {other:?}")),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: &Arc<SampleBuffer>,
    cfg: PlaybackConfig,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = usize::from(config.channels).max(1);
    let refill_max_frames = cfg.refill_max_frames.max(1);
    let underrun_frames = cfg.underrun_frames;
    let buffer_cb = buffer.clone();

    let mut st = CallbackState {
        pos: 0,
        src_channels: buffer.channels(),
        src: Vec::new(),
    };

    let err_fn = |err| tracing::warn!(error = %err, "stream error");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let silence = <T as cpal::Sample>::from_sample::<f32>(0.0);
            let frames = data.len() / channels_out;

            for frame in 0..frames {
                if st.pos >= st.src.len() {
                    st.pos = 0;
                    st.src.clear();
                    match buffer_cb.pop_nonblocking(refill_max_frames) {
                        Some(v) => st.src = v,
                        None => {
                            let remaining = frames - frame;
                            underrun_frames.fetch_add(remaining as u64, Ordering::Relaxed);
                            data[frame * channels_out..].fill(silence);
                            return;
                        }
                    }
                }
                for ch in 0..channels_out {
                    data[frame * channels_out + ch] =
                        <T as cpal::Sample>::from_sample::<f32>(st.next_sample_mapped(channels_out, ch));
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Samples already pulled from the buffer but not yet written to the device.
struct CallbackState {
    pos: usize,
    src_channels: usize,
    src: Vec<f32>,
}

impl CallbackState {
    /// Read one output sample for `dst_ch`, applying a simple channel mapping:
    /// mono is duplicated, stereo to mono is averaged, anything else clamps to the
    /// last available source channel.
    ///
    /// `pos` advances once per destination frame (after the last channel).
    fn next_sample_mapped(&mut self, dst_channels: usize, dst_ch: usize) -> f32 {
        if self.pos >= self.src.len() {
            return 0.0;
        }

        let frame_start = self.pos;
        let get_src = |ch: usize| -> f32 {
            if ch < self.src_channels && frame_start + ch < self.src.len() {
                self.src[frame_start + ch]
            } else {
                0.0
            }
        };

        let out = match (self.src_channels, dst_channels) {
            (2, 1) => 0.5 * (get_src(0) + get_src(1)),
            (1, _) => get_src(0),
            _ => get_src(dst_ch.min(self.src_channels.saturating_sub(1))),
        };

        if dst_ch + 1 == dst_channels {
            self.pos += self.src_channels;
        }
        out
    }
}
