//! Streaming sample-rate conversion.
//!
//! Uses Rubato to convert interleaved `f32` audio from the track rate to the device
//! rate. Runs inline on the render thread: input is accumulated into fixed-size chunks
//! and every full chunk is converted immediately.

use anyhow::{Result, anyhow};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{
    Async, FixedAsync, Indexing, Resampler, SincInterpolationParameters, SincInterpolationType,
    WindowFunction, calculate_cutoff,
};

pub struct StreamResampler {
    resampler: Async<f32>,
    channels: usize,
    chunk_frames: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
}

impl StreamResampler {
    pub fn new(src_rate: u32, dst_rate: u32, channels: usize, chunk_frames: usize) -> Result<Self> {
        if src_rate == 0 || dst_rate == 0 || channels == 0 {
            return Err(anyhow!(
                "invalid resampler shape: {src_rate} Hz -> {dst_rate} Hz, {channels} channel(s)"
            ));
        }
        let f_ratio = dst_rate as f64 / src_rate as f64;

        let sinc_len = 128;
        let window = WindowFunction::BlackmanHarris2;
        let params = SincInterpolationParameters {
            sinc_len,
            f_cutoff: calculate_cutoff(sinc_len, window),
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 256,
            window,
        };

        let chunk_frames = chunk_frames.max(1);
        let resampler = Async::<f32>::new_sinc(
            f_ratio,
            1.1,
            &params,
            chunk_frames,
            channels,
            FixedAsync::Input,
        )?;
        let scratch = vec![0.0f32; resampler.output_frames_max() * channels];

        tracing::debug!(
            src_rate_hz = src_rate,
            dst_rate_hz = dst_rate,
            channels,
            chunk_frames,
            "resampler created"
        );

        Ok(Self {
            resampler,
            channels,
            chunk_frames,
            pending: Vec::with_capacity(chunk_frames * channels),
            scratch,
        })
    }

    /// Convert `input`, appending produced samples to `out`.
    ///
    /// Input that does not fill a whole chunk is held until the next call or [`flush`].
    ///
    /// [`flush`]: StreamResampler::flush
    pub fn process(&mut self, input: &[f32], out: &mut Vec<f32>) -> Result<()> {
        self.pending.extend_from_slice(input);

        let chunk_samples = self.chunk_frames * self.channels;
        let mut start = 0;
        while self.pending.len() - start >= chunk_samples {
            convert_block(
                &mut self.resampler,
                &self.pending[start..start + chunk_samples],
                self.channels,
                None,
                &mut self.scratch,
                out,
            )?;
            start += chunk_samples;
        }
        self.pending.drain(..start);
        Ok(())
    }

    /// Convert whatever partial chunk is still held.
    pub fn flush(&mut self, out: &mut Vec<f32>) -> Result<()> {
        let tail_frames = self.pending.len() / self.channels;
        if tail_frames > 0 {
            let tail = std::mem::take(&mut self.pending);
            convert_block(
                &mut self.resampler,
                &tail[..tail_frames * self.channels],
                self.channels,
                Some(tail_frames),
                &mut self.scratch,
                out,
            )?;
        }
        self.pending.clear();
        Ok(())
    }
}

fn convert_block(
    resampler: &mut Async<f32>,
    input: &[f32],
    channels: usize,
    partial_len: Option<usize>,
    scratch: &mut [f32],
    out: &mut Vec<f32>,
) -> Result<()> {
    let frames = input.len() / channels;
    let input_adapter = InterleavedSlice::new(input, channels, frames)
        .map_err(|e| anyhow!("interleaved slice (input): {e}"))?;

    let out_capacity_frames = scratch.len() / channels;
    let mut output_adapter = InterleavedSlice::new_mut(scratch, channels, out_capacity_frames)
        .map_err(|e| anyhow!("interleaved slice (output): {e}"))?;

    let indexing = Indexing {
        input_offset: 0,
        output_offset: 0,
        active_channels_mask: None,
        partial_len,
    };

    let (_nbr_in, nbr_out) =
        resampler.process_into_buffer(&input_adapter, &mut output_adapter, Some(&indexing))?;

    out.extend_from_slice(&scratch[..nbr_out * channels]);
    Ok(())
}
