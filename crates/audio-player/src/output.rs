//! CPAL-backed [`Sink`].
//!
//! `open` selects the device and stream config, sizes the [`SampleBuffer`] and inserts a
//! [`StreamResampler`] when the device cannot run at the track rate. `write` converts
//! `i16` to `f32` and pushes into the buffer, blocking while it is full.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};

use crate::buffer::{SampleBuffer, calc_max_buffered_samples};
use crate::config::OutputConfig;
use crate::decode::StreamFormat;
use crate::device::{pick_buffer_size, pick_device, pick_output_config};
use crate::error::SinkError;
use crate::playback::{self, PlaybackConfig};
use crate::resample::StreamResampler;
use crate::sink::Sink;

/// Extra time allowed for the device to play out buffered audio on close.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

pub struct CpalSink {
    config: OutputConfig,
    active: Option<ActiveOutput>,
}

struct ActiveOutput {
    stream: cpal::Stream,
    buffer: Arc<SampleBuffer>,
    resampler: Option<StreamResampler>,
    converted: Vec<f32>,
    resampled: Vec<f32>,
    underrun_frames: Arc<AtomicU64>,
}

impl CpalSink {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    fn open_stream(&self, format: &StreamFormat) -> Result<ActiveOutput> {
        let host = cpal::default_host();
        let device = pick_device(&host, self.config.device.as_deref())?;
        let supported = pick_output_config(&device, format.sample_rate, format.channels)
            .context("select output config")?;

        let mut stream_config: cpal::StreamConfig = supported.clone().into();
        if let Some(buffer_size) = pick_buffer_size(&supported) {
            stream_config.buffer_size = buffer_size;
        }
        let device_rate = stream_config.sample_rate;
        let channels = usize::from(format.channels);

        let buffer = Arc::new(SampleBuffer::new(
            channels,
            calc_max_buffered_samples(device_rate, channels, self.config.buffer_seconds),
        ));

        let resampler = if device_rate != format.sample_rate {
            tracing::info!(
                from_hz = format.sample_rate,
                to_hz = device_rate,
                "resampling"
            );
            Some(StreamResampler::new(
                format.sample_rate,
                device_rate,
                channels,
                self.config.resample_chunk_frames,
            )?)
        } else {
            None
        };

        let underrun_frames = Arc::new(AtomicU64::new(0));
        let stream = playback::build_output_stream(
            &device,
            &stream_config,
            supported.sample_format(),
            &buffer,
            PlaybackConfig {
                refill_max_frames: self.config.refill_max_frames,
                underrun_frames: underrun_frames.clone(),
            },
        )
        .context("build output stream")?;
        stream.play().context("start output stream")?;

        let device_name = device
            .description()
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        tracing::info!(
            device = %device_name,
            rate_hz = device_rate,
            channels = stream_config.channels,
            sample_format = ?supported.sample_format(),
            buffer_size = ?stream_config.buffer_size,
            "output opened"
        );

        Ok(ActiveOutput {
            stream,
            buffer,
            resampler,
            converted: Vec::new(),
            resampled: Vec::new(),
            underrun_frames,
        })
    }
}

impl Sink for CpalSink {
    fn open(&mut self, format: &StreamFormat) -> Result<(), SinkError> {
        self.stop();
        let active = self
            .open_stream(format)
            .map_err(|e| SinkError::Open(format!("{e:#}")))?;
        self.active = Some(active);
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| SinkError::Write("no output stream open".to_string()))?;

        active.converted.clear();
        active
            .converted
            .extend(samples.iter().map(|&s| f32::from(s) / 32_768.0));

        let accepted = match active.resampler.as_mut() {
            Some(resampler) => {
                active.resampled.clear();
                resampler
                    .process(&active.converted, &mut active.resampled)
                    .map_err(|e| SinkError::Write(format!("{e:#}")))?;
                active.buffer.push_blocking(&active.resampled)
            }
            None => active.buffer.push_blocking(&active.converted),
        };
        if !accepted {
            return Err(SinkError::Write("output buffer closed".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.buffer.clear();
            active.buffer.close();
            if let Err(e) = active.stream.pause() {
                tracing::debug!(error = %e, "pause on stop failed");
            }
        }
    }

    fn close(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(resampler) = active.resampler.as_mut() {
            active.resampled.clear();
            match resampler.flush(&mut active.resampled) {
                Ok(()) => {
                    active.buffer.push_blocking(&active.resampled);
                }
                Err(e) => tracing::warn!(error = %e, "resampler flush failed"),
            }
        }

        let buffered_secs = if self.config.buffer_seconds.is_finite() {
            self.config.buffer_seconds.clamp(0.0, 10.0)
        } else {
            0.0
        };
        let drain_timeout = Duration::from_secs_f32(buffered_secs) + DRAIN_GRACE;
        if !active.buffer.wait_drained(drain_timeout) {
            tracing::debug!(
                remaining_frames = active.buffer.len_frames(),
                "output did not drain before close"
            );
        }
        active.buffer.close();

        let underruns = active.underrun_frames.load(Ordering::Relaxed);
        if underruns > 0 {
            tracing::debug!(underrun_frames = underruns, "output underruns");
        }
    }
}
