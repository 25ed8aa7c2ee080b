use std::time::Duration;

/// Engine tuning parameters.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Frames requested from the decoder per chunk.
    ///
    /// This is also the cancellation granularity: skip/stop are observed between chunks.
    pub chunk_frames: usize,
    /// Upper bound on one idle wait while the queue is empty.
    pub idle_wait: Duration,
    /// Upper bound on one wait while paused.
    pub pause_poll: Duration,
    /// How long `shutdown` waits for the render thread before abandoning it.
    pub shutdown_timeout: Duration,
    /// Volume at construction (0..=100).
    pub initial_volume_percent: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            chunk_frames: 4096,
            idle_wait: Duration::from_millis(100),
            pause_poll: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(3),
            initial_volume_percent: 100,
        }
    }
}

/// Output parameters for the CPAL sink.
#[derive(Clone, Debug)]
pub struct OutputConfig {
    /// Output device substring match; `None` uses the host default.
    pub device: Option<String>,
    /// Sample buffer between render thread and device callback, in seconds.
    pub buffer_seconds: f32,
    /// Max frames pulled per output callback refill.
    pub refill_max_frames: usize,
    /// Resampler input chunk size in frames.
    pub resample_chunk_frames: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: None,
            buffer_seconds: 0.5,
            refill_max_frames: 4096,
            resample_chunk_frames: 1024,
        }
    }
}
