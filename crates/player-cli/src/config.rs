//! Configuration loading and merging.
//!
//! An optional TOML file supplies defaults; command-line flags win over it.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use audio_player::{OutputConfig, PlayerConfig};
use serde::Deserialize;

use crate::cli::Args;

/// Player configuration loaded from TOML. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Output device substring match.
    pub device: Option<String>,
    /// Initial volume percent.
    pub volume: Option<u8>,
    pub chunk_frames: Option<usize>,
    pub buffer_seconds: Option<f32>,
    pub shutdown_timeout_ms: Option<u64>,
    pub shuffle: Option<bool>,
    /// Max frames pulled per output callback refill.
    pub refill_max_frames: Option<usize>,
    /// Resampler input chunk size in frames.
    pub resample_chunk_frames: Option<usize>,
    pub idle_wait_ms: Option<u64>,
    pub pause_poll_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<FileConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }
}

/// Effective settings after merging file and flags.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub player: PlayerConfig,
    pub output: OutputConfig,
    pub shuffle: bool,
}

pub fn resolve(args: &Args, file: &FileConfig) -> ResolvedConfig {
    let mut player = PlayerConfig::default();
    let mut output = OutputConfig::default();

    if let Some(frames) = args.chunk_frames.or(file.chunk_frames) {
        player.chunk_frames = frames.max(1);
    }
    if let Some(percent) = args.volume.or(file.volume) {
        player.initial_volume_percent = percent.min(100);
    }
    if let Some(ms) = args.shutdown_timeout_ms.or(file.shutdown_timeout_ms) {
        player.shutdown_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = file.idle_wait_ms {
        player.idle_wait = Duration::from_millis(ms.max(1));
    }
    if let Some(ms) = file.pause_poll_ms {
        player.pause_poll = Duration::from_millis(ms.max(1));
    }

    output.device = normalize_device_name(args.device.clone().or_else(|| file.device.clone()));
    if let Some(secs) = args.buffer_seconds.or(file.buffer_seconds) {
        output.buffer_seconds = secs;
    }
    if let Some(frames) = file.refill_max_frames {
        output.refill_max_frames = frames;
    }
    if let Some(frames) = file.resample_chunk_frames {
        output.resample_chunk_frames = frames;
    }

    ResolvedConfig {
        player,
        output,
        shuffle: args.shuffle || file.shuffle.unwrap_or(false),
    }
}

fn normalize_device_name(device: Option<String>) -> Option<String> {
    device.and_then(|name| {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
