//! Gain stage.
//!
//! Scales decoded `i16` samples by the shared volume level right before they are
//! written to the sink.

use std::sync::atomic::{AtomicU32, Ordering};

/// Shared volume level in `[0.0, 1.0]`.
///
/// Stored as `f32` bits in an atomic so the render loop reads it without locking.
/// A reader may observe a value that is one update stale; that is fine for gain.
#[derive(Debug)]
pub struct Volume {
    bits: AtomicU32,
}

impl Volume {
    pub fn new(level: f32) -> Self {
        Self {
            bits: AtomicU32::new(sanitize_level(level).to_bits()),
        }
    }

    pub fn from_percent(percent: u8) -> Self {
        Self::new(percent_to_level(percent))
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store a new level, clamped to `[0.0, 1.0]`. Returns the stored value.
    pub fn set_level(&self, level: f32) -> f32 {
        let level = sanitize_level(level);
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        level
    }

    pub fn set_percent(&self, percent: u8) -> f32 {
        self.set_level(percent_to_level(percent))
    }

    pub fn percent(&self) -> u8 {
        (self.level() * 100.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn percent_to_level(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

fn sanitize_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Scale one sample, clamping to the `i16` range before truncating.
#[inline]
pub fn scale_sample(sample: i16, level: f32) -> i16 {
    let scaled = f32::from(sample) * level;
    scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Apply `level` to every sample in `chunk` in place.
pub fn apply(chunk: &mut [i16], level: f32) {
    if level == 1.0 {
        return;
    }
    for sample in chunk.iter_mut() {
        *sample = scale_sample(*sample, level);
    }
}
