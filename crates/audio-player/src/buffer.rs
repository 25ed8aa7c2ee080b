//! Bounded sample buffer between the render thread and the CPAL callback.
//!
//! The render thread pushes interleaved `f32` samples and blocks while the buffer is
//! full; the CPAL callback drains it without ever blocking. That blocking push is what
//! throttles the render loop to real time.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe bounded FIFO of interleaved `f32` samples.
///
/// ## Design
/// - One producer (render thread), one consumer (output callback).
/// - Bounded by `max_buffered_samples` to cap latency: a skip or stop can only be
///   delayed by what is already buffered.
/// - A single [`Condvar`] signals "state changed"; the `closed` flag lives under the
///   same mutex as the samples.
pub struct SampleBuffer {
    channels: usize,
    inner: Mutex<BufferInner>,
    cv: Condvar,
    max_buffered_samples: usize,
}

struct BufferInner {
    samples: VecDeque<f32>,
    closed: bool,
}

/// Capacity in **samples** for `seconds` of audio at `(rate_hz, channels)`.
///
/// Non-finite or non-positive durations fall back to half a second.
pub fn calc_max_buffered_samples(rate_hz: u32, channels: usize, seconds: f32) -> usize {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.5
    };

    let frames = (rate_hz as f32 * secs).ceil() as usize;
    frames.max(1).saturating_mul(channels.max(1))
}

impl SampleBuffer {
    pub fn new(channels: usize, max_buffered_samples: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            inner: Mutex::new(BufferInner {
                samples: VecDeque::with_capacity(max_buffered_samples),
                closed: false,
            }),
            cv: Condvar::new(),
            max_buffered_samples: max_buffered_samples.max(channels),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Buffered frames (best-effort snapshot).
    pub fn len_frames(&self) -> usize {
        self.lock().samples.len() / self.channels
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop accepting samples and wake every waiter. Idempotent.
    pub fn close(&self) {
        self.lock().closed = true;
        self.cv.notify_all();
    }

    /// Drop everything buffered.
    pub fn clear(&self) {
        self.lock().samples.clear();
        self.cv.notify_all();
    }

    /// Push samples, blocking while the buffer is full.
    ///
    /// Returns `false` if the buffer was closed before every sample was accepted.
    pub fn push_blocking(&self, samples: &[f32]) -> bool {
        let mut offset = 0;

        while offset < samples.len() {
            let mut g = self.lock();

            while g.samples.len() >= self.max_buffered_samples && !g.closed {
                g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
            }
            if g.closed {
                return false;
            }

            let room = self.max_buffered_samples - g.samples.len();
            let take = room.min(samples.len() - offset);
            g.samples.extend(&samples[offset..offset + take]);
            offset += take;

            drop(g);
            self.cv.notify_all();
        }
        true
    }

    /// Pop up to `max_frames` whole frames without blocking.
    ///
    /// Returns `None` when no full frame is buffered.
    pub fn pop_nonblocking(&self, max_frames: usize) -> Option<Vec<f32>> {
        let mut g = self.lock();

        let available_frames = g.samples.len() / self.channels;
        let take_samples = available_frames.min(max_frames) * self.channels;
        if take_samples == 0 {
            return None;
        }

        let out: Vec<f32> = g.samples.drain(..take_samples).collect();

        drop(g);
        self.cv.notify_all();
        Some(out)
    }

    /// Block until the consumer has drained the buffer, or `timeout` elapses.
    ///
    /// Returns `true` if the buffer emptied in time.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut g = self.lock();
        loop {
            if g.samples.len() < self.channels {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (ng, _timeout) = self
                .cv
                .wait_timeout(g, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            g = ng;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn calc_max_buffered_samples_fallbacks() {
        assert_eq!(calc_max_buffered_samples(48_000, 2, 1.0), 96_000);
        assert_eq!(calc_max_buffered_samples(48_000, 2, -1.0), 48_000);
        assert_eq!(calc_max_buffered_samples(48_000, 2, f32::NAN), 48_000);
        assert_eq!(calc_max_buffered_samples(48_000, 2, f32::INFINITY), 48_000);
    }

    #[test]
    fn pop_nonblocking_empty() {
        let buf = SampleBuffer::new(2, 16);
        assert!(buf.pop_nonblocking(4).is_none());
    }

    #[test]
    fn pop_nonblocking_returns_whole_frames() {
        let buf = SampleBuffer::new(2, 64);
        assert!(buf.push_blocking(&[1.0, 2.0, 3.0, 4.0, 5.0]));

        let out = buf.pop_nonblocking(8).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(buf.pop_nonblocking(8).is_none());
    }

    #[test]
    fn push_blocks_until_consumer_makes_room() {
        let buf = Arc::new(SampleBuffer::new(1, 4));
        let producer = buf.clone();

        let handle = thread::spawn(move || producer.push_blocking(&[1.0; 10]));

        let mut drained = 0;
        while drained < 10 {
            if let Some(v) = buf.pop_nonblocking(2) {
                drained += v.len();
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }
        assert!(handle.join().unwrap());
        assert_eq!(drained, 10);
    }

    #[test]
    fn close_releases_blocked_producer() {
        let buf = Arc::new(SampleBuffer::new(1, 2));
        let producer = buf.clone();
        let handle = thread::spawn(move || producer.push_blocking(&[0.5; 8]));

        thread::sleep(Duration::from_millis(20));
        buf.close();
        assert!(!handle.join().unwrap());
        assert!(buf.is_closed());
    }

    #[test]
    fn clear_discards_buffered_samples() {
        let buf = SampleBuffer::new(2, 64);
        buf.push_blocking(&[0.1; 8]);
        assert_eq!(buf.len_frames(), 4);
        buf.clear();
        assert_eq!(buf.len_frames(), 0);
    }

    #[test]
    fn wait_drained_times_out_when_nobody_consumes() {
        let buf = SampleBuffer::new(2, 64);
        buf.push_blocking(&[0.1; 4]);
        assert!(!buf.wait_drained(Duration::from_millis(10)));
    }

    #[test]
    fn wait_drained_returns_when_consumer_empties() {
        let buf = Arc::new(SampleBuffer::new(2, 64));
        buf.push_blocking(&[0.1; 8]);
        let consumer = buf.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            consumer.pop_nonblocking(16);
        });
        assert!(buf.wait_drained(Duration::from_secs(2)));
        handle.join().unwrap();
    }
}
