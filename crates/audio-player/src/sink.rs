use crate::decode::StreamFormat;
use crate::error::SinkError;

/// Audio output collaborator.
///
/// One instance is owned by the render thread and reopened for every track. `write`
/// blocks until the device has room: that is the render loop's only throttle.
pub trait Sink {
    /// Open an output stream for `format`.
    fn open(&mut self, format: &StreamFormat) -> Result<(), SinkError>;

    /// Write interleaved samples, blocking until they are accepted.
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError>;

    /// Abort output immediately, discarding anything still buffered.
    fn stop(&mut self);

    /// Release the stream. Audio that was not discarded by `stop` is played out first.
    fn close(&mut self);
}
