use anyhow::Result;

use crate::config::OutputConfig;
use crate::decode::{Decoder, SymphoniaDecoder};
use crate::output::CpalSink;
use crate::sink::Sink;

/// Factory for the decoder and sink a render thread owns.
///
/// Each render thread asks for one of each when it starts and reuses them for every
/// track, so the collaborators themselves need not be `Send`.
pub trait AudioBackend: Send + Sync + 'static {
    fn decoder(&self) -> Box<dyn Decoder>;
    fn sink(&self) -> Box<dyn Sink>;
}

/// Local files through Symphonia, played on a CPAL output device.
#[derive(Clone, Debug, Default)]
pub struct SystemBackend {
    output: OutputConfig,
}

impl SystemBackend {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Print the host's output devices to stdout.
    pub fn list_devices() -> Result<()> {
        crate::device::list_devices(&cpal::default_host())
    }
}

impl AudioBackend for SystemBackend {
    fn decoder(&self) -> Box<dyn Decoder> {
        Box::new(SymphoniaDecoder::new())
    }

    fn sink(&self) -> Box<dyn Sink> {
        Box::new(CpalSink::new(self.output.clone()))
    }
}
