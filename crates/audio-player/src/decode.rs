//! Decoder collaborator.
//!
//! [`Decoder`] is the contract the render loop drives: open a track, pull chunks of
//! interleaved `i16` samples, close. [`SymphoniaDecoder`] is the system implementation:
//! it probes the container with Symphonia, decodes packet by packet, and converts
//! everything to interleaved signed 16-bit samples.

use std::fs::File;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;
use crate::track::Track;

/// Sample encoding reported by a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleEncoding {
    SignedInt16,
    SignedInt24,
    SignedInt32,
    Float32,
}

/// Stream format reported by [`Decoder::open`] and handed to [`crate::Sink::open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl StreamFormat {
    pub fn s16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            encoding: SampleEncoding::SignedInt16,
        }
    }

    /// Check the format is one the render loop can play.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.encoding != SampleEncoding::SignedInt16 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "sample encoding {:?}",
                self.encoding
            )));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{} Hz, {} channel(s)",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }
}

/// Compressed-audio-to-samples collaborator.
///
/// One instance is owned by the render thread and reused for every track.
pub trait Decoder {
    /// Open `track` and report its format. Replaces any previously open stream.
    fn open(&mut self, track: &Track) -> Result<StreamFormat, DecodeError>;

    /// Fill `buf` with interleaved samples and return how many were written.
    ///
    /// Returns [`DecodeError::EndOfStream`] once the stream is exhausted.
    fn read_chunk(&mut self, buf: &mut [i16]) -> Result<usize, DecodeError>;

    /// Release the open stream, if any.
    fn close(&mut self);
}

/// Symphonia-backed [`Decoder`] for local files.
#[derive(Default)]
pub struct SymphoniaDecoder {
    stream: Option<OpenStream>,
}

struct OpenStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    pending: Vec<i16>,
    offset: usize,
    finished: bool,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for SymphoniaDecoder {
    fn open(&mut self, track: &Track) -> Result<StreamFormat, DecodeError> {
        self.stream = None;

        let file = File::open(track.path())
            .map_err(|e| DecodeError::Open(format!("open {}: {e}", track)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = track.extension_hint() {
            hint.with_extension(&ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Open(format!("probe {}: {e}", track)))?;

        let format = probed.format;
        let default_track = format
            .default_track()
            .ok_or_else(|| DecodeError::Open("no default audio track".to_string()))?;
        let track_id = default_track.id;
        let codec_params: CodecParameters = default_track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| DecodeError::UnsupportedFormat("unknown sample rate".to_string()))?;
        let channels = codec_params
            .channels
            .ok_or_else(|| DecodeError::UnsupportedFormat("unknown channel layout".to_string()))?
            .count();
        let channels = u16::try_from(channels)
            .map_err(|_| DecodeError::UnsupportedFormat(format!("{channels} channels")))?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

        tracing::debug!(
            path = %track,
            rate_hz = sample_rate,
            channels,
            "decoder opened"
        );

        self.stream = Some(OpenStream {
            format,
            decoder,
            track_id,
            pending: Vec::new(),
            offset: 0,
            finished: false,
        });

        // Output is always converted to interleaved i16.
        Ok(StreamFormat::s16(sample_rate, channels))
    }

    fn read_chunk(&mut self, buf: &mut [i16]) -> Result<usize, DecodeError> {
        let stream = self.stream.as_mut().ok_or(DecodeError::NotOpen)?;

        let mut filled = 0;
        while filled < buf.len() {
            if stream.offset < stream.pending.len() {
                let n = (stream.pending.len() - stream.offset).min(buf.len() - filled);
                buf[filled..filled + n]
                    .copy_from_slice(&stream.pending[stream.offset..stream.offset + n]);
                stream.offset += n;
                filled += n;
                continue;
            }
            if stream.finished || !stream.decode_next()? {
                break;
            }
        }

        if filled == 0 && stream.finished {
            return Err(DecodeError::EndOfStream);
        }
        Ok(filled)
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

impl OpenStream {
    /// Decode the next packet of our track into `pending`.
    ///
    /// Returns `Ok(false)` at end of stream.
    fn decode_next(&mut self) -> Result<bool, DecodeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.finished = true;
                    return Ok(false);
                }
                Err(e) => return Err(DecodeError::Read(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut sample_buf =
                        SampleBuffer::<i16>::new(decoded.frames() as u64, *decoded.spec());
                    sample_buf.copy_interleaved_ref(decoded);
                    self.pending.clear();
                    self.pending.extend_from_slice(sample_buf.samples());
                    self.offset = 0;
                    return Ok(true);
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    // Corrupt packet: drop it and keep going.
                    tracing::debug!(error = msg, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(DecodeError::Read(e.to_string())),
            }
        }
    }
}
