//! Opus-backed implementation of the codec boundary
//!
//! Wraps the `opus` crate with voice-tuned settings and reusable buffers.

use bytes::Bytes;
use opus::{Application, Channels, Decoder, Encoder};

use crate::config::AudioFormat;
use crate::constants::MAX_PACKET_SIZE;
use crate::error::CodecError;

use super::{CodecProvider, FrameDecoder, FrameEncoder};

/// Production codec provider backed by libopus.
///
/// Carries no state of its own; per-session encoder/decoder state is
/// created through [`CodecProvider`] and released on drop.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpusCodec;

impl CodecProvider for OpusCodec {
    fn new_encoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameEncoder>, CodecError> {
        Ok(Box::new(OpusFrameEncoder::new(format)?))
    }

    fn new_decoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameDecoder>, CodecError> {
        Ok(Box::new(OpusFrameDecoder::new(format)?))
    }
}

/// Opus encoder with voice-optimized settings
pub struct OpusFrameEncoder {
    encoder: Encoder,
    format: AudioFormat,
    /// Encoding buffer (reused to avoid allocations)
    encode_buffer: Vec<u8>,
    /// Frame counter for statistics
    frames_encoded: u64,
    /// Total bytes produced
    bytes_produced: u64,
}

impl OpusFrameEncoder {
    /// Create a new encoder for the given format
    pub fn new(format: &AudioFormat) -> Result<Self, CodecError> {
        let channels = match format.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            _ => {
                return Err(CodecError::EncoderInit(format!(
                    "Unsupported channel count: {}",
                    format.channels
                )))
            }
        };

        let encoder = Encoder::new(format.sample_rate, channels, Application::Voip)
            .map_err(|e| CodecError::EncoderInit(e.to_string()))?;

        Ok(Self {
            encoder,
            format: *format,
            encode_buffer: vec![0u8; MAX_PACKET_SIZE],
            frames_encoded: 0,
            bytes_produced: 0,
        })
    }

    /// Get statistics
    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            frames_encoded: self.frames_encoded,
            bytes_produced: self.bytes_produced,
            average_packet_size: if self.frames_encoded > 0 {
                self.bytes_produced as f32 / self.frames_encoded as f32
            } else {
                0.0
            },
        }
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError> {
        let expected = self.format.samples_per_frame();
        if pcm.len() != expected {
            return Err(CodecError::InvalidFrameSize(pcm.len()));
        }

        let size = self
            .encoder
            .encode(pcm, &mut self.encode_buffer)
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

        self.frames_encoded += 1;
        self.bytes_produced += size as u64;

        Ok(Bytes::copy_from_slice(&self.encode_buffer[..size]))
    }
}

/// Encoder statistics
#[derive(Debug, Clone)]
pub struct EncoderStats {
    pub frames_encoded: u64,
    pub bytes_produced: u64,
    pub average_packet_size: f32,
}

/// Opus decoder for a fixed frame format
pub struct OpusFrameDecoder {
    decoder: Decoder,
    format: AudioFormat,
    frames_decoded: u64,
}

impl OpusFrameDecoder {
    /// Create a new decoder for the given format
    pub fn new(format: &AudioFormat) -> Result<Self, CodecError> {
        let channels = match format.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            _ => {
                return Err(CodecError::DecoderInit(format!(
                    "Unsupported channel count: {}",
                    format.channels
                )))
            }
        };

        let decoder = Decoder::new(format.sample_rate, channels)
            .map_err(|e| CodecError::DecoderInit(e.to_string()))?;

        Ok(Self {
            decoder,
            format: *format,
            frames_decoded: 0,
        })
    }

    /// Frames decoded so far
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, packet: &[u8], pcm_out: &mut [i16]) -> Result<usize, CodecError> {
        let expected = self.format.samples_per_frame();
        if pcm_out.len() != expected {
            return Err(CodecError::InvalidFrameSize(pcm_out.len()));
        }

        let samples = self
            .decoder
            .decode(packet, pcm_out, false)
            .map_err(|e| CodecError::DecodingFailed(e.to_string()))?;

        self.frames_decoded += 1;

        Ok(samples * self.format.channels as usize)
    }
}
