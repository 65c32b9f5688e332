//! Codec boundary and stream adapters
//!
//! The codec is an opaque, stateful capability reached through the
//! [`FrameEncoder`] and [`FrameDecoder`] traits: one compressed packet per
//! PCM frame in each direction. [`OpusCodec`] is the production
//! implementation; tests use an in-memory stub. [`EncodingSink`] and
//! [`DecodingSource`] adapt those capabilities to byte streams, converting
//! exactly one frame per call.

pub mod opus;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod stub;

pub use opus::OpusCodec;
pub use sink::EncodingSink;
pub use source::DecodingSource;

use bytes::Bytes;

use crate::config::AudioFormat;
use crate::error::CodecError;

/// Encoder half of the codec boundary.
///
/// Stateful; created per session and released when dropped.
pub trait FrameEncoder: Send {
    /// Encode one PCM frame into a compressed packet.
    ///
    /// The input length must equal `frame_size * channels` for the format
    /// the encoder was created with.
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError>;
}

/// Decoder half of the codec boundary.
///
/// Stateful; created per session and released when dropped.
pub trait FrameDecoder: Send {
    /// Decode one compressed packet into `pcm_out`, which must hold exactly
    /// one frame. Returns the number of samples written.
    fn decode(&mut self, packet: &[u8], pcm_out: &mut [i16]) -> Result<usize, CodecError>;
}

/// Factory for per-session codec state.
///
/// A provider is created once at startup and shared read-only between the
/// pipelines; all mutable codec state lives in the encoder/decoder values
/// it hands out.
pub trait CodecProvider: Send + Sync {
    fn new_encoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameEncoder>, CodecError>;

    fn new_decoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameDecoder>, CodecError>;
}
