//! In-memory codec implementations for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::config::AudioFormat;
use crate::error::CodecError;

use super::{CodecProvider, FrameDecoder, FrameEncoder};

fn encode_passthrough(pcm: &[i16]) -> Bytes {
    let mut packet = Vec::with_capacity(pcm.len() * 2);
    for &sample in pcm {
        packet.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(packet)
}

fn decode_passthrough(packet: &[u8], pcm_out: &mut [i16]) -> Result<usize, CodecError> {
    if packet.len() % 2 != 0 || packet.len() / 2 > pcm_out.len() {
        return Err(CodecError::DecodingFailed(format!(
            "unexpected packet size {}",
            packet.len()
        )));
    }
    for (slot, chunk) in pcm_out.iter_mut().zip(packet.chunks_exact(2)) {
        *slot = i16::from_le_bytes([chunk[0], chunk[1]]);
    }
    let written = packet.len() / 2;
    for slot in &mut pcm_out[written..] {
        *slot = 0;
    }
    Ok(written)
}

/// Lossless passthrough codec: a packet is the frame's samples as
/// little-endian bytes. Counts boundary calls so tests can assert the
/// codec is never touched on rejected input.
#[derive(Default)]
pub(crate) struct StubCodec {
    encode_calls: Arc<AtomicUsize>,
    decode_calls: Arc<AtomicUsize>,
}

impl StubCodec {
    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }
}

impl CodecProvider for StubCodec {
    fn new_encoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameEncoder>, CodecError> {
        Ok(Box::new(StubEncoder {
            samples_per_frame: format.samples_per_frame(),
            calls: self.encode_calls.clone(),
        }))
    }

    fn new_decoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameDecoder>, CodecError> {
        Ok(Box::new(StubDecoder {
            samples_per_frame: format.samples_per_frame(),
            calls: self.decode_calls.clone(),
        }))
    }
}

struct StubEncoder {
    samples_per_frame: usize,
    calls: Arc<AtomicUsize>,
}

impl FrameEncoder for StubEncoder {
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if pcm.len() != self.samples_per_frame {
            return Err(CodecError::InvalidFrameSize(pcm.len()));
        }
        Ok(encode_passthrough(pcm))
    }
}

struct StubDecoder {
    samples_per_frame: usize,
    calls: Arc<AtomicUsize>,
}

impl FrameDecoder for StubDecoder {
    fn decode(&mut self, packet: &[u8], pcm_out: &mut [i16]) -> Result<usize, CodecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if pcm_out.len() != self.samples_per_frame {
            return Err(CodecError::InvalidFrameSize(pcm_out.len()));
        }
        decode_passthrough(packet, pcm_out)
    }
}

/// Provider whose state creation always fails; exercises the
/// synchronous-start failure path.
pub(crate) struct FailingCodec;

impl CodecProvider for FailingCodec {
    fn new_encoder(&self, _format: &AudioFormat) -> Result<Box<dyn FrameEncoder>, CodecError> {
        Err(CodecError::EncoderInit("stub init failure".to_string()))
    }

    fn new_decoder(&self, _format: &AudioFormat) -> Result<Box<dyn FrameDecoder>, CodecError> {
        Err(CodecError::DecoderInit("stub init failure".to_string()))
    }
}

/// Passthrough codec whose encoder fails on one chosen frame (1-based),
/// for the skip-and-continue path.
pub(crate) struct FlakyCodec {
    pub fail_on_frame: usize,
}

impl CodecProvider for FlakyCodec {
    fn new_encoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameEncoder>, CodecError> {
        Ok(Box::new(FlakyEncoder {
            samples_per_frame: format.samples_per_frame(),
            fail_on_frame: self.fail_on_frame,
            frame_index: 0,
        }))
    }

    fn new_decoder(&self, format: &AudioFormat) -> Result<Box<dyn FrameDecoder>, CodecError> {
        StubCodec::default().new_decoder(format)
    }
}

struct FlakyEncoder {
    samples_per_frame: usize,
    fail_on_frame: usize,
    frame_index: usize,
}

impl FrameEncoder for FlakyEncoder {
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError> {
        self.frame_index += 1;
        if self.frame_index == self.fail_on_frame {
            return Err(CodecError::EncodingFailed("flaky frame".to_string()));
        }
        if pcm.len() != self.samples_per_frame {
            return Err(CodecError::InvalidFrameSize(pcm.len()));
        }
        Ok(encode_passthrough(pcm))
    }
}
