//! Decoding side of the stream adapter pair

use std::io::Read;

use crate::config::{AudioFormat, PacketFraming};
use crate::constants::{LEGACY_CHUNK_DIVISOR, MAX_PACKET_SIZE};
use crate::error::{CodecError, DecodeError};

use super::FrameDecoder;

/// Reads compressed packets from a byte source and decodes them through
/// the codec boundary, one PCM frame per call.
///
/// With length-prefixed framing the packet boundary comes from the stream
/// itself. With legacy framing each read consumes a chunk sized as a fixed
/// fraction of the PCM buffer; that ratio is a heuristic tied to the
/// codec's typical compression ratio, not a guarantee.
pub struct DecodingSource<R: Read> {
    decoder: Option<Box<dyn FrameDecoder>>,
    source: Option<R>,
    samples_per_frame: usize,
    framing: PacketFraming,
    /// Packet buffer (reused to avoid allocations)
    packet_buffer: Vec<u8>,
    packets_read: u64,
}

impl<R: Read> DecodingSource<R> {
    pub fn new(
        source: R,
        decoder: Box<dyn FrameDecoder>,
        format: &AudioFormat,
        framing: PacketFraming,
    ) -> Self {
        let chunk_size = match framing {
            PacketFraming::LengthPrefixed => MAX_PACKET_SIZE,
            // One fifth of the PCM buffer, the write-time ratio
            PacketFraming::Legacy => format.frame_bytes() / LEGACY_CHUNK_DIVISOR,
        };

        Self {
            decoder: Some(decoder),
            source: Some(source),
            samples_per_frame: format.samples_per_frame(),
            framing,
            packet_buffer: vec![0u8; chunk_size],
            packets_read: 0,
        }
    }

    /// Read and decode one packet into `pcm_out`.
    ///
    /// Returns the number of source bytes consumed; 0 means end of input.
    /// The buffer length is validated before the codec boundary is touched.
    pub fn read(&mut self, pcm_out: &mut [i16]) -> Result<usize, DecodeError> {
        if self.decoder.is_none() || self.source.is_none() {
            return Err(DecodeError::ClosedStream);
        }
        if pcm_out.is_empty() || pcm_out.len() != self.samples_per_frame {
            return Err(CodecError::InvalidFrameSize(pcm_out.len()).into());
        }

        let consumed = match self.framing {
            PacketFraming::LengthPrefixed => self.read_prefixed(pcm_out)?,
            PacketFraming::Legacy => self.read_legacy(pcm_out)?,
        };

        if consumed > 0 {
            self.packets_read += 1;
        }
        Ok(consumed)
    }

    fn read_prefixed(&mut self, pcm_out: &mut [i16]) -> Result<usize, DecodeError> {
        let source = self.source.as_mut().ok_or(DecodeError::ClosedStream)?;

        let mut prefix = [0u8; 2];
        match read_full(source, &mut prefix)? {
            // End of input exactly at a packet boundary
            0 => return Ok(0),
            n if n < prefix.len() => {
                return Err(DecodeError::TruncatedPacket {
                    expected: prefix.len(),
                    got: n,
                })
            }
            _ => {}
        }

        let len = u16::from_le_bytes(prefix) as usize;
        if len > MAX_PACKET_SIZE {
            return Err(DecodeError::OversizedPacket(len));
        }

        self.packet_buffer.resize(len, 0);
        let got = read_full(source, &mut self.packet_buffer)?;
        if got < len {
            return Err(DecodeError::TruncatedPacket { expected: len, got });
        }

        let decoder = self.decoder.as_mut().ok_or(DecodeError::ClosedStream)?;
        decoder.decode(&self.packet_buffer, pcm_out)?;
        Ok(prefix.len() + len)
    }

    fn read_legacy(&mut self, pcm_out: &mut [i16]) -> Result<usize, DecodeError> {
        let source = self.source.as_mut().ok_or(DecodeError::ClosedStream)?;

        let n = source.read(&mut self.packet_buffer)?;
        if n == 0 {
            return Ok(0);
        }

        let decoder = self.decoder.as_mut().ok_or(DecodeError::ClosedStream)?;
        decoder.decode(&self.packet_buffer[..n], pcm_out)?;
        Ok(n)
    }

    /// Packets decoded so far
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Release the codec state and close the underlying source.
    ///
    /// Must be called at most once; a second call is a contract violation
    /// and panics.
    pub fn close(&mut self) -> Result<(), DecodeError> {
        let source = self.source.take().expect("DecodingSource closed twice");
        drop(self.decoder.take());
        drop(source);
        Ok(())
    }
}

/// Read until `buf` is full or the source is exhausted, returning the
/// number of bytes read. Unlike `read_exact`, end-of-input is reported as
/// a short count rather than an error.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
