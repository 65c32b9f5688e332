//! Encoding side of the stream adapter pair

use std::io::Write;

use bytes::Bytes;

use crate::config::{AudioFormat, PacketFraming};
use crate::error::{CodecError, EncodeError};

use super::FrameEncoder;

/// Writes PCM frames through the codec boundary into a byte sink.
///
/// Exactly one compressed packet is appended to the sink per successful
/// `write` call. The codec state is released when the sink is closed, or
/// on drop if the session unwinds through an error path.
pub struct EncodingSink<W: Write> {
    encoder: Option<Box<dyn FrameEncoder>>,
    sink: Option<W>,
    samples_per_frame: usize,
    framing: PacketFraming,
    packets_written: u64,
}

impl<W: Write> EncodingSink<W> {
    pub fn new(
        sink: W,
        encoder: Box<dyn FrameEncoder>,
        format: &AudioFormat,
        framing: PacketFraming,
    ) -> Self {
        Self {
            encoder: Some(encoder),
            sink: Some(sink),
            samples_per_frame: format.samples_per_frame(),
            framing,
            packets_written: 0,
        }
    }

    /// Encode one PCM frame and append the resulting packet to the sink.
    ///
    /// On a codec failure the frame is dropped, not retried; the caller
    /// decides whether the session continues with the next frame. The frame
    /// length is validated before the codec boundary is touched.
    pub fn write(&mut self, frame: &[i16]) -> Result<(), EncodeError> {
        let encoder = self.encoder.as_mut().ok_or(EncodeError::ClosedStream)?;
        if frame.is_empty() || frame.len() != self.samples_per_frame {
            return Err(CodecError::InvalidFrameSize(frame.len()).into());
        }

        let packet = encoder.encode(frame)?;
        self.write_packet(&packet)?;
        self.packets_written += 1;
        Ok(())
    }

    fn write_packet(&mut self, packet: &Bytes) -> Result<(), EncodeError> {
        let sink = self.sink.as_mut().ok_or(EncodeError::ClosedStream)?;
        if let PacketFraming::LengthPrefixed = self.framing {
            // Packet sizes are bounded by MAX_PACKET_SIZE, well within u16
            let len = packet.len() as u16;
            sink.write_all(&len.to_le_bytes())?;
        }
        sink.write_all(packet)?;
        Ok(())
    }

    /// Packets appended so far
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /// Reference to the underlying sink, if not yet closed
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Release the codec state and flush and close the underlying sink.
    ///
    /// Must be called at most once; a second call is a contract violation
    /// and panics.
    pub fn close(&mut self) -> Result<(), EncodeError> {
        let mut sink = self.sink.take().expect("EncodingSink closed twice");
        // Codec state goes first; the sink flush can fail independently
        drop(self.encoder.take());
        sink.flush()?;
        Ok(())
    }
}
