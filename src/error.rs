//! Error types for the recorder and playback pipelines

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Playback was requested before a finished recording exists.
    /// Rejected synchronously; no worker thread is spawned.
    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio device errors. Fatal to the current session: the pipeline loop
/// terminates and the session still reaches its terminal state.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open stream: {0}")]
    StreamError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Device closed")]
    DeviceClosed,

    #[error("cpal error: {0}")]
    CpalError(String),
}

/// Codec errors. A single failed frame is non-fatal on the encode path:
/// the frame is dropped and the session continues.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Decoder initialization failed: {0}")]
    DecoderInit(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Invalid frame size: {0}")]
    InvalidFrameSize(usize),
}

/// Errors returned by the encoding side of the stream adapters
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("Sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation on a closed stream")]
    ClosedStream,
}

/// Errors returned by the decoding side of the stream adapters
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("Source IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation on a closed stream")]
    ClosedStream,

    #[error("Truncated packet: expected {expected} bytes, got {got}")]
    TruncatedPacket { expected: usize, got: usize },

    #[error("Packet length {0} exceeds the codec payload bound")]
    OversizedPacket(usize),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
