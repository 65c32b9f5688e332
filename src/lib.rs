//! # Push-to-Talk Voice Recorder
//!
//! Opus-compressed voice capture to file, and file playback, as two
//! symmetric streaming pipelines.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       RECORDING SESSION                       │
//! │  ┌────────────┐    ┌──────────────┐    ┌──────────────────┐  │
//! │  │ Microphone │───▶│ EncodingSink │───▶│ recording.opus   │  │
//! │  │ (capture)  │    │ PCM ─▶ packet│    │ (packet stream)  │  │
//! │  └────────────┘    └──────────────┘    └──────────────────┘  │
//! │        blocking read → encode → write, one frame at a time    │
//! │        on the "recorder" worker thread                        │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼  Finished
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       PLAYBACK SESSION                        │
//! │  ┌──────────────────┐    ┌────────────────┐    ┌──────────┐  │
//! │  │ recording.opus   │───▶│ DecodingSource │───▶│ Speaker  │  │
//! │  │ (packet stream)  │    │ packet ─▶ PCM  │    │ (render) │  │
//! │  └──────────────────┘    └────────────────┘    └──────────┘  │
//! │        read → decode → render → flush, one frame at a time    │
//! │        on the "player" worker thread                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`controller::SessionController`] arbitrates the two pipelines so
//! at most one holds the physical audio device. Stop is cooperative: a
//! flag checked once per loop iteration, never interrupting an in-flight
//! blocking device call.

pub mod audio;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod player;
pub mod recorder;
pub mod session;

pub use config::{AudioFormat, Config, PacketFraming};
pub use controller::SessionController;
pub use error::{Error, Result};
pub use player::Player;
pub use recorder::Recorder;
pub use session::{PlayerState, RecorderState};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// Default sample rate for voice capture
    pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

    /// Default channel count (mono voice)
    pub const DEFAULT_CHANNELS: u16 = 1;

    /// Default samples per codec frame (2.5ms at 8kHz)
    pub const DEFAULT_FRAME_SIZE: usize = 20;

    /// Upper bound for a single compressed packet
    pub const MAX_PACKET_SIZE: usize = 4000;

    /// Encoded chunk size as a fraction of the PCM buffer size in
    /// legacy recordings
    pub const LEGACY_CHUNK_DIVISOR: usize = 5;

    /// Sample ring capacity between device callbacks and pipeline threads
    pub const RING_CAPACITY_SAMPLES: usize = 16_384;

    /// Poll interval while a device-side sample ring is empty or full
    pub const DEVICE_POLL: Duration = Duration::from_millis(1);
}
