//! Audio format and application configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHANNELS, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE};
use crate::error::Error;

/// Immutable audio format shared by the capture, codec and render stages.
///
/// `frame_size * channels * 2` bytes is the unit of transfer between every
/// adjacent pipeline stage; stages never partially consume a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sampling rate in Hz
    pub sample_rate: u32,

    /// Number of channels in the signal (1 = mono)
    pub channels: u16,

    /// Samples per channel in one codec frame. Must be one of the codec's
    /// legal frame sizes for the sampling rate; at 48kHz the permitted
    /// values are 120, 240, 480, 960, 1920 and 2880. Caller contract, not
    /// re-validated here.
    pub frame_size: usize,
}

impl AudioFormat {
    /// Voice default: 8kHz mono with 2.5ms frames
    pub fn voice() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }

    /// Frame size in samples for a duration in milliseconds
    pub fn frame_size_from_ms(sample_rate: u32, ms: f32) -> usize {
        (sample_rate as f32 * ms / 1000.0) as usize
    }

    /// Total samples per frame across all channels
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * self.channels as usize
    }

    /// Size in bytes of one interleaved PCM16 frame
    pub fn frame_bytes(&self) -> usize {
        self.samples_per_frame() * std::mem::size_of::<i16>()
    }

    /// Frame duration in milliseconds
    pub fn frame_duration_ms(&self) -> f32 {
        self.frame_size as f32 * 1000.0 / self.sample_rate as f32
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::voice()
    }
}

/// On-disk layout of the compressed packet stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketFraming {
    /// Each packet is preceded by its length as a little-endian u16.
    /// The decoder never guesses packet boundaries.
    LengthPrefixed,

    /// Bare packet concatenation. The decoder reads a fixed fraction of
    /// the PCM buffer size per packet and relies on the encoder's actual
    /// compression ratio matching that fraction; an under-read can
    /// desynchronize packet boundaries. Kept for files written by older
    /// recorders.
    Legacy,
}

impl Default for PacketFraming {
    fn default() -> Self {
        Self::LengthPrefixed
    }
}

/// Application configuration, loadable from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub format: AudioFormat,

    pub framing: PacketFraming,

    /// Directory recordings are written to
    pub storage_dir: PathBuf,

    /// File name of the active recording
    pub file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let storage_dir = directories::ProjectDirs::from("", "", "ptt-recorder")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            format: AudioFormat::voice(),
            framing: PacketFraming::default(),
            storage_dir,
            file_name: "recording.opus".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Full path of the recording file
    pub fn output_path(&self) -> PathBuf {
        self.storage_dir.join(&self.file_name)
    }
}
