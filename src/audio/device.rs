//! Capture and render device abstractions
//!
//! Devices are opaque blocking read/write primitives supplied by the
//! platform. The pipelines only see these traits; the cpal-backed
//! production implementations live in `audio::capture` and
//! `audio::render`.

use cpal::traits::HostTrait;
use cpal::StreamConfig;

use crate::config::AudioFormat;
use crate::error::AudioError;

use super::capture::CpalCapture;
use super::render::CpalRender;

/// Blocking audio input
pub trait CaptureDevice: Send {
    /// Blocking read of one PCM frame. Returns the number of samples read;
    /// 0 means the device reached end of stream or failed permanently.
    /// Partial frames are never returned.
    fn read(&mut self, frame: &mut [i16]) -> Result<usize, AudioError>;
}

/// Blocking audio output
pub trait RenderDevice: Send {
    /// Blocking write of one PCM frame
    fn write(&mut self, frame: &[i16]) -> Result<(), AudioError>;

    /// Ask the device to drain its queue now rather than batching,
    /// favoring latency over throughput
    fn flush(&mut self) -> Result<(), AudioError>;

    /// Stop rendering and release the device
    fn stop(&mut self) -> Result<(), AudioError>;
}

/// Factory opening devices at a given format.
///
/// Shared read-only between the pipelines; each open hands exclusive
/// ownership of the device to the calling session.
pub trait AudioBackend: Send + Sync {
    fn open_capture(&self, format: &AudioFormat) -> Result<Box<dyn CaptureDevice>, AudioError>;

    fn open_render(&self, format: &AudioFormat) -> Result<Box<dyn RenderDevice>, AudioError>;
}

/// Production backend on the system's default cpal host
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn open_capture(&self, format: &AudioFormat) -> Result<Box<dyn CaptureDevice>, AudioError> {
        let device = default_input_device()?;
        let capture = CpalCapture::open(device, stream_config(format))?;
        Ok(Box::new(capture))
    }

    fn open_render(&self, format: &AudioFormat) -> Result<Box<dyn RenderDevice>, AudioError> {
        let device = default_output_device()?;
        let render = CpalRender::open(device, stream_config(format))?;
        Ok(Box::new(render))
    }
}

fn stream_config(format: &AudioFormat) -> StreamConfig {
    StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    }
}

/// Get the default input device
pub fn default_input_device() -> Result<cpal::Device, AudioError> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| AudioError::DeviceNotFound("No default input device".to_string()))
}

/// Get the default output device
pub fn default_output_device() -> Result<cpal::Device, AudioError> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceNotFound("No default output device".to_string()))
}
