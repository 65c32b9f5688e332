//! Scripted audio devices for pipeline tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::AudioFormat;
use crate::error::AudioError;

use super::device::{AudioBackend, CaptureDevice, RenderDevice};

/// Capture device that plays a fixed script: the queued frames in order,
/// then end-of-stream. An optional per-read delay models a device whose
/// blocking read takes real time.
pub(crate) struct ScriptedCapture {
    frames: VecDeque<Vec<i16>>,
    read_delay: Option<Duration>,
}

impl ScriptedCapture {
    pub fn new(frames: Vec<Vec<i16>>) -> Self {
        Self {
            frames: frames.into(),
            read_delay: None,
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }
}

impl CaptureDevice for ScriptedCapture {
    fn read(&mut self, frame: &mut [i16]) -> Result<usize, AudioError> {
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        match self.frames.pop_front() {
            Some(scripted) => {
                frame.copy_from_slice(&scripted);
                Ok(frame.len())
            }
            None => Ok(0),
        }
    }
}

/// What a [`LoggingRender`] observed, shared with the test
#[derive(Default)]
pub(crate) struct RenderLog {
    frames: Mutex<Vec<Vec<i16>>>,
    flushes: AtomicUsize,
    stopped: AtomicBool,
}

impl RenderLog {
    pub fn frames(&self) -> Vec<Vec<i16>> {
        self.frames.lock().clone()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Render device that records every frame, flush and stop
pub(crate) struct LoggingRender {
    log: Arc<RenderLog>,
}

impl RenderDevice for LoggingRender {
    fn write(&mut self, frame: &[i16]) -> Result<(), AudioError> {
        self.log.frames.lock().push(frame.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), AudioError> {
        self.log.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.log.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Backend handing out one scripted capture and logging render devices
#[derive(Default)]
pub(crate) struct StubBackend {
    capture: Mutex<Option<ScriptedCapture>>,
    render_log: Arc<RenderLog>,
    capture_opens: AtomicUsize,
    render_opens: AtomicUsize,
}

impl StubBackend {
    pub fn with_capture(capture: ScriptedCapture) -> Self {
        Self {
            capture: Mutex::new(Some(capture)),
            ..Self::default()
        }
    }

    /// Arm the next capture session's script
    pub fn set_capture(&self, capture: ScriptedCapture) {
        *self.capture.lock() = Some(capture);
    }

    pub fn render_log(&self) -> Arc<RenderLog> {
        self.render_log.clone()
    }

    pub fn capture_opens(&self) -> usize {
        self.capture_opens.load(Ordering::SeqCst)
    }

    pub fn render_opens(&self) -> usize {
        self.render_opens.load(Ordering::SeqCst)
    }
}

impl AudioBackend for StubBackend {
    fn open_capture(&self, _format: &AudioFormat) -> Result<Box<dyn CaptureDevice>, AudioError> {
        self.capture_opens.fetch_add(1, Ordering::SeqCst);
        self.capture
            .lock()
            .take()
            .map(|capture| Box::new(capture) as Box<dyn CaptureDevice>)
            .ok_or_else(|| AudioError::DeviceNotFound("no scripted capture armed".to_string()))
    }

    fn open_render(&self, _format: &AudioFormat) -> Result<Box<dyn RenderDevice>, AudioError> {
        self.render_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(LoggingRender {
            log: self.render_log.clone(),
        }))
    }
}

/// Backend with no devices at all
pub(crate) struct FailingBackend;

impl AudioBackend for FailingBackend {
    fn open_capture(&self, _format: &AudioFormat) -> Result<Box<dyn CaptureDevice>, AudioError> {
        Err(AudioError::DeviceNotFound("stub: no capture device".to_string()))
    }

    fn open_render(&self, _format: &AudioFormat) -> Result<Box<dyn RenderDevice>, AudioError> {
        Err(AudioError::DeviceNotFound("stub: no render device".to_string()))
    }
}
