//! cpal-backed blocking capture device
//!
//! The cpal stream is not `Send`, so a dedicated thread owns it for the
//! device's lifetime and feeds the sample ring from the input callback;
//! the pipeline's worker assembles exact codec frames through `read`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::bounded;

use crate::audio::buffer::{shared_ring, SharedSampleRing};
use crate::audio::device::CaptureDevice;
use crate::constants::{DEVICE_POLL, RING_CAPACITY_SAMPLES};
use crate::error::AudioError;

/// Microphone capture bridged to a blocking frame read
pub struct CpalCapture {
    ring: SharedSampleRing,
    running: Arc<AtomicBool>,
    stream_thread: Option<JoinHandle<()>>,
}

impl CpalCapture {
    /// Open the device and start the input stream. Fails synchronously if
    /// the stream cannot be built or started.
    pub(super) fn open(device: cpal::Device, config: StreamConfig) -> Result<Self, AudioError> {
        let ring = shared_ring(RING_CAPACITY_SAMPLES);
        let running = Arc::new(AtomicBool::new(true));

        let (setup_tx, setup_rx) = bounded::<Result<(), AudioError>>(1);
        let thread_ring = ring.clone();
        let thread_running = running.clone();

        let handle = thread::Builder::new()
            .name("cpal-capture".to_string())
            .spawn(move || {
                let data_ring = thread_ring.clone();
                let error_ring = thread_ring.clone();

                let stream = device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let accepted = data_ring.push_slice(data);
                        if accepted < data.len() {
                            data_ring.record_overflow(data.len() - accepted);
                        }
                    },
                    move |err| {
                        tracing::error!("Capture stream failed: {}", err);
                        error_ring.close();
                    },
                    None,
                );

                let stream = match stream {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = setup_tx.send(Err(AudioError::StreamError(e.to_string())));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = setup_tx.send(Err(AudioError::StreamError(e.to_string())));
                    return;
                }
                let _ = setup_tx.send(Ok(()));

                // Keep the thread alive while the device is open
                while thread_running.load(Ordering::SeqCst) {
                    thread::sleep(DEVICE_POLL * 10);
                }

                // Stream is dropped here, stopping capture
                thread_ring.close();
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        match setup_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                ring,
                running,
                stream_thread: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::StreamError(
                    "capture thread exited during setup".to_string(),
                ))
            }
        }
    }

    /// Samples the input callback had to drop
    pub fn overflow_count(&self) -> usize {
        self.ring.overflow_count()
    }
}

impl CaptureDevice for CpalCapture {
    fn read(&mut self, frame: &mut [i16]) -> Result<usize, AudioError> {
        let mut filled = 0;
        loop {
            filled += self.ring.pop_slice(&mut frame[filled..]);
            if filled == frame.len() {
                return Ok(filled);
            }
            if self.ring.is_closed() && self.ring.is_empty() {
                // Stream is gone; a partial frame is dropped rather than
                // handed to the codec
                return Ok(0);
            }
            thread::sleep(DEVICE_POLL);
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}
