//! cpal-backed blocking render device
//!
//! Mirror of the capture side: a dedicated thread owns the output stream,
//! the output callback drains the sample ring, and the pipeline's worker
//! pushes frames through the blocking `write`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::bounded;

use crate::audio::buffer::{shared_ring, SharedSampleRing};
use crate::audio::device::RenderDevice;
use crate::constants::{DEVICE_POLL, RING_CAPACITY_SAMPLES};
use crate::error::AudioError;

/// Speaker output bridged to a blocking frame write
pub struct CpalRender {
    ring: SharedSampleRing,
    running: Arc<AtomicBool>,
    stream_thread: Option<JoinHandle<()>>,
}

impl CpalRender {
    /// Open the device and start the output stream. Fails synchronously if
    /// the stream cannot be built or started.
    pub(super) fn open(device: cpal::Device, config: StreamConfig) -> Result<Self, AudioError> {
        let ring = shared_ring(RING_CAPACITY_SAMPLES);
        let running = Arc::new(AtomicBool::new(true));

        let (setup_tx, setup_rx) = bounded::<Result<(), AudioError>>(1);
        let thread_ring = ring.clone();
        let thread_running = running.clone();

        let handle = thread::Builder::new()
            .name("cpal-render".to_string())
            .spawn(move || {
                let data_ring = thread_ring.clone();
                let error_ring = thread_ring.clone();

                let stream = device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        let filled = data_ring.pop_slice(data);
                        if filled < data.len() {
                            data_ring.record_underrun();
                            for sample in &mut data[filled..] {
                                *sample = 0;
                            }
                        }
                    },
                    move |err| {
                        tracing::error!("Render stream failed: {}", err);
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

                while thread_running.load(Ordering::SeqCst) {
                    thread::sleep(DEVICE_POLL * 10);
                }

                // Stream is dropped here, stopping playback
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
                    "render thread exited during setup".to_string(),
                ))
            }
        }
    }

    fn shut_down(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

impl RenderDevice for CpalRender {
    fn write(&mut self, frame: &[i16]) -> Result<(), AudioError> {
        if self.stream_thread.is_none() || self.ring.is_closed() {
            return Err(AudioError::DeviceClosed);
        }

        let mut offset = 0;
        while offset < frame.len() {
            if self.ring.is_closed() {
                return Err(AudioError::DeviceClosed);
            }
            offset += self.ring.push_slice(&frame[offset..]);
            if offset < frame.len() {
                thread::sleep(DEVICE_POLL);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), AudioError> {
        // Wait for the output callback to drain what has been queued
        while !self.ring.is_empty() && !self.ring.is_closed() {
            thread::sleep(DEVICE_POLL);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.shut_down();
        Ok(())
    }
}

impl Drop for CpalRender {
    fn drop(&mut self) {
        self.shut_down();
    }
}
