//! Recording pipeline: capture → encode → file
//!
//! The capture loop runs on a dedicated worker thread so the controlling
//! thread never blocks on device or file IO. Stop is cooperative: a flag
//! observed at the top of each loop iteration, so worst-case stop latency
//! is one frame's capture time.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::audio::device::{AudioBackend, CaptureDevice};
use crate::codec::{CodecProvider, EncodingSink};
use crate::config::{AudioFormat, PacketFraming};
use crate::error::{AudioError, EncodeError, Error};
use crate::session::{RecorderState, StateCell, StopFlag};

/// State shared between the controlling thread and the worker
struct RecorderShared {
    state: StateCell<RecorderState>,
    stop: StopFlag,
    output: Mutex<Option<PathBuf>>,
}

/// Push-to-talk recording session driver.
///
/// State machine: `Idle → Recording → Finished`. `start` performs all
/// device, file and codec setup synchronously so failures surface to the
/// caller, then hands the session to the worker. A session owns its codec
/// state and file handle exclusively until the worker releases them
/// together on the way to `Finished`.
pub struct Recorder {
    backend: Arc<dyn AudioBackend>,
    codec: Arc<dyn CodecProvider>,
    format: AudioFormat,
    framing: PacketFraming,
    shared: Arc<RecorderShared>,
    worker: Option<JoinHandle<()>>,
    error_rx: Option<Receiver<Error>>,
}

impl Recorder {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        codec: Arc<dyn CodecProvider>,
        format: AudioFormat,
        framing: PacketFraming,
    ) -> Self {
        Self {
            backend,
            codec,
            format,
            framing,
            shared: Arc::new(RecorderShared {
                state: StateCell::new(RecorderState::Idle),
                stop: StopFlag::new(),
                output: Mutex::new(None),
            }),
            worker: None,
            error_rx: None,
        }
    }

    pub fn status(&self) -> RecorderState {
        self.shared.state.get()
    }

    /// Path of the completed recording, available once `Finished`
    pub fn output_file(&self) -> Option<PathBuf> {
        if self.status().is_finished() {
            self.shared.output.lock().clone()
        } else {
            None
        }
    }

    /// Start recording to `path`.
    ///
    /// Creates the destination folder if absent and truncates a
    /// pre-existing file at the path. Returns once the capture device,
    /// file and codec are set up; the capture loop then proceeds
    /// asynchronously. Starting while already `Recording` is a no-op.
    pub fn start(&mut self, path: &Path) -> Result<(), Error> {
        if self.status().is_recording() {
            return Ok(());
        }
        self.join();

        let device = self.backend.open_capture(&self.format)?;
        let file = create_output_file(path)?;
        let encoder = self.codec.new_encoder(&self.format)?;
        let sink = EncodingSink::new(BufWriter::new(file), encoder, &self.format, self.framing);

        let (error_tx, error_rx) = bounded::<Error>(16);
        self.error_rx = Some(error_rx);
        self.shared.stop.reset();
        *self.shared.output.lock() = Some(path.to_path_buf());
        self.shared.state.set(RecorderState::Recording);

        let shared = self.shared.clone();
        let samples_per_frame = self.format.samples_per_frame();

        tracing::info!(path = %path.display(), "Recording started");

        let spawned = thread::Builder::new()
            .name("recorder".to_string())
            .spawn(move || run_capture_loop(device, sink, shared, samples_per_frame, error_tx));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.state.set(RecorderState::Idle);
                Err(AudioError::StreamError(e.to_string()).into())
            }
        }
    }

    /// Request the worker to stop after its current frame.
    ///
    /// Non-blocking and idempotent; stopping an idle recorder is a no-op.
    pub fn stop(&self) {
        self.shared.stop.request();
    }

    /// Wait for the current session's worker thread to finish
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    /// Drain one error reported by the worker, if any
    pub fn check_error(&self) -> Option<Error> {
        self.error_rx.as_ref().and_then(|rx| rx.try_recv().ok())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

/// Create the output file, its folder if absent, and truncate any
/// pre-existing recording at the same path
fn create_output_file(path: &Path) -> Result<File, Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn run_capture_loop<W: Write>(
    mut device: Box<dyn CaptureDevice>,
    mut sink: EncodingSink<W>,
    shared: Arc<RecorderShared>,
    samples_per_frame: usize,
    error_tx: Sender<Error>,
) {
    let mut frame = vec![0i16; samples_per_frame];

    loop {
        if shared.stop.is_requested() {
            break;
        }

        match device.read(&mut frame) {
            Ok(0) => {
                tracing::debug!("Capture device reached end of stream");
                break;
            }
            Ok(n) if n == frame.len() => match sink.write(&frame) {
                Ok(()) => {}
                Err(EncodeError::Codec(e)) => {
                    // A single corrupt frame must not abort the session
                    tracing::warn!("Dropping frame after codec failure: {}", e);
                }
                Err(e) => {
                    tracing::error!("Recording aborted: {}", e);
                    let _ = error_tx.try_send(e.into());
                    break;
                }
            },
            Ok(n) => {
                tracing::error!("Short read from capture device: {} samples", n);
                let _ = error_tx.try_send(AudioError::DeviceClosed.into());
                break;
            }
            Err(e) => {
                tracing::error!("Capture device failed: {}", e);
                let _ = error_tx.try_send(e.into());
                break;
            }
        }
    }

    if let Err(e) = sink.close() {
        tracing::error!("Failed to close encoding sink: {}", e);
        let _ = error_tx.try_send(e.into());
    }

    // Terminal state is reached even when the loop exits via error, so
    // the caller is never left observing a hung session
    shared.state.set(RecorderState::Finished);
    tracing::info!(packets = sink.packets_written(), "Recording finished");
}
