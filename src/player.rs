//! Playback pipeline: file → decode → render
//!
//! Symmetric to the recording pipeline: a dedicated worker thread drives
//! the read → decode → render loop until stopped, end-of-file, or a
//! decode failure. Each frame is flushed to the device immediately,
//! favoring latency over throughput.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::audio::device::{AudioBackend, RenderDevice};
use crate::codec::{CodecProvider, DecodingSource};
use crate::config::{AudioFormat, PacketFraming};
use crate::error::{AudioError, DecodeError, Error};
use crate::session::{PlayerState, StateCell, StopFlag};

/// State shared between the controlling thread and the worker
struct PlayerShared {
    state: StateCell<PlayerState>,
    stop: StopFlag,
}

/// Playback session driver.
///
/// State machine: `Idle → Playing → Stopped`, re-enterable: a new session
/// can be started from `Idle` or `Stopped` with a possibly different file.
pub struct Player {
    backend: Arc<dyn AudioBackend>,
    codec: Arc<dyn CodecProvider>,
    format: AudioFormat,
    framing: PacketFraming,
    shared: Arc<PlayerShared>,
    worker: Option<JoinHandle<()>>,
    error_rx: Option<Receiver<Error>>,
}

impl Player {
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
            shared: Arc::new(PlayerShared {
                state: StateCell::new(PlayerState::Idle),
                stop: StopFlag::new(),
            }),
            worker: None,
            error_rx: None,
        }
    }

    pub fn status(&self) -> PlayerState {
        self.shared.state.get()
    }

    /// Start playing the recording at `path`.
    ///
    /// A missing file is rejected synchronously with `NotReady`: no worker
    /// thread is spawned and the render device is not touched. Starting
    /// while already `Playing` is a no-op.
    pub fn start(&mut self, path: &Path) -> Result<(), Error> {
        if self.status().is_playing() {
            return Ok(());
        }
        self.join();

        if !path.is_file() {
            return Err(Error::NotReady(format!(
                "no recording at {}",
                path.display()
            )));
        }

        let file = File::open(path)?;
        let decoder = self.codec.new_decoder(&self.format)?;
        let source = DecodingSource::new(BufReader::new(file), decoder, &self.format, self.framing);
        let device = self.backend.open_render(&self.format)?;

        let (error_tx, error_rx) = bounded::<Error>(16);
        self.error_rx = Some(error_rx);
        self.shared.stop.reset();
        self.shared.state.set(PlayerState::Playing);

        let shared = self.shared.clone();
        let samples_per_frame = self.format.samples_per_frame();

        tracing::info!(path = %path.display(), "Playback started");

        let spawned = thread::Builder::new()
            .name("player".to_string())
            .spawn(move || run_render_loop(device, source, shared, samples_per_frame, error_tx));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.state.set(PlayerState::Idle);
                Err(AudioError::StreamError(e.to_string()).into())
            }
        }
    }

    /// Request the worker to stop after its current frame.
    ///
    /// Non-blocking and idempotent; stopping an idle player is a no-op.
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

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

fn run_render_loop<R: Read>(
    mut device: Box<dyn RenderDevice>,
    mut source: DecodingSource<R>,
    shared: Arc<PlayerShared>,
    samples_per_frame: usize,
    error_tx: Sender<Error>,
) {
    let mut frame = vec![0i16; samples_per_frame];

    loop {
        if shared.stop.is_requested() {
            break;
        }

        match source.read(&mut frame) {
            Ok(0) => {
                tracing::debug!("End of recording reached");
                break;
            }
            Ok(_consumed) => {
                if let Err(e) = device.write(&frame) {
                    tracing::error!("Render device failed: {}", e);
                    let _ = error_tx.try_send(e.into());
                    break;
                }
                if let Err(e) = device.flush() {
                    tracing::error!("Render device flush failed: {}", e);
                    let _ = error_tx.try_send(e.into());
                    break;
                }
            }
            Err(DecodeError::Codec(e)) => {
                // The packet boundary can no longer be trusted after a
                // failed decode, so the session ends here
                tracing::warn!("Stopping playback after decode failure: {}", e);
                break;
            }
            Err(e) => {
                tracing::error!("Playback aborted: {}", e);
                let _ = error_tx.try_send(e.into());
                break;
            }
        }
    }

    if let Err(e) = device.stop() {
        tracing::warn!("Failed to stop render device: {}", e);
    }
    if let Err(e) = source.close() {
        tracing::warn!("Failed to close decoding source: {}", e);
    }

    // Terminal state is reached even when the loop exits via error
    shared.state.set(PlayerState::Stopped);
    tracing::info!(packets = source.packets_read(), "Playback stopped");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write as _;
    use std::path::PathBuf;

    use super::*;
    use crate::audio::stub::StubBackend;
    use crate::codec::stub::StubCodec;
    use crate::codec::EncodingSink;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ptt_player_test_{}_{}", std::process::id(), name))
    }

    fn test_frames(count: usize) -> Vec<Vec<i16>> {
        (0..count)
            .map(|i| vec![i as i16 + 1; AudioFormat::voice().samples_per_frame()])
            .collect()
    }

    fn write_recording(path: &Path, frames: &[Vec<i16>]) {
        let format = AudioFormat::voice();
        let codec = StubCodec::default();
        let mut sink = EncodingSink::new(
            std::io::BufWriter::new(File::create(path).unwrap()),
            codec.new_encoder(&format).unwrap(),
            &format,
            PacketFraming::LengthPrefixed,
        );
        for frame in frames {
            sink.write(frame).unwrap();
        }
        sink.close().unwrap();
    }

    fn stub_player(backend: Arc<StubBackend>) -> Player {
        Player::new(
            backend,
            Arc::new(StubCodec::default()),
            AudioFormat::voice(),
            PacketFraming::LengthPrefixed,
        )
    }

    #[test]
    fn test_missing_file_is_not_ready_and_touches_nothing() {
        let backend = Arc::new(StubBackend::default());
        let mut player = stub_player(backend.clone());

        let result = player.start(&temp_path("does_not_exist"));
        assert!(matches!(result, Err(Error::NotReady(_))));
        assert_eq!(player.status(), PlayerState::Idle);
        assert!(player.worker.is_none());
        assert_eq!(backend.render_opens(), 0);
    }

    #[test]
    fn test_plays_recording_to_render_device() {
        let path = temp_path("five_packets");
        let frames = test_frames(5);
        write_recording(&path, &frames);

        let backend = Arc::new(StubBackend::default());
        let mut player = stub_player(backend.clone());

        player.start(&path).unwrap();
        player.join();

        assert_eq!(player.status(), PlayerState::Stopped);
        assert!(player.check_error().is_none());

        let log = backend.render_log();
        assert_eq!(log.frames(), frames);
        // One latency-favoring flush per rendered frame
        assert_eq!(log.flushes(), 5);
        assert!(log.is_stopped());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stop_on_idle_player_is_a_noop() {
        let backend = Arc::new(StubBackend::default());
        let player = stub_player(backend);

        player.stop();
        player.stop();
        assert_eq!(player.status(), PlayerState::Idle);
    }

    #[test]
    fn test_corrupt_stream_still_reaches_stopped() {
        let path = temp_path("corrupt");
        let mut file = File::create(&path).unwrap();
        // Length prefix promising far more than the payload bound
        file.write_all(&u16::MAX.to_le_bytes()).unwrap();
        drop(file);

        let backend = Arc::new(StubBackend::default());
        let mut player = stub_player(backend.clone());

        player.start(&path).unwrap();
        player.join();

        assert_eq!(player.status(), PlayerState::Stopped);
        assert!(matches!(player.check_error(), Some(Error::Decode(_))));
        assert!(backend.render_log().frames().is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_player_is_reenterable_with_a_different_file() {
        let first = temp_path("reenter_first");
        let second = temp_path("reenter_second");
        write_recording(&first, &test_frames(2));
        write_recording(&second, &test_frames(3));

        let backend = Arc::new(StubBackend::default());
        let mut player = stub_player(backend.clone());

        player.start(&first).unwrap();
        player.join();
        assert_eq!(player.status(), PlayerState::Stopped);

        player.start(&second).unwrap();
        player.join();
        assert_eq!(player.status(), PlayerState::Stopped);
        assert_eq!(backend.render_log().frames().len(), 2 + 3);

        let _ = fs::remove_file(&first);
        let _ = fs::remove_file(&second);
    }
}
