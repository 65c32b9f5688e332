//! Session arbitration between the recording and playback pipelines
//!
//! Both pipelines may contend for the single physical audio device, so at
//! most one of {recording, playing} is active at a time. That rule lives
//! here, not in the pipelines: starting either side stops and joins the
//! other first. The join is bounded by one frame's device time (the
//! cooperative stop granularity).

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::device::{AudioBackend, CpalBackend};
use crate::codec::{CodecProvider, OpusCodec};
use crate::config::Config;
use crate::error::Error;
use crate::player::Player;
use crate::recorder::Recorder;
use crate::session::{PlayerState, RecorderState};

/// Owns both pipelines and the single-active-session invariant
pub struct SessionController {
    recorder: Recorder,
    player: Player,
    output_path: PathBuf,
}

impl SessionController {
    /// Production wiring: system audio devices and the Opus codec
    pub fn new(config: &Config) -> Self {
        Self::with_parts(Arc::new(CpalBackend), Arc::new(OpusCodec), config)
    }

    /// Custom wiring, used by tests and embedders
    pub fn with_parts(
        backend: Arc<dyn AudioBackend>,
        codec: Arc<dyn CodecProvider>,
        config: &Config,
    ) -> Self {
        Self {
            recorder: Recorder::new(
                backend.clone(),
                codec.clone(),
                config.format,
                config.framing,
            ),
            player: Player::new(backend, codec, config.format, config.framing),
            output_path: config.output_path(),
        }
    }

    /// Start recording, stopping playback first if it is active
    pub fn start_recording(&mut self) -> Result<(), Error> {
        if self.player.status().is_playing() {
            tracing::debug!("Stopping playback before recording");
            self.player.stop();
            self.player.join();
        }
        self.recorder.start(&self.output_path)
    }

    /// Request the active recording to stop. Non-blocking; the recorder
    /// reaches `Finished` within one frame's capture time.
    pub fn stop_recording(&self) {
        self.recorder.stop();
    }

    /// Play back the finished recording.
    ///
    /// An active recording is stopped and joined first. Returns `NotReady`
    /// if no finished recording exists; the player is not touched in that
    /// case.
    pub fn start_playback(&mut self) -> Result<(), Error> {
        if self.recorder.status().is_recording() {
            tracing::debug!("Stopping recording before playback");
            self.recorder.stop();
            self.recorder.join();
        }
        if !self.recorder.status().is_finished() {
            return Err(Error::NotReady("no finished recording".to_string()));
        }
        let file = self
            .recorder
            .output_file()
            .ok_or_else(|| Error::NotReady("recording has no output file".to_string()))?;

        self.player.start(&file)
    }

    /// Request the active playback to stop. Non-blocking.
    pub fn stop_playback(&self) {
        self.player.stop();
    }

    pub fn recording_status(&self) -> RecorderState {
        self.recorder.status()
    }

    pub fn playback_status(&self) -> PlayerState {
        self.player.status()
    }

    /// Path of the completed recording, once one exists
    pub fn output_file(&self) -> Option<PathBuf> {
        self.recorder.output_file()
    }

    /// Wait for both pipelines to reach their terminal states
    pub fn join(&mut self) {
        self.recorder.join();
        self.player.join();
    }
}
