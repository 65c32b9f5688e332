//! Session state machines shared by the two pipelines
//!
//! A session runs from `start()` to its terminal state. The only state
//! shared across threads is the status value and the stop request, both
//! held in atomics so the controlling thread always observes the worker's
//! latest write.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Lifecycle of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Finished,
}

impl RecorderState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Lifecycle of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Stopped,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// States that can be stored in a [`StateCell`]
pub(crate) trait SessionState: Copy {
    fn to_bits(self) -> u8;
    fn from_bits(bits: u8) -> Self;
}

impl SessionState for RecorderState {
    fn to_bits(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Recording => 1,
            Self::Finished => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Recording,
            2 => Self::Finished,
            _ => Self::Idle,
        }
    }
}

impl SessionState for PlayerState {
    fn to_bits(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Playing => 1,
            Self::Stopped => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Playing,
            2 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

/// Cross-thread cell holding a session state
pub(crate) struct StateCell<S> {
    bits: AtomicU8,
    _state: PhantomData<S>,
}

impl<S: SessionState> StateCell<S> {
    pub fn new(initial: S) -> Self {
        Self {
            bits: AtomicU8::new(initial.to_bits()),
            _state: PhantomData,
        }
    }

    pub fn set(&self, state: S) {
        self.bits.store(state.to_bits(), Ordering::SeqCst);
    }

    pub fn get(&self) -> S {
        S::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Cooperative stop signal, checked once per pipeline loop iteration.
///
/// Worst-case stop latency is one frame's capture/decode/render time; an
/// in-flight blocking device call is not interrupted.
pub(crate) struct StopFlag {
    requested: AtomicBool,
}

impl StopFlag {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}
