//! Recorder state and resume attempt value objects

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::activity::CallActivity;

/// The controller's belief about the host recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingIntent {
    Recording,
    Paused,
    Stopped,
}

impl RecordingIntent {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Initial belief from the recorder state the host reported at startup.
    /// An unknown state is treated as recording so the first connected call
    /// still triggers a pause, which the host can ignore if it was not
    /// actually recording.
    pub const fn from_initial(state: RecorderState) -> Self {
        match state {
            RecorderState::Recording | RecorderState::Unknown => Self::Recording,
            RecorderState::Paused => Self::Paused,
            RecorderState::Stopped => Self::Stopped,
        }
    }
}

impl fmt::Display for RecordingIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ground-truth recorder state as reported by the host.
///
/// `Unknown` covers query timeouts; the resume sequence treats it as
/// grounds to abandon conservatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecorderState {
    Recording,
    Paused,
    Stopped,
    Unknown,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token tying timer fires and host query replies to the resume attempt
/// that scheduled them. A stale token means the attempt was superseded and
/// the event must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// An in-flight resume sequence. At most one exists at any time; it is
/// destroyed on success, exhaustion, or a superseding event.
#[derive(Debug, Clone)]
pub struct ResumeAttempt {
    pub token: AttemptToken,
    /// Audio-activity checks performed so far
    pub checks: u32,
    /// The activity transition that started the sequence
    pub cause: CallActivity,
}

impl ResumeAttempt {
    pub fn new(token: AttemptToken, cause: CallActivity) -> Self {
        Self {
            token,
            checks: 0,
            cause,
        }
    }
}
