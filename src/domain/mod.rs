//! Domain layer - Core business logic
//!
//! Contains value objects, state machines, and configuration.
//! This layer has no dependencies on external systems.

pub mod activity;
pub mod audio;
pub mod config;
pub mod recording;
pub mod telephony;

// Re-export common types
pub use activity::{ActivitySession, CallActivity, SipCall, SipCallId, Transition};
pub use audio::{
    AudioDevice, AudioPortType, AudioRouteEvent, InterruptionEvent, InterruptionPhase,
    RouteChangeReason,
};
pub use config::ContinuityConfig;
pub use recording::{AttemptToken, RecorderState, RecordingIntent, ResumeAttempt};
pub use telephony::{CallDirection, CallEvent};
