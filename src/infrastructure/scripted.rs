//! Scripted event sources
//!
//! Deterministic stand-ins for the platform monitors: they replay a timed
//! script into the engine queue. The simulator CLI and the integration
//! tests are built on these.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::engine::EngineEvent;
use crate::application::ports::{
    AudioActivityProbe, AudioMonitor, EventSink, HostChannel, SubscribeError, SubscriptionGuard,
    TelephonyMonitor,
};
use crate::domain::audio::{AudioRouteEvent, InterruptionEvent};
use crate::domain::recording::RecorderState;
use crate::domain::telephony::CallEvent;

fn replay(sink: EventSink, script: Vec<(Duration, EngineEvent)>) -> SubscriptionGuard {
    let task = tokio::spawn(async move {
        let start = Instant::now();
        for (at, event) in script {
            tokio::time::sleep_until(start + at).await;
            if sink.send(event).is_err() {
                break;
            }
        }
    });
    SubscriptionGuard::from_task(task)
}

/// Telephony monitor replaying a fixed call-event script
pub struct ScriptedTelephonyMonitor {
    script: Vec<(Duration, CallEvent)>,
}

impl ScriptedTelephonyMonitor {
    pub fn new(script: Vec<(Duration, CallEvent)>) -> Self {
        Self { script }
    }
}

impl TelephonyMonitor for ScriptedTelephonyMonitor {
    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionGuard, SubscribeError> {
        let script = self
            .script
            .iter()
            .map(|(at, event)| (*at, EngineEvent::Call(*event)))
            .collect();
        Ok(replay(sink, script))
    }
}

/// One scripted audio-subsystem notification
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedAudioEvent {
    Route(AudioRouteEvent),
    Interruption(InterruptionEvent),
}

/// Audio monitor replaying route and interruption events
pub struct ScriptedAudioMonitor {
    script: Vec<(Duration, ScriptedAudioEvent)>,
}

impl ScriptedAudioMonitor {
    pub fn new(script: Vec<(Duration, ScriptedAudioEvent)>) -> Self {
        Self { script }
    }
}

impl AudioMonitor for ScriptedAudioMonitor {
    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionGuard, SubscribeError> {
        let script = self
            .script
            .iter()
            .map(|(at, event)| {
                let event = match event {
                    ScriptedAudioEvent::Route(route) => EngineEvent::Route(route.clone()),
                    ScriptedAudioEvent::Interruption(i) => EngineEvent::Interruption(*i),
                };
                (*at, event)
            })
            .collect();
        Ok(replay(sink, script))
    }
}

/// Activity probe answering from a timeline of (offset, active) changes.
///
/// The clock starts at construction; before the first change the answer
/// is `false`.
pub struct TimelineAudioProbe {
    start: Instant,
    changes: Vec<(Duration, bool)>,
}

impl TimelineAudioProbe {
    pub fn new(mut changes: Vec<(Duration, bool)>) -> Self {
        changes.sort_by_key(|(at, _)| *at);
        Self {
            start: Instant::now(),
            changes,
        }
    }
}

impl AudioActivityProbe for TimelineAudioProbe {
    fn is_other_audio_active(&self) -> bool {
        let elapsed = self.start.elapsed();
        self.changes
            .iter()
            .take_while(|(at, _)| *at <= elapsed)
            .last()
            .map(|(_, active)| *active)
            .unwrap_or(false)
    }
}

/// A pause or resume command observed by the scripted host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedCommand {
    Pause,
    Resume,
}

/// In-memory host: tracks recorder state through the commands it receives
/// and records everything for later assertions. State query replies can be
/// overridden per call to script disagreement with the tracked state.
pub struct ScriptedHost {
    state: Mutex<RecorderState>,
    reply_overrides: Mutex<VecDeque<RecorderState>>,
    commands: Mutex<Vec<ObservedCommand>>,
    debug: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new(initial: RecorderState) -> Self {
        Self {
            state: Mutex::new(initial),
            reply_overrides: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
            debug: Mutex::new(Vec::new()),
        }
    }

    /// Queue a state reply that overrides the tracked state once
    pub fn push_reply_override(&self, state: RecorderState) {
        self.reply_overrides
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(state);
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> Vec<ObservedCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Debug messages received so far
    pub fn debug_messages(&self) -> Vec<String> {
        self.debug.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The recorder state as driven by received commands
    pub fn state(&self) -> RecorderState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HostChannel for ScriptedHost {
    fn pause(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RecorderState::Paused;
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ObservedCommand::Pause);
    }

    fn resume(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RecorderState::Recording;
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ObservedCommand::Resume);
    }

    async fn recorder_state(&self) -> RecorderState {
        let overridden = self
            .reply_overrides
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        overridden.unwrap_or_else(|| self.state())
    }

    fn log_debug(&self, message: &str) {
        self.debug
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}
