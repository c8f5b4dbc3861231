//! Scenario file loading and preparation
//!
//! A scenario is a TOML file describing a timed sequence of telephony,
//! route and interruption events plus an other-audio activity timeline.
//! The simulator splits it into the per-monitor scripts the scripted
//! adapters replay.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::audio::{
    AudioDevice, AudioRouteEvent, InterruptionEvent, InterruptionPhase, RouteChangeReason,
};
use crate::domain::config::ContinuityConfig;
use crate::domain::recording::RecorderState;
use crate::domain::telephony::{CallDirection, CallEvent};
use crate::infrastructure::scripted::ScriptedAudioEvent;

/// Errors while loading a scenario file
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A full simulation scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Recorder state at simulation start
    #[serde(default = "default_initial_state")]
    pub initial_state: RecorderState,

    /// Timing overrides; unset fields fall back to the defaults
    #[serde(default)]
    pub config: ContinuityConfig,

    /// The timed event sequence
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

fn default_initial_state() -> RecorderState {
    RecorderState::Recording
}

/// One event at an offset from simulation start
#[derive(Debug, Clone, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: ScenarioEvent,
}

/// An event as written in the scenario file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScenarioEvent {
    /// Telephony state change
    Call {
        direction: CallDirection,
        #[serde(default)]
        connected: bool,
        #[serde(default)]
        ended: bool,
    },
    /// Audio route change
    Route {
        reason: RouteChangeReason,
        #[serde(default)]
        devices: Vec<AudioDevice>,
    },
    /// External audio takeover phase change
    Interruption {
        phase: InterruptionPhase,
        #[serde(default)]
        resume_hint: bool,
    },
    /// Other-audio activity flips to the given value
    AudioActive { active: bool },
}

impl Scenario {
    /// The telephony script, in scenario order
    pub fn call_script(&self) -> Vec<(Duration, CallEvent)> {
        self.events
            .iter()
            .filter_map(|timed| match &timed.event {
                ScenarioEvent::Call {
                    direction,
                    connected,
                    ended,
                } => Some((
                    Duration::from_millis(timed.at_ms),
                    CallEvent {
                        direction: *direction,
                        connected: *connected,
                        ended: *ended,
                    },
                )),
                _ => None,
            })
            .collect()
    }

    /// The audio-subsystem script (routes and interruptions)
    pub fn audio_script(&self) -> Vec<(Duration, ScriptedAudioEvent)> {
        self.events
            .iter()
            .filter_map(|timed| {
                let at = Duration::from_millis(timed.at_ms);
                match &timed.event {
                    ScenarioEvent::Route { reason, devices } => Some((
                        at,
                        ScriptedAudioEvent::Route(AudioRouteEvent {
                            reason: *reason,
                            devices: devices.clone(),
                        }),
                    )),
                    ScenarioEvent::Interruption { phase, resume_hint } => Some((
                        at,
                        ScriptedAudioEvent::Interruption(InterruptionEvent {
                            phase: *phase,
                            resume_hint: *resume_hint,
                        }),
                    )),
                    _ => None,
                }
            })
            .collect()
    }

    /// The other-audio activity timeline for the probe
    pub fn activity_timeline(&self) -> Vec<(Duration, bool)> {
        self.events
            .iter()
            .filter_map(|timed| match &timed.event {
                ScenarioEvent::AudioActive { active } => {
                    Some((Duration::from_millis(timed.at_ms), *active))
                }
                _ => None,
            })
            .collect()
    }

    /// How long to run before reading the outcome.
    ///
    /// Covers the last scripted event plus a full worst-case resume
    /// sequence: settle, every audio check, the diagnostic query and the
    /// host query timeout.
    pub fn horizon(&self, config: &ContinuityConfig) -> Duration {
        let last = self
            .events
            .iter()
            .map(|timed| timed.at_ms)
            .max()
            .unwrap_or(0);
        let tail = config.settle_delay()
            + config.retry_backoff() * config.max_audio_checks()
            + config.connect_recheck_delay()
            + config.diagnostic_delay()
            + config.host_query_timeout()
            + Duration::from_millis(250);
        Duration::from_millis(last) + tail
    }
}

/// Load a scenario from a TOML file
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioPortType;

    const SAMPLE: &str = r#"
initial_state = "recording"

[config]
settle_delay_ms = 20
retry_backoff_ms = 30
max_audio_checks = 2

[[events]]
at_ms = 100
kind = "call"
direction = "incoming"

[[events]]
at_ms = 200
kind = "call"
direction = "incoming"
connected = true

[[events]]
at_ms = 250
kind = "audio-active"
active = true

[[events]]
at_ms = 400
kind = "route"
reason = "new-device"
devices = [{ name = "Jabra Evolve", port_type = "usb-audio" }]

[[events]]
at_ms = 500
kind = "interruption"
phase = "ended"
resume_hint = true

[[events]]
at_ms = 600
kind = "call"
direction = "incoming"
ended = true
"#;

    #[test]
    fn parses_a_full_scenario() {
        let scenario: Scenario = toml::from_str(SAMPLE).unwrap();
        assert_eq!(scenario.initial_state, RecorderState::Recording);
        assert_eq!(scenario.config.settle_delay(), Duration::from_millis(20));
        assert_eq!(scenario.events.len(), 6);
    }

    #[test]
    fn initial_state_defaults_to_recording() {
        let scenario: Scenario = toml::from_str("").unwrap();
        assert_eq!(scenario.initial_state, RecorderState::Recording);
        assert!(scenario.events.is_empty());
    }

    #[test]
    fn splits_into_per_monitor_scripts() {
        let scenario: Scenario = toml::from_str(SAMPLE).unwrap();

        let calls = scenario.call_script();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            (
                Duration::from_millis(100),
                CallEvent::ringing(CallDirection::Incoming)
            )
        );
        assert!(calls[2].1.ended);

        let audio = scenario.audio_script();
        assert_eq!(audio.len(), 2);
        match &audio[0].1 {
            ScriptedAudioEvent::Route(route) => {
                assert_eq!(route.reason, RouteChangeReason::NewDevice);
                assert_eq!(route.devices[0].port_type, AudioPortType::UsbAudio);
            }
            other => panic!("expected a route event, got {:?}", other),
        }
        match &audio[1].1 {
            ScriptedAudioEvent::Interruption(i) => assert!(i.resume_hint),
            other => panic!("expected an interruption, got {:?}", other),
        }

        let timeline = scenario.activity_timeline();
        assert_eq!(timeline, vec![(Duration::from_millis(250), true)]);
    }

    #[test]
    fn horizon_extends_past_the_last_event() {
        let scenario: Scenario = toml::from_str(SAMPLE).unwrap();
        let config = ContinuityConfig::defaults().merge(scenario.config.clone());
        assert!(scenario.horizon(&config) > Duration::from_millis(600));
    }

    #[test]
    fn rejects_an_unknown_event_kind() {
        let result: Result<Scenario, _> =
            toml::from_str("[[events]]\nat_ms = 0\nkind = \"reboot\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_a_missing_file() {
        let err = load_scenario(Path::new("/nonexistent/scenario.toml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }
}
