//! Normalized audio route and interruption events

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod classifier;

pub use classifier::is_voip_device;

/// Port type of an audio endpoint.
///
/// Platform-specific port identifiers are translated into this set by the
/// audio route monitor; anything it cannot map becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioPortType {
    BuiltInMic,
    BuiltInSpeaker,
    UsbAudio,
    BluetoothHfp,
    BluetoothA2dp,
    WiredHeadset,
    WiredHeadphones,
    LineIn,
    Other,
}

impl AudioPortType {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuiltInMic => "built-in-mic",
            Self::BuiltInSpeaker => "built-in-speaker",
            Self::UsbAudio => "usb-audio",
            Self::BluetoothHfp => "bluetooth-hfp",
            Self::BluetoothA2dp => "bluetooth-a2dp",
            Self::WiredHeadset => "wired-headset",
            Self::WiredHeadphones => "wired-headphones",
            Self::LineIn => "line-in",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AudioPortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when parsing an audio port type string
#[derive(Debug, Clone, Error)]
#[error("Unknown audio port type: \"{input}\". Expected one of: built-in-mic, built-in-speaker, usb-audio, bluetooth-hfp, bluetooth-a2dp, wired-headset, wired-headphones, line-in, other")]
pub struct PortTypeParseError {
    pub input: String,
}

impl FromStr for AudioPortType {
    type Err = PortTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "built-in-mic" => Ok(Self::BuiltInMic),
            "built-in-speaker" => Ok(Self::BuiltInSpeaker),
            "usb-audio" => Ok(Self::UsbAudio),
            "bluetooth-hfp" => Ok(Self::BluetoothHfp),
            "bluetooth-a2dp" => Ok(Self::BluetoothA2dp),
            "wired-headset" => Ok(Self::WiredHeadset),
            "wired-headphones" => Ok(Self::WiredHeadphones),
            "line-in" => Ok(Self::LineIn),
            "other" => Ok(Self::Other),
            _ => Err(PortTypeParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// An audio endpoint as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub name: String,
    pub port_type: AudioPortType,
}

impl AudioDevice {
    pub fn new(name: impl Into<String>, port_type: AudioPortType) -> Self {
        Self {
            name: name.into(),
            port_type,
        }
    }
}

/// Why an audio route changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteChangeReason {
    NewDevice,
    DeviceLost,
    CategoryChanged,
}

/// A route change, carrying the devices the change concerns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRouteEvent {
    pub reason: RouteChangeReason,
    pub devices: Vec<AudioDevice>,
}

/// Phase of an external audio takeover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterruptionPhase {
    Began,
    Ended,
}

/// External audio takeover notification (ringtone, assistant, other app).
///
/// `resume_hint` is only meaningful on the `Ended` phase: it signals that
/// the platform considers it safe to resume our own audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptionEvent {
    pub phase: InterruptionPhase,
    pub resume_hint: bool,
}

impl InterruptionEvent {
    pub const fn began() -> Self {
        Self {
            phase: InterruptionPhase::Began,
            resume_hint: false,
        }
    }

    pub const fn ended(resume_hint: bool) -> Self {
        Self {
            phase: InterruptionPhase::Ended,
            resume_hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_type_round_trips_through_str() {
        for port in [
            AudioPortType::BuiltInMic,
            AudioPortType::UsbAudio,
            AudioPortType::BluetoothHfp,
            AudioPortType::WiredHeadset,
            AudioPortType::LineIn,
            AudioPortType::Other,
        ] {
            assert_eq!(port.as_str().parse::<AudioPortType>().unwrap(), port);
        }
    }

    #[test]
    fn unknown_port_type_fails_to_parse() {
        let err = "hdmi".parse::<AudioPortType>().unwrap_err();
        assert!(err.to_string().contains("hdmi"));
    }

    #[test]
    fn interruption_constructors() {
        assert_eq!(InterruptionEvent::began().phase, InterruptionPhase::Began);
        assert!(InterruptionEvent::ended(true).resume_hint);
        assert!(!InterruptionEvent::ended(false).resume_hint);
    }
}
