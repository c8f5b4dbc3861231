//! Call activity state machine

use std::fmt;

/// Aggregated belief about whether a real telephone or VoIP call is
/// currently ringing, connected, or just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallActivity {
    #[default]
    Idle,
    Ringing,
    Connected,
    Ended,
}

impl CallActivity {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ringing => "ringing",
            Self::Connected => "connected",
            Self::Ended => "ended",
        }
    }

    /// True while a call is ringing or connected. Resuming the recording is
    /// never allowed in these states.
    pub const fn blocks_resume(&self) -> bool {
        matches!(self, Self::Ringing | Self::Connected)
    }
}

impl fmt::Display for CallActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque identifier for a synthetic VoIP call reported by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SipCallId(u64);

impl SipCallId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SipCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sip-{}", self.0)
    }
}

/// A synthetic VoIP call, remembered by the device that started it so the
/// matching device-lost event can end it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipCall {
    pub id: SipCallId,
    pub device_name: String,
}

/// One observed activity change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub old: CallActivity,
    pub new: CallActivity,
}

/// Call activity session entity.
///
/// Enforces the legal transitions; callers decide when the evidence
/// justifies taking one. Illegal or redundant requests return `None`, which
/// is what makes duplicate platform notifications harmless.
///
/// State machine:
///   IDLE -> RINGING (ring)
///   IDLE | RINGING -> CONNECTED (connect)
///   RINGING -> IDLE (dismiss_ring, voicemail/rejected-call path)
///   CONNECTED -> ENDED (end)
///   ENDED -> IDLE (settle, clears any SIP call)
#[derive(Debug, Default)]
pub struct ActivitySession {
    activity: CallActivity,
    sip_call: Option<SipCall>,
}

impl ActivitySession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            activity: CallActivity::Idle,
            sip_call: None,
        }
    }

    /// Get the current activity
    pub fn activity(&self) -> CallActivity {
        self.activity
    }

    /// Get the synthetic VoIP call, if one is live
    pub fn sip_call(&self) -> Option<&SipCall> {
        self.sip_call.as_ref()
    }

    fn transition(&mut self, new: CallActivity) -> Transition {
        let old = self.activity;
        self.activity = new;
        Transition { old, new }
    }

    /// A new call was detected but not yet answered. Only meaningful from
    /// idle: ringing never overrides a connected call.
    pub fn ring(&mut self) -> Option<Transition> {
        match self.activity {
            CallActivity::Idle => Some(self.transition(CallActivity::Ringing)),
            _ => None,
        }
    }

    /// A call connected, optionally a synthetic VoIP one
    pub fn connect(&mut self, sip_call: Option<SipCall>) -> Option<Transition> {
        match self.activity {
            CallActivity::Idle | CallActivity::Ringing => {
                self.sip_call = sip_call;
                Some(self.transition(CallActivity::Connected))
            }
            _ => None,
        }
    }

    /// The ringing call went away without connecting (voicemail, rejected).
    /// Collapses straight back to idle without passing through ended.
    pub fn dismiss_ring(&mut self) -> Option<Transition> {
        match self.activity {
            CallActivity::Ringing => Some(self.transition(CallActivity::Idle)),
            _ => None,
        }
    }

    /// The connected call ended
    pub fn end(&mut self) -> Option<Transition> {
        match self.activity {
            CallActivity::Connected => Some(self.transition(CallActivity::Ended)),
            _ => None,
        }
    }

    /// Collapse ended back to idle, clearing the SIP call
    pub fn settle(&mut self) -> Option<Transition> {
        match self.activity {
            CallActivity::Ended => {
                self.sip_call = None;
                Some(self.transition(CallActivity::Idle))
            }
            _ => None,
        }
    }
}
