//! Normalized telephony events

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a tracked call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

impl CallDirection {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One state change of a tracked call, as reported by the telephony source.
///
/// Every raw change is forwarded without coalescing. Ordering is preserved
/// per call but not across overlapping calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub direction: CallDirection,
    pub connected: bool,
    pub ended: bool,
}

impl CallEvent {
    /// A call that is ringing but not yet answered
    pub const fn ringing(direction: CallDirection) -> Self {
        Self {
            direction,
            connected: false,
            ended: false,
        }
    }

    /// A call that has been answered
    pub const fn connected(direction: CallDirection) -> Self {
        Self {
            direction,
            connected: true,
            ended: false,
        }
    }

    /// A call that has ended
    pub const fn ended(direction: CallDirection) -> Self {
        Self {
            direction,
            connected: false,
            ended: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ringing_event_is_neither_connected_nor_ended() {
        let event = CallEvent::ringing(CallDirection::Incoming);
        assert!(!event.connected);
        assert!(!event.ended);
    }

    #[test]
    fn connected_event_is_not_ended() {
        let event = CallEvent::connected(CallDirection::Outgoing);
        assert!(event.connected);
        assert!(!event.ended);
    }

    #[test]
    fn ended_event_is_ended() {
        let event = CallEvent::ended(CallDirection::Incoming);
        assert!(event.ended);
    }

    #[test]
    fn direction_display() {
        assert_eq!(CallDirection::Incoming.to_string(), "incoming");
        assert_eq!(CallDirection::Outgoing.to_string(), "outgoing");
    }
}
