//! Deferred work port
//!
//! All waits in the engine are expressed as scheduled continuations: the
//! dispatcher re-enqueues a timer or query reply as an ordinary engine
//! event, so its handling is linearized with live events. Handlers check
//! attempt tokens before acting, which is all the cancellation that is
//! ever needed.

use std::time::Duration;

use crate::application::engine::{EngineEvent, QueryPurpose};

/// Schedules deferred engine events and asynchronous host-state queries.
pub trait Dispatcher: Send + Sync {
    /// Deliver `event` to the engine queue after `delay`
    fn schedule(&self, delay: Duration, event: EngineEvent);

    /// Query the host recorder state off the event loop; the reply arrives
    /// later as an `EngineEvent::HostReply`.
    fn query_recorder_state(&self, purpose: QueryPurpose);
}
