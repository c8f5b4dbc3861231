//! Event source port interfaces

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::application::engine::EngineEvent;

/// Where subscribed sources deliver their normalized events: the engine's
/// single serialized queue.
pub type EventSink = UnboundedSender<EngineEvent>;

/// Subscription errors. Failing to subscribe is fatal at startup; the core
/// does not retry a broken event source, restart is the host's
/// responsibility.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Telephony event source unavailable: {0}")]
    TelephonyUnavailable(String),

    #[error("Audio event source unavailable: {0}")]
    AudioUnavailable(String),
}

/// Releases an event-source subscription when dropped.
///
/// Sources backed by a forwarding task hand over its handle; the task is
/// aborted on drop so no event outlives the engine.
#[derive(Debug)]
pub struct SubscriptionGuard {
    task: Option<JoinHandle<()>>,
}

impl SubscriptionGuard {
    /// Guard over a forwarding task
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Guard for a source with nothing to release
    pub fn detached() -> Self {
        Self { task: None }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Port wrapping the platform's call-observation primitive.
///
/// Subscribed once at startup; every raw call-state change is forwarded as
/// one `CallEvent` without buffering or coalescing.
pub trait TelephonyMonitor: Send + Sync {
    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionGuard, SubscribeError>;
}

/// Port wrapping route-change and interruption notifications.
///
/// Emits exactly one `AudioRouteEvent` or `InterruptionEvent` per platform
/// notification; unrecognized reason codes are dropped before they reach
/// the sink.
pub trait AudioMonitor: Send + Sync {
    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionGuard, SubscribeError>;
}

/// Synchronous predicate over the audio subsystem: is another audio source
/// currently active?
pub trait AudioActivityProbe: Send + Sync {
    fn is_other_audio_active(&self) -> bool;
}
