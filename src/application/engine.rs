//! Serialized continuity engine
//!
//! One task owns all mutable state. Every input, live events from the
//! monitors, timer fires, and host query replies alike, arrives on a
//! single queue and is processed one at a time, so no handler ever races
//! another and a cancellation check always runs before the action it
//! guards.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::aggregator::{ActivityChange, CallActivityAggregator};
use crate::application::controller::ContinuityController;
use crate::application::ports::{
    AudioActivityProbe, AudioMonitor, Dispatcher, EventSink, HostChannel, SubscribeError,
    SubscriptionGuard, TelephonyMonitor,
};
use crate::domain::audio::{AudioRouteEvent, InterruptionEvent};
use crate::domain::config::ContinuityConfig;
use crate::domain::recording::{AttemptToken, RecorderState};
use crate::domain::telephony::CallEvent;

/// Everything the engine can process, in one queue
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Call(CallEvent),
    Route(AudioRouteEvent),
    Interruption(InterruptionEvent),
    Timer(TimerEvent),
    HostReply {
        purpose: QueryPurpose,
        state: RecorderState,
    },
    Shutdown,
}

/// A deferred continuation re-entering the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The one deferred re-check of an unconfirmed connect
    ConnectRecheck { generation: u64 },
    /// Settle delay before a resume sequence queries the host
    ResumeSettle { token: AttemptToken },
    /// Backoff before the next audio-activity check
    ResumeRetry { token: AttemptToken },
    /// Post-resume diagnostic query delay
    ResumeDiagnostic,
}

/// Why a host state query was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPurpose {
    /// Gates a resume sequence; the reply is dropped if the token is stale
    ResumeGate { token: AttemptToken },
    /// Post-resume confirmation, logged only
    Diagnostic,
}

/// Engine startup errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to subscribe to event source: {0}")]
    Subscribe(#[from] SubscribeError),
}

/// Dispatcher backed by the tokio runtime: timers are sleeping tasks that
/// post back into the queue, host queries are request tasks that post the
/// reply as an ordinary event. A send onto a closed queue means the engine
/// is gone and the continuation is simply discarded.
pub struct TokioDispatcher {
    sink: EventSink,
    host: Arc<dyn HostChannel>,
}

impl TokioDispatcher {
    pub fn new(sink: EventSink, host: Arc<dyn HostChannel>) -> Self {
        Self { sink, host }
    }
}

impl Dispatcher for TokioDispatcher {
    fn schedule(&self, delay: Duration, event: EngineEvent) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sink.send(event);
        });
    }

    fn query_recorder_state(&self, purpose: QueryPurpose) {
        let sink = self.sink.clone();
        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            let state = host.recorder_state().await;
            let _ = sink.send(EngineEvent::HostReply { purpose, state });
        });
    }
}

/// Handle for posting events and shutting the engine down
#[derive(Clone)]
pub struct EngineHandle {
    sink: EventSink,
}

impl EngineHandle {
    /// Post an event onto the engine queue
    pub fn post(&self, event: EngineEvent) {
        let _ = self.sink.send(event);
    }

    /// Ask the engine to stop; pending timers are suppressed, no command
    /// is issued after this.
    pub fn shutdown(&self) {
        let _ = self.sink.send(EngineEvent::Shutdown);
    }
}

/// The serialized event loop fusing monitors, aggregator, and controller.
pub struct Engine {
    queue: mpsc::UnboundedReceiver<EngineEvent>,
    aggregator: CallActivityAggregator,
    controller: ContinuityController,
    _subscriptions: Vec<SubscriptionGuard>,
}

impl Engine {
    /// Subscribe to both event sources and assemble the engine. A
    /// subscription failure here is fatal; the host restarts us.
    pub fn start(
        config: ContinuityConfig,
        initial_state: RecorderState,
        telephony: &dyn TelephonyMonitor,
        audio: &dyn AudioMonitor,
        probe: Arc<dyn AudioActivityProbe>,
        host: Arc<dyn HostChannel>,
    ) -> Result<(Self, EngineHandle), EngineError> {
        let (sink, queue) = mpsc::unbounded_channel();
        let dispatcher: Arc<dyn Dispatcher> =
            Arc::new(TokioDispatcher::new(sink.clone(), Arc::clone(&host)));

        let subscriptions = vec![telephony.subscribe(sink.clone())?, audio.subscribe(sink.clone())?];

        let aggregator = CallActivityAggregator::new(
            config.clone(),
            Arc::clone(&probe),
            Arc::clone(&dispatcher),
            Arc::clone(&host),
        );
        let controller =
            ContinuityController::new(config, initial_state, probe, dispatcher, host);

        let engine = Self {
            queue,
            aggregator,
            controller,
            _subscriptions: subscriptions,
        };
        Ok((engine, EngineHandle { sink }))
    }

    /// Run until shutdown or until every sender is gone. Subscriptions are
    /// released on return.
    pub async fn run(mut self) {
        while let Some(event) = self.queue.recv().await {
            match event {
                EngineEvent::Call(call) => {
                    let changes = self.aggregator.handle_call_event(call);
                    self.dispatch(changes);
                }
                EngineEvent::Route(route) => {
                    let changes = self.aggregator.handle_route_event(route);
                    self.dispatch(changes);
                }
                EngineEvent::Interruption(interruption) => {
                    let changes = self.aggregator.handle_interruption(interruption);
                    self.dispatch(changes);
                }
                EngineEvent::Timer(TimerEvent::ConnectRecheck { generation }) => {
                    let changes = self.aggregator.handle_connect_recheck(generation);
                    self.dispatch(changes);
                }
                EngineEvent::Timer(timer) => {
                    self.controller.on_timer(timer);
                }
                EngineEvent::HostReply { purpose, state } => {
                    self.controller.on_host_reply(purpose, state);
                }
                EngineEvent::Shutdown => break,
            }
        }
    }

    fn dispatch(&mut self, changes: Vec<ActivityChange>) {
        for change in changes {
            self.controller.apply(change);
        }
    }
}
