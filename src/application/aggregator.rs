//! Call activity aggregator
//!
//! Fuses the three raw event streams (call lifecycle, audio routes,
//! interruptions) into one authoritative `CallActivity`, with hysteresis
//! against voicemail and ring-only noise. Because the engine processes one
//! event at a time, contradictory evidence resolves through the transition
//! guards: ringing never overrides a connected call, and an ended call
//! always wins over a connected one.

use std::sync::Arc;

use crate::application::engine::{EngineEvent, TimerEvent};
use crate::application::ports::{AudioActivityProbe, Dispatcher, HostChannel};
use crate::domain::activity::{ActivitySession, CallActivity, SipCall, SipCallId, Transition};
use crate::domain::audio::{
    is_voip_device, AudioRouteEvent, InterruptionEvent, InterruptionPhase, RouteChangeReason,
};
use crate::domain::config::ContinuityConfig;
use crate::domain::telephony::CallEvent;

/// What the aggregator observed while handling one event. The engine feeds
/// these to the continuity controller in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityChange {
    Activity(Transition),
    Interruption { interrupted: bool },
}

/// A connect event held back until audio evidence confirms it
#[derive(Debug, Clone, Copy)]
struct PendingConnect {
    generation: u64,
}

/// Merges call, route, and interruption events into one `CallActivity`.
pub struct CallActivityAggregator {
    session: ActivitySession,
    interrupted: bool,
    pending_connect: Option<PendingConnect>,
    recheck_generation: u64,
    next_sip_id: u64,
    config: ContinuityConfig,
    probe: Arc<dyn AudioActivityProbe>,
    dispatcher: Arc<dyn Dispatcher>,
    host: Arc<dyn HostChannel>,
}

impl CallActivityAggregator {
    pub fn new(
        config: ContinuityConfig,
        probe: Arc<dyn AudioActivityProbe>,
        dispatcher: Arc<dyn Dispatcher>,
        host: Arc<dyn HostChannel>,
    ) -> Self {
        Self {
            session: ActivitySession::new(),
            interrupted: false,
            pending_connect: None,
            recheck_generation: 0,
            next_sip_id: 0,
            config,
            probe,
            dispatcher,
            host,
        }
    }

    /// Current aggregated activity
    pub fn activity(&self) -> CallActivity {
        self.session.activity()
    }

    /// Current interruption flag
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Handle one telephony event
    pub fn handle_call_event(&mut self, event: CallEvent) -> Vec<ActivityChange> {
        let mut changes = Vec::new();

        if event.ended {
            self.pending_connect = None;
            match self.session.activity() {
                CallActivity::Connected => self.finish_call(&mut changes),
                CallActivity::Ringing => {
                    // Voicemail or rejected call: back to idle without
                    // passing through ended, so no resume sequence runs.
                    if let Some(t) = self.session.dismiss_ring() {
                        self.host
                            .log_debug("call went away before connecting, dismissing ring");
                        changes.push(ActivityChange::Activity(t));
                    }
                }
                _ => {
                    self.host.log_debug("ignoring end event with no tracked call");
                }
            }
        } else if event.connected {
            self.try_confirmed_connect(&mut changes);
        } else if let Some(t) = self.session.ring() {
            changes.push(ActivityChange::Activity(t));
        }

        changes
    }

    /// Handle one audio route event
    pub fn handle_route_event(&mut self, event: AudioRouteEvent) -> Vec<ActivityChange> {
        let mut changes = Vec::new();

        match event.reason {
            RouteChangeReason::NewDevice => {
                let voip = event.devices.iter().find(|d| is_voip_device(d));
                if let Some(device) = voip {
                    // A VoIP-class device attaching counts as a call
                    // connecting even without a telephony event.
                    self.next_sip_id += 1;
                    let sip_call = SipCall {
                        id: SipCallId::new(self.next_sip_id),
                        device_name: device.name.clone(),
                    };
                    self.pending_connect = None;
                    self.host.log_debug(&format!(
                        "voip device attached: {} ({})",
                        device.name, device.port_type
                    ));
                    if let Some(t) = self.session.connect(Some(sip_call)) {
                        changes.push(ActivityChange::Activity(t));
                    }
                }
            }
            RouteChangeReason::DeviceLost => {
                let lost = self.session.sip_call().is_some_and(|sip| {
                    event.devices.iter().any(|d| d.name == sip.device_name)
                });
                if lost {
                    self.host.log_debug("voip device lost, ending synthetic call");
                    self.finish_call(&mut changes);
                }
            }
            RouteChangeReason::CategoryChanged => {
                self.host.log_debug("audio category changed, no activity impact");
            }
        }

        changes
    }

    /// Handle one interruption event
    pub fn handle_interruption(&mut self, event: InterruptionEvent) -> Vec<ActivityChange> {
        let mut changes = Vec::new();

        match event.phase {
            InterruptionPhase::Began => {
                if !self.interrupted {
                    self.interrupted = true;
                    changes.push(ActivityChange::Interruption { interrupted: true });
                }
            }
            InterruptionPhase::Ended => {
                if self.interrupted {
                    if event.resume_hint {
                        self.interrupted = false;
                        changes.push(ActivityChange::Interruption { interrupted: false });
                    } else {
                        self.host
                            .log_debug("interruption ended without resume hint, staying interrupted");
                    }
                }
            }
        }

        changes
    }

    /// The deferred re-check of a connect event that lacked audio evidence
    pub fn handle_connect_recheck(&mut self, generation: u64) -> Vec<ActivityChange> {
        let mut changes = Vec::new();

        let live = self
            .pending_connect
            .is_some_and(|p| p.generation == generation);
        if !live {
            return changes;
        }
        self.pending_connect = None;

        if self.probe.is_other_audio_active() {
            if let Some(t) = self.session.connect(None) {
                changes.push(ActivityChange::Activity(t));
            }
        } else {
            self.host
                .log_debug("discarding connect event, audio never confirmed it");
        }

        changes
    }

    /// Accept a connect only with audio evidence; otherwise hold it for one
    /// deferred re-check. A second connect while one is held is dropped.
    fn try_confirmed_connect(&mut self, changes: &mut Vec<ActivityChange>) {
        if !matches!(
            self.session.activity(),
            CallActivity::Idle | CallActivity::Ringing
        ) {
            return;
        }

        if self.probe.is_other_audio_active() {
            self.pending_connect = None;
            if let Some(t) = self.session.connect(None) {
                changes.push(ActivityChange::Activity(t));
            }
        } else if self.pending_connect.is_none() {
            self.recheck_generation += 1;
            let generation = self.recheck_generation;
            self.pending_connect = Some(PendingConnect { generation });
            self.host
                .log_debug("holding connect event, waiting for audio evidence");
            self.dispatcher.schedule(
                self.config.connect_recheck_delay(),
                EngineEvent::Timer(TimerEvent::ConnectRecheck { generation }),
            );
        }
    }

    /// End the tracked call and collapse to idle, emitting both transitions
    fn finish_call(&mut self, changes: &mut Vec<ActivityChange>) {
        self.pending_connect = None;
        if let Some(t) = self.session.end() {
            changes.push(ActivityChange::Activity(t));
            if let Some(settled) = self.session.settle() {
                changes.push(ActivityChange::Activity(settled));
            }
        }
    }
}
