//! Recording continuity controller
//!
//! Consumes call activity transitions and drives the pause/resume
//! protocol. Pausing is immediate; resuming runs a bounded, cancellable
//! confirmation sequence: settle, verify the host actually paused, check
//! that no other audio is active (up to a fixed number of attempts with
//! backoff), then resume and re-query once for diagnostics.
//!
//! Every deferred step carries the attempt token it was scheduled under; a
//! token that no longer matches the live attempt means the step was
//! superseded and is dropped. Idempotence is guarded on the recording
//! intent, not on the incoming event, so duplicate notifications never
//! produce duplicate commands.

use std::sync::Arc;

use crate::application::aggregator::ActivityChange;
use crate::application::engine::{EngineEvent, QueryPurpose, TimerEvent};
use crate::application::ports::{AudioActivityProbe, Dispatcher, HostChannel};
use crate::domain::activity::{CallActivity, Transition};
use crate::domain::config::ContinuityConfig;
use crate::domain::recording::{AttemptToken, RecorderState, RecordingIntent, ResumeAttempt};

/// Drives pause/resume commands from aggregated call activity.
pub struct ContinuityController {
    intent: RecordingIntent,
    attempt: Option<ResumeAttempt>,
    next_token: u64,
    activity: CallActivity,
    interrupted: bool,
    config: ContinuityConfig,
    probe: Arc<dyn AudioActivityProbe>,
    dispatcher: Arc<dyn Dispatcher>,
    host: Arc<dyn HostChannel>,
}

impl ContinuityController {
    pub fn new(
        config: ContinuityConfig,
        initial_state: RecorderState,
        probe: Arc<dyn AudioActivityProbe>,
        dispatcher: Arc<dyn Dispatcher>,
        host: Arc<dyn HostChannel>,
    ) -> Self {
        Self {
            intent: RecordingIntent::from_initial(initial_state),
            attempt: None,
            next_token: 0,
            activity: CallActivity::Idle,
            interrupted: false,
            config,
            probe,
            dispatcher,
            host,
        }
    }

    /// Current belief about the host recorder
    pub fn intent(&self) -> RecordingIntent {
        self.intent
    }

    /// True while a resume sequence is in flight
    pub fn resume_pending(&self) -> bool {
        self.attempt.is_some()
    }

    /// Entry point for aggregator output
    pub fn apply(&mut self, change: ActivityChange) {
        match change {
            ActivityChange::Activity(t) => self.on_activity_changed(t),
            ActivityChange::Interruption { interrupted } => {
                self.on_interruption_changed(interrupted)
            }
        }
    }

    /// Called by the engine on every aggregated activity transition
    pub fn on_activity_changed(&mut self, transition: Transition) {
        self.activity = transition.new;
        match transition.new {
            CallActivity::Connected => {
                self.disqualify("call connected", true);
            }
            CallActivity::Ringing => {
                // Ringing alone never pauses; it only cancels a pending
                // resume sequence.
                self.disqualify("call ringing", false);
            }
            CallActivity::Ended => {
                self.maybe_start_resume(transition.new);
            }
            CallActivity::Idle => {}
        }
    }

    /// Called by the engine when the interruption flag flips
    pub fn on_interruption_changed(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
        if interrupted {
            self.disqualify("interruption began", true);
        } else {
            self.maybe_start_resume(self.activity);
        }
    }

    /// Timer continuations re-entering from the engine queue
    pub fn on_timer(&mut self, timer: TimerEvent) {
        match timer {
            TimerEvent::ResumeSettle { token } => {
                if self.is_live(token) {
                    self.dispatcher
                        .query_recorder_state(QueryPurpose::ResumeGate { token });
                }
            }
            TimerEvent::ResumeRetry { token } => {
                if self.is_live(token) {
                    self.run_audio_check(token);
                }
            }
            TimerEvent::ResumeDiagnostic => {
                self.dispatcher.query_recorder_state(QueryPurpose::Diagnostic);
            }
            // Routed to the aggregator by the engine, never here
            TimerEvent::ConnectRecheck { .. } => {}
        }
    }

    /// Host state query replies re-entering from the engine queue
    pub fn on_host_reply(&mut self, purpose: QueryPurpose, state: RecorderState) {
        match purpose {
            QueryPurpose::ResumeGate { token } => {
                if !self.is_live(token) {
                    self.host
                        .log_debug(&format!("dropping stale host reply for {token}"));
                    return;
                }
                if state != RecorderState::Paused {
                    // The host already resolved it or never paused
                    self.attempt = None;
                    self.host.log_debug(&format!(
                        "abandoning resume, host reports {state} instead of paused"
                    ));
                    return;
                }
                self.run_audio_check(token);
            }
            QueryPurpose::Diagnostic => {
                self.host
                    .log_debug(&format!("post-resume recorder state: {state}"));
            }
        }
    }

    /// A disqualifying event arrived: cancel any pending resume sequence
    /// and pause if the situation demands it. `pause_when_recording` is
    /// true for events that interrupt an active recording (connected call,
    /// interruption began) and false for ringing, which only matters to a
    /// pending sequence.
    fn disqualify(&mut self, reason: &str, pause_when_recording: bool) {
        let cancelled = self.cancel_attempt(reason);
        let needs_pause = (pause_when_recording && self.intent == RecordingIntent::Recording)
            || (cancelled && self.intent != RecordingIntent::Paused);
        if needs_pause {
            self.host.pause();
            self.intent = RecordingIntent::Paused;
            self.host.log_debug(&format!("pause issued: {reason}"));
        }
    }

    fn cancel_attempt(&mut self, reason: &str) -> bool {
        match self.attempt.take() {
            Some(attempt) => {
                self.host.log_debug(&format!(
                    "resume sequence {} cancelled: {reason}",
                    attempt.token
                ));
                true
            }
            None => false,
        }
    }

    /// Begin a resume sequence if the recording is paused and nothing
    /// disqualifies resuming right now.
    fn maybe_start_resume(&mut self, cause: CallActivity) {
        if self.intent != RecordingIntent::Paused {
            return;
        }
        if self.attempt.is_some() {
            return;
        }
        if self.interrupted || self.activity.blocks_resume() {
            self.host
                .log_debug("resume deferred, audio is still claimed elsewhere");
            return;
        }

        self.next_token += 1;
        let token = AttemptToken::new(self.next_token);
        self.attempt = Some(ResumeAttempt::new(token, cause));
        self.dispatcher.schedule(
            self.config.settle_delay(),
            EngineEvent::Timer(TimerEvent::ResumeSettle { token }),
        );
        self.host
            .log_debug(&format!("resume sequence {token} started ({cause})"));
    }

    /// One audio-activity check. Active audio retries after backoff until
    /// the bound is exhausted; quiet audio resumes the recording.
    fn run_audio_check(&mut self, token: AttemptToken) {
        let checks = match self.attempt.as_mut() {
            Some(attempt) if attempt.token == token => {
                attempt.checks += 1;
                attempt.checks
            }
            _ => return,
        };

        if self.probe.is_other_audio_active() {
            if checks >= self.config.max_audio_checks() {
                self.attempt = None;
                self.host.log_debug(&format!(
                    "resume sequence {token} abandoned, other audio still active after {checks} checks"
                ));
            } else {
                self.dispatcher.schedule(
                    self.config.retry_backoff(),
                    EngineEvent::Timer(TimerEvent::ResumeRetry { token }),
                );
                self.host.log_debug(&format!(
                    "other audio still active, retrying ({checks}/{})",
                    self.config.max_audio_checks()
                ));
            }
        } else {
            self.attempt = None;
            self.host.resume();
            self.intent = RecordingIntent::Recording;
            self.host.log_debug(&format!("resume issued by sequence {token}"));
            // Non-gating confirmation, purely diagnostic
            self.dispatcher.schedule(
                self.config.diagnostic_delay(),
                EngineEvent::Timer(TimerEvent::ResumeDiagnostic),
            );
        }
    }

    fn is_live(&self, token: AttemptToken) -> bool {
        self.attempt.as_ref().is_some_and(|a| a.token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockProbe {
        active: AtomicBool,
    }

    impl MockProbe {
        fn new(active: bool) -> Self {
            Self {
                active: AtomicBool::new(active),
            }
        }

        fn set_active(&self, active: bool) {
            self.active.store(active, Ordering::SeqCst);
        }
    }

    impl AudioActivityProbe for MockProbe {
        fn is_other_audio_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    /// Records scheduled events and issued queries so tests can replay
    /// them into the controller by hand, in any order they choose.
    #[derive(Default)]
    struct MockDispatcher {
        scheduled: Mutex<Vec<(Duration, EngineEvent)>>,
        queries: Mutex<Vec<QueryPurpose>>,
    }

    impl MockDispatcher {
        fn drain_scheduled(&self) -> Vec<EngineEvent> {
            self.scheduled
                .lock()
                .unwrap()
                .drain(..)
                .map(|(_, e)| e)
                .collect()
        }

        fn drain_queries(&self) -> Vec<QueryPurpose> {
            self.queries.lock().unwrap().drain(..).collect()
        }
    }

    impl Dispatcher for MockDispatcher {
        fn schedule(&self, delay: Duration, event: EngineEvent) {
            self.scheduled.lock().unwrap().push((delay, event));
        }

        fn query_recorder_state(&self, purpose: QueryPurpose) {
            self.queries.lock().unwrap().push(purpose);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Command {
        Pause,
        Resume,
    }

    #[derive(Default)]
    struct MockHost {
        commands: Mutex<Vec<Command>>,
        debug: Mutex<Vec<String>>,
    }

    impl MockHost {
        fn commands(&self) -> Vec<Command> {
            self.commands.lock().unwrap().clone()
        }

        fn debug_contains(&self, needle: &str) -> bool {
            self.debug.lock().unwrap().iter().any(|m| m.contains(needle))
        }
    }

    #[async_trait::async_trait]
    impl HostChannel for MockHost {
        fn pause(&self) {
            self.commands.lock().unwrap().push(Command::Pause);
        }

        fn resume(&self) {
            self.commands.lock().unwrap().push(Command::Resume);
        }

        async fn recorder_state(&self) -> RecorderState {
            RecorderState::Unknown
        }

        fn log_debug(&self, message: &str) {
            self.debug.lock().unwrap().push(message.to_string());
        }
    }

    struct Fixture {
        controller: ContinuityController,
        probe: Arc<MockProbe>,
        dispatcher: Arc<MockDispatcher>,
        host: Arc<MockHost>,
    }

    fn fixture(initial: RecorderState, audio_active: bool) -> Fixture {
        let probe = Arc::new(MockProbe::new(audio_active));
        let dispatcher = Arc::new(MockDispatcher::default());
        let host = Arc::new(MockHost::default());
        let controller = ContinuityController::new(
            ContinuityConfig::empty(),
            initial,
            probe.clone(),
            dispatcher.clone(),
            host.clone(),
        );
        Fixture {
            controller,
            probe,
            dispatcher,
            host,
        }
    }

    fn transition(old: CallActivity, new: CallActivity) -> Transition {
        Transition { old, new }
    }

    /// Replay everything the controller scheduled, plus answer its host
    /// queries with `reply`, until nothing is outstanding.
    fn drive_to_completion(f: &mut Fixture, reply: RecorderState) {
        loop {
            let scheduled = f.dispatcher.drain_scheduled();
            let queries = f.dispatcher.drain_queries();
            if scheduled.is_empty() && queries.is_empty() {
                break;
            }
            for event in scheduled {
                if let EngineEvent::Timer(timer) = event {
                    f.controller.on_timer(timer);
                }
            }
            for purpose in queries {
                f.controller.on_host_reply(purpose, reply);
            }
        }
    }

    #[test]
    fn pause_issued_once_on_connected() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Ringing));
        assert!(f.host.commands().is_empty());

        f.controller
            .on_activity_changed(transition(CallActivity::Ringing, CallActivity::Connected));
        assert_eq!(f.host.commands(), vec![Command::Pause]);
        assert_eq!(f.controller.intent(), RecordingIntent::Paused);
    }

    #[test]
    fn no_duplicate_pause_while_already_paused() {
        let mut f = fixture(RecorderState::Paused, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        assert!(f.host.commands().is_empty());
    }

    #[test]
    fn ringing_alone_never_pauses() {
        let mut f = fixture(RecorderState::Recording, false);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Ringing));
        f.controller
            .on_activity_changed(transition(CallActivity::Ringing, CallActivity::Idle));
        assert!(f.host.commands().is_empty());
        assert_eq!(f.controller.intent(), RecordingIntent::Recording);
    }

    #[test]
    fn resume_after_ended_with_quiet_audio() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));
        assert!(f.controller.resume_pending());

        drive_to_completion(&mut f, RecorderState::Paused);
        assert_eq!(f.host.commands(), vec![Command::Pause, Command::Resume]);
        assert_eq!(f.controller.intent(), RecordingIntent::Recording);
        assert!(f.host.debug_contains("post-resume recorder state"));
    }

    #[test]
    fn resume_abandoned_when_host_not_paused() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        drive_to_completion(&mut f, RecorderState::Recording);
        assert_eq!(f.host.commands(), vec![Command::Pause]);
        assert!(f.host.debug_contains("abandoning resume"));
    }

    #[test]
    fn resume_abandoned_on_unknown_host_state() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        // Query timed out: stay paused
        drive_to_completion(&mut f, RecorderState::Unknown);
        assert_eq!(f.host.commands(), vec![Command::Pause]);
        assert_eq!(f.controller.intent(), RecordingIntent::Paused);
    }

    #[test]
    fn retries_are_bounded_at_three_checks() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        // Audio stays active throughout
        drive_to_completion(&mut f, RecorderState::Paused);
        assert_eq!(f.host.commands(), vec![Command::Pause]);
        assert_eq!(f.controller.intent(), RecordingIntent::Paused);
        assert!(!f.controller.resume_pending());
        assert!(f.host.debug_contains("after 3 checks"));
    }

    #[test]
    fn connected_during_resume_cancels_it() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));
        assert!(f.controller.resume_pending());

        // A new call connects before the settle timer fires
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        assert!(!f.controller.resume_pending());

        // The stale settle timer fires anyway and must do nothing
        for event in f.dispatcher.drain_scheduled() {
            if let EngineEvent::Timer(timer) = event {
                f.controller.on_timer(timer);
            }
        }
        assert!(f.dispatcher.drain_queries().is_empty());
        assert_eq!(f.host.commands(), vec![Command::Pause]);
    }

    #[test]
    fn interruption_began_cancels_resume() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));
        assert!(f.controller.resume_pending());

        f.controller.on_interruption_changed(true);
        assert!(!f.controller.resume_pending());
        assert!(f.host.debug_contains("cancelled: interruption began"));
    }

    #[test]
    fn interruption_pauses_active_recording() {
        let mut f = fixture(RecorderState::Recording, false);
        f.controller.on_interruption_changed(true);
        assert_eq!(f.host.commands(), vec![Command::Pause]);
        assert_eq!(f.controller.intent(), RecordingIntent::Paused);
    }

    #[test]
    fn interruption_clearing_triggers_resume() {
        let mut f = fixture(RecorderState::Recording, false);
        f.controller.on_interruption_changed(true);
        f.controller.on_interruption_changed(false);
        assert!(f.controller.resume_pending());

        drive_to_completion(&mut f, RecorderState::Paused);
        assert_eq!(f.host.commands(), vec![Command::Pause, Command::Resume]);
    }

    #[test]
    fn stale_host_reply_is_dropped() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        // Fire the settle timer so the gate query goes out
        for event in f.dispatcher.drain_scheduled() {
            if let EngineEvent::Timer(timer) = event {
                f.controller.on_timer(timer);
            }
        }
        let queries = f.dispatcher.drain_queries();
        assert_eq!(queries.len(), 1);

        // The sequence is superseded before the reply lands
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.controller.on_host_reply(queries[0], RecorderState::Paused);

        assert!(f.host.debug_contains("dropping stale host reply"));
        assert_eq!(f.host.commands(), vec![Command::Pause]);
    }

    #[test]
    fn ended_does_not_resume_when_intent_is_recording() {
        // The voicemail path: never paused, so nothing to resume
        let mut f = fixture(RecorderState::Recording, false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));
        assert!(!f.controller.resume_pending());
        assert!(f.host.commands().is_empty());
    }

    #[test]
    fn second_ended_while_sequence_pending_is_ignored() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.probe.set_active(false);
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        // Only one sequence was ever started
        let started = f
            .host
            .debug
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.contains("started"))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn resume_succeeds_on_second_check() {
        let mut f = fixture(RecorderState::Recording, true);
        f.controller
            .on_activity_changed(transition(CallActivity::Idle, CallActivity::Connected));
        f.controller
            .on_activity_changed(transition(CallActivity::Connected, CallActivity::Ended));

        // First check sees active audio, second sees quiet
        for event in f.dispatcher.drain_scheduled() {
            if let EngineEvent::Timer(timer) = event {
                f.controller.on_timer(timer);
            }
        }
        for purpose in f.dispatcher.drain_queries() {
            f.controller.on_host_reply(purpose, RecorderState::Paused);
        }
        assert!(f.controller.resume_pending());

        f.probe.set_active(false);
        drive_to_completion(&mut f, RecorderState::Paused);
        assert_eq!(f.host.commands(), vec![Command::Pause, Command::Resume]);
    }
}
