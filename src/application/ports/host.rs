//! Host notification channel port

use async_trait::async_trait;

use crate::domain::recording::RecorderState;

/// Bidirectional channel to the host application that owns the recorder.
///
/// Commands are fire-and-forget. The state query is asynchronous and may
/// time out; implementations surface a timeout as `RecorderState::Unknown`
/// rather than an error. The debug sink is best-effort and never affects
/// control flow.
#[async_trait]
pub trait HostChannel: Send + Sync {
    /// Ask the host to pause the recording
    fn pause(&self);

    /// Ask the host to resume the recording
    fn resume(&self);

    /// Query the ground-truth recorder state
    async fn recorder_state(&self) -> RecorderState;

    /// Non-blocking diagnostic sink
    fn log_debug(&self, message: &str);
}
