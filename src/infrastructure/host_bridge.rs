//! Channel-backed host bridge
//!
//! In-process rendering of the host notification channel: commands flow
//! out on an unbounded channel, state queries are oneshot request/reply.
//! The host side holds the `HostEndpoint` and answers at its own pace; a
//! reply that misses the timeout reads as an unknown state.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::application::ports::HostChannel;
use crate::domain::recording::RecorderState;

/// A command or debug line sent to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "command", content = "message")]
pub enum HostCommand {
    Pause,
    Resume,
    Debug(String),
}

/// One recorder-state query awaiting its reply
#[derive(Debug)]
pub struct StateQuery {
    pub reply: oneshot::Sender<RecorderState>,
}

/// Host side of the bridge
pub struct HostEndpoint {
    pub commands: mpsc::UnboundedReceiver<HostCommand>,
    pub queries: mpsc::UnboundedReceiver<StateQuery>,
}

/// Controller side of the bridge
pub struct MpscHostChannel {
    commands: mpsc::UnboundedSender<HostCommand>,
    queries: mpsc::UnboundedSender<StateQuery>,
    query_timeout: Duration,
}

impl MpscHostChannel {
    /// Create both ends of the bridge
    pub fn new(query_timeout: Duration) -> (Self, HostEndpoint) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (query_tx, query_rx) = mpsc::unbounded_channel();
        (
            Self {
                commands: command_tx,
                queries: query_tx,
                query_timeout,
            },
            HostEndpoint {
                commands: command_rx,
                queries: query_rx,
            },
        )
    }
}

#[async_trait]
impl HostChannel for MpscHostChannel {
    fn pause(&self) {
        let _ = self.commands.send(HostCommand::Pause);
    }

    fn resume(&self) {
        let _ = self.commands.send(HostCommand::Resume);
    }

    async fn recorder_state(&self) -> RecorderState {
        let (tx, rx) = oneshot::channel();
        if self.queries.send(StateQuery { reply: tx }).is_err() {
            return RecorderState::Unknown;
        }
        match timeout(self.query_timeout, rx).await {
            Ok(Ok(state)) => state,
            // Timed out or the host dropped the query
            _ => RecorderState::Unknown,
        }
    }

    fn log_debug(&self, message: &str) {
        let _ = self.commands.send(HostCommand::Debug(message.to_string()));
    }
}
