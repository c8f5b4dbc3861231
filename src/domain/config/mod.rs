//! Continuity timing configuration value object

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 2000;
const DEFAULT_MAX_AUDIO_CHECKS: u32 = 3;
const DEFAULT_CONNECT_RECHECK_MS: u64 = 500;
const DEFAULT_DIAGNOSTIC_DELAY_MS: u64 = 750;
const DEFAULT_HOST_QUERY_TIMEOUT_MS: u64 = 2000;

/// Timing and retry configuration for the continuity engine.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContinuityConfig {
    /// Settle delay before a resume sequence starts (ms)
    pub settle_delay_ms: Option<u64>,
    /// Backoff between audio-activity checks (ms)
    pub retry_backoff_ms: Option<u64>,
    /// Bound on audio-activity checks per resume sequence
    pub max_audio_checks: Option<u32>,
    /// Delay before the one deferred re-check of an unconfirmed connect (ms)
    pub connect_recheck_delay_ms: Option<u64>,
    /// Delay before the post-resume diagnostic query (ms)
    pub diagnostic_delay_ms: Option<u64>,
    /// Host state query timeout; a timeout reads as an unknown state (ms)
    pub host_query_timeout_ms: Option<u64>,
}

impl ContinuityConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            settle_delay_ms: Some(DEFAULT_SETTLE_DELAY_MS),
            retry_backoff_ms: Some(DEFAULT_RETRY_BACKOFF_MS),
            max_audio_checks: Some(DEFAULT_MAX_AUDIO_CHECKS),
            connect_recheck_delay_ms: Some(DEFAULT_CONNECT_RECHECK_MS),
            diagnostic_delay_ms: Some(DEFAULT_DIAGNOSTIC_DELAY_MS),
            host_query_timeout_ms: Some(DEFAULT_HOST_QUERY_TIMEOUT_MS),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            settle_delay_ms: other.settle_delay_ms.or(self.settle_delay_ms),
            retry_backoff_ms: other.retry_backoff_ms.or(self.retry_backoff_ms),
            max_audio_checks: other.max_audio_checks.or(self.max_audio_checks),
            connect_recheck_delay_ms: other
                .connect_recheck_delay_ms
                .or(self.connect_recheck_delay_ms),
            diagnostic_delay_ms: other.diagnostic_delay_ms.or(self.diagnostic_delay_ms),
            host_query_timeout_ms: other.host_query_timeout_ms.or(self.host_query_timeout_ms),
        }
    }

    /// Settle delay, or the default if not set
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS))
    }

    /// Retry backoff, or the default if not set
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS))
    }

    /// Audio-activity check bound, or the default if not set
    pub fn max_audio_checks(&self) -> u32 {
        self.max_audio_checks
            .unwrap_or(DEFAULT_MAX_AUDIO_CHECKS)
            .max(1)
    }

    /// Connect re-check delay, or the default if not set
    pub fn connect_recheck_delay(&self) -> Duration {
        Duration::from_millis(
            self.connect_recheck_delay_ms
                .unwrap_or(DEFAULT_CONNECT_RECHECK_MS),
        )
    }

    /// Diagnostic query delay, or the default if not set
    pub fn diagnostic_delay(&self) -> Duration {
        Duration::from_millis(self.diagnostic_delay_ms.unwrap_or(DEFAULT_DIAGNOSTIC_DELAY_MS))
    }

    /// Host query timeout, or the default if not set
    pub fn host_query_timeout(&self) -> Duration {
        Duration::from_millis(
            self.host_query_timeout_ms
                .unwrap_or(DEFAULT_HOST_QUERY_TIMEOUT_MS),
        )
    }
}
