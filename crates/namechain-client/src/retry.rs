//! Bounded retry for blocking external calls.
//!
//! Every network call in this crate goes through `retry_transient`: a fixed
//! number of attempts with linear backoff, then the last error is surfaced.
//! Nothing retries indefinitely, and only transient (connection) errors are
//! retried at all.

use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult};

/// Attempt count and linear backoff step.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts: attempts.max(1), backoff }
    }

    /// No sleeping; used by tests.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self::new(cfg.attempts, Duration::from_millis(cfg.backoff_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `op`, retrying transient failures up to the policy's attempt count
/// with linear backoff (`backoff * attempt` between tries). Non-transient
/// errors return immediately.
pub fn retry_transient<T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> ClientResult<T>,
{
    let mut last = None;
    for attempt in 1..=policy.attempts {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() => {
                warn!(what, attempt, error = %e, "transient failure");
                if attempt < policy.attempts {
                    std::thread::sleep(policy.backoff * attempt);
                }
                last = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last.unwrap_or_else(|| ClientError::Fatal(format!("{what}: retry loop ran zero attempts"))))
}
