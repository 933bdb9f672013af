//! Retry with exponential backoff for transient database failures.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// SQLSTATE codes worth another attempt: serialization failure, deadlock,
/// too many connections, admin shutdown.
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "53300", "57P01"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Run once, never retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are spent. `operation` names the call in log lines.
///
/// Each attempt must be self-contained: a transaction is retried by
/// re-running the closure that opens it.
pub async fn with_retry<F, Fut, T>(operation: &str, policy: RetryPolicy, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let backoff = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    operation,
                    attempt,
                    policy.max_attempts,
                    e,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Whether the root cause is a connection-level or contention failure.
pub fn is_transient(e: &anyhow::Error) -> bool {
    match e.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Io(_))
        | Some(sqlx::Error::PoolTimedOut)
        | Some(sqlx::Error::Tls(_)) => true,
        Some(sqlx::Error::Database(db)) => db
            .code()
            .map(|code| TRANSIENT_SQLSTATES.contains(&&*code))
            .unwrap_or(false),
        _ => false,
    }
}
