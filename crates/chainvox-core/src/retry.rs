//! ============================================================================
//! Retry Logic - Bounded Exponential Backoff for Read-Only Calls
//! ============================================================================
//! Chain reads and chat completions share one policy:
//! - Exponential backoff with jitter, capped at a maximum delay
//! - Error classification (retryable vs permanent)
//! - Rate limiting backs off with the maximum delay
//! - A hard attempt bound, so the voice pipeline never stalls on retries
//! ============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::types::{ChainError, LmError};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries (multiplied by 2^attempt)
    pub base_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 400,
            max_delay_ms: 4000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    /// Error is likely transient, should retry
    Retryable,
    /// Error is permanent, don't retry
    Permanent,
    /// Rate limited, back off more aggressively
    RateLimited,
}

/// Errors that know how they should be retried
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for ChainError {
    fn kind(&self) -> ErrorKind {
        match self {
            ChainError::RateLimited => ErrorKind::RateLimited,
            ChainError::NetworkFailure(msg) => classify_message(msg),
            ChainError::InvalidAddress(_) | ChainError::Malformed(_) => ErrorKind::Permanent,
        }
    }
}

impl Classify for LmError {
    fn kind(&self) -> ErrorKind {
        match self {
            LmError::RateLimited => ErrorKind::RateLimited,
            LmError::Unavailable(msg) => classify_message(msg),
            LmError::MalformedResponse(_) => ErrorKind::Permanent,
        }
    }
}

/// Classify a transport error message
pub fn classify_message(error: &str) -> ErrorKind {
    let lower = error.to_lowercase();

    if lower.contains("rate limit") || lower.contains("too many requests") || lower.contains("429") {
        return ErrorKind::RateLimited;
    }

    // Credentials and request shape won't fix themselves
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid api key")
        || lower.contains("no api key")
        || lower.contains("400 bad request")
        || lower.contains("invalid params")
    {
        return ErrorKind::Permanent;
    }

    ErrorKind::Retryable
}

/// Calculate delay with exponential backoff and optional jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt.min(63));
    let base_delay = config.base_delay_ms.saturating_mul(multiplier);
    let capped_delay = base_delay.min(config.max_delay_ms);

    let final_delay = if config.jitter {
        // Add random jitter (0-50% of delay)
        let jitter_factor = 1.0 + rand::thread_rng().gen_range(0.0..0.5);
        (capped_delay as f64 * jitter_factor) as u64
    } else {
        capped_delay
    };

    Duration::from_millis(final_delay)
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
/// The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, E>
where
    E: Classify + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", label, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                let kind = e.kind();
                attempt += 1;

                if kind == ErrorKind::Permanent || attempt >= max_attempts {
                    warn!("{} failed ({:?}, attempt {}): {}", label, kind, attempt, e);
                    return Err(e);
                }

                let delay = match kind {
                    ErrorKind::RateLimited => Duration::from_millis(config.max_delay_ms),
                    _ => calculate_delay(attempt - 1, config),
                };
                warn!(
                    "{} attempt {} failed ({:?}): {} - retrying in {:?}",
                    label, attempt, kind, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}
