//! Retry policy and per-attempt outcome classification.

use std::time::Duration;

use super::transport::{RawResponse, TransportError};

/// Maximum number of attempts per call, the first one included.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Status reported when the budget runs out without any response.
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Fixed-delay, bounded retry policy. The budget is shared by every kind of
/// transient failure within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, Duration::from_millis(RETRY_DELAY_MS))
    }
}

/// What a single attempt means for the retry loop.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Status 200.
    Success(Vec<u8>),
    /// Timeout (no status) or 504; eligible for another attempt.
    Transient { status: Option<u16>, body: Vec<u8> },
    /// Any other status; ends the loop.
    Terminal { status: u16, body: Vec<u8> },
    /// No response and not a timeout; ends the call without a status.
    Failed(TransportError),
}

impl AttemptOutcome {
    pub fn classify(result: Result<RawResponse, TransportError>) -> Self {
        match result {
            Ok(RawResponse { status: 200, body }) => AttemptOutcome::Success(body),
            Ok(RawResponse {
                status: GATEWAY_TIMEOUT,
                body,
            }) => AttemptOutcome::Transient {
                status: Some(GATEWAY_TIMEOUT),
                body,
            },
            Ok(RawResponse { status, body }) => AttemptOutcome::Terminal { status, body },
            Err(TransportError::Timeout) => AttemptOutcome::Transient {
                status: None,
                body: Vec::new(),
            },
            Err(e) => AttemptOutcome::Failed(e),
        }
    }
}
