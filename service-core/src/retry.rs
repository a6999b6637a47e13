//! Bounded retry with exponential backoff for outbound HTTP calls.
//!
//! A call is driven by a small state machine. Each attempt produces a
//! [`Decision`] from a caller-supplied classifier; [`RetryState::step`] folds
//! that decision into the next state. The async driver [`run_with_retry`]
//! only adds sleeping and logging on top of the pure transition.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit; the wait before a retry is `2^prior_attempts * base_delay`.
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to every wait.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Create a config with a single attempt and no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Deterministic part of the wait before the next attempt.
    ///
    /// `prior_attempts` is the 1-based count of attempts already made.
    pub fn base_backoff(&self, prior_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(prior_attempts);
        self.base_delay.saturating_mul(factor)
    }

    /// Full wait before the next attempt: exponential base plus jitter.
    pub fn backoff_duration(&self, prior_attempts: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };

        self.base_backoff(prior_attempts) + Duration::from_millis(jitter)
    }
}

/// Coarse classification of an HTTP status code for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx.
    Success,
    /// Client errors other than 429; retrying will not help.
    Permanent,
    /// 5xx and 429.
    Transient,
}

/// Classify an HTTP status code.
pub fn classify_http_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::Transient,
        s if s >= 500 => StatusClass::Transient,
        _ => StatusClass::Permanent,
    }
}

/// Verdict on a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T, E> {
    /// Stop with a result.
    StopSuccess(T),
    /// Stop with an error that must not be retried.
    StopFail(E),
    /// Record the error and try again if the budget allows.
    Retry(E),
}

/// State of a retried call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState<T, E> {
    /// `attempt` is the 1-based number of the attempt about to be made.
    Attempting { attempt: u32, last_error: Option<E> },
    Success(T),
    Failed(E),
    Exhausted { attempts: u32, last_error: E },
}

impl<T, E> RetryState<T, E> {
    pub fn start() -> Self {
        RetryState::Attempting {
            attempt: 1,
            last_error: None,
        }
    }

    /// Apply the decision for the attempt that was just made.
    ///
    /// Terminal states are returned unchanged.
    pub fn step(self, decision: Decision<T, E>, max_attempts: u32) -> Self {
        let attempt = match self {
            RetryState::Attempting { attempt, .. } => attempt,
            terminal => return terminal,
        };

        match decision {
            Decision::StopSuccess(value) => RetryState::Success(value),
            Decision::StopFail(err) => RetryState::Failed(err),
            Decision::Retry(err) if attempt >= max_attempts => RetryState::Exhausted {
                attempts: attempt,
                last_error: err,
            },
            Decision::Retry(err) => RetryState::Attempting {
                attempt: attempt + 1,
                last_error: Some(err),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting { .. })
    }
}

/// Terminal result of [`run_with_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Success(T),
    Failed(E),
    Exhausted { attempts: u32, last_error: E },
}

/// Drive `attempt_fn` through the retry state machine.
///
/// `attempt_fn` receives the 1-based attempt number and returns the classified
/// verdict for that attempt.
pub async fn run_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut attempt_fn: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Decision<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut state = RetryState::start();
    let mut attempts_made = 0;

    loop {
        state = match state {
            RetryState::Attempting {
                attempt,
                last_error,
            } => {
                if let Some(err) = &last_error {
                    let backoff = config.backoff_duration(attempt - 1);
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "Call failed, retrying after backoff"
                    );
                    sleep(backoff).await;
                }

                attempts_made = attempt;
                let decision = attempt_fn(attempt).await;
                RetryState::Attempting {
                    attempt,
                    last_error,
                }
                .step(decision, max_attempts)
            }
            RetryState::Success(value) => {
                if attempts_made > 1 {
                    info!(
                        operation = operation_name,
                        attempt = attempts_made,
                        "Call succeeded after retry"
                    );
                }
                return RetryOutcome::Success(value);
            }
            RetryState::Failed(err) => {
                warn!(
                    operation = operation_name,
                    error = %err,
                    "Call failed with permanent error, not retrying"
                );
                return RetryOutcome::Failed(err);
            }
            RetryState::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(
                    operation = operation_name,
                    attempts,
                    error = %last_error,
                    "Call failed after max attempts"
                );
                return RetryOutcome::Exhausted {
                    attempts,
                    last_error,
                };
            }
        };
    }
}
