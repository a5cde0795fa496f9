//! Retry controller: repeated invocation of a fallible asynchronous
//! operation with classification, exponential backoff, and cooperative
//! cancellation.
//!
//! All failure paths come back as [`RetryOutcome`] variants; this boundary
//! never panics and never propagates an `Err`. Cancellation is checked before
//! each attempt and during the inter-retry delay, and is reported as a
//! distinct outcome so callers can avoid rendering it as an error.

use crate::backoff;
use crate::cancel::{sleep_cancellable, CancelToken, DelayOutcome, Interrupted};
use crate::classify::{classify, ClassifiedError};
use crate::error::{BoxError, ConfigError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Caller-supplied override for the retry decision.
pub type RetryPredicate = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

/// Immutable retry configuration for one logical operation.
///
/// Constructed once per invocation; the controller never mutates it. Policies
/// built by hand (rather than through [`Config`](crate::config::Config))
/// should be checked with [`validate`](RetryPolicy::validate) before use.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retry attempts after the first try (total tries = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on the computed delay
    pub max_delay: Duration,
    /// Multiplicative growth per attempt (>= 1)
    pub backoff_factor: f64,
    /// Randomize each delay within [0.5x, 1.5x]
    pub jitter: bool,
    /// Overrides the classified error's retryable flag when set
    pub retry_on: Option<RetryPredicate>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            jitter: true,
            retry_on: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("jitter", &self.jitter)
            .field("retry_on", &self.retry_on.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl RetryPolicy {
    /// Replace the retry decision with a caller-supplied predicate.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ClassifiedError) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Some(Arc::new(predicate));
        self
    }

    /// Check the policy's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay.is_zero() {
            return Err(ConfigError::ValidationError(
                "retry.initial_delay must be > 0".into(),
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(ConfigError::ValidationError(
                "retry.max_delay must be >= retry.initial_delay".into(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_factor must be a finite value >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Total tries allowed, including the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Retry decision for a classified failure.
    pub fn should_retry(&self, error: &ClassifiedError) -> bool {
        match &self.retry_on {
            Some(predicate) => predicate(error),
            None => error.retryable,
        }
    }
}

/// One try of the operation, created when the attempt starts and folded into
/// the outcome's aggregate once it resolves.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,
    /// When this try began
    pub started_at: Instant,
    /// Classified failure, if the try failed
    pub error: Option<ClassifiedError>,
    /// Backoff delay scheduled after this try, if a retry follows
    pub delay_before_next: Option<Duration>,
}

impl AttemptRecord {
    fn begin(attempt: u32) -> Self {
        Self {
            attempt,
            started_at: Instant::now(),
            error: None,
            delay_before_next: None,
        }
    }
}

/// Notification fired synchronously before each inter-retry delay begins, so
/// a presentation layer's countdown always starts at the full delay.
#[derive(Debug, Clone)]
pub struct RetryEvent {
    /// The attempt that just failed (1-based)
    pub attempt: u32,
    /// Its classified failure
    pub error: ClassifiedError,
    /// Delay before the next attempt
    pub delay: Duration,
    /// Time since the invocation began
    pub elapsed: Duration,
}

/// Terminal result of a retried invocation.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded on try `attempts`
    Success {
        value: T,
        attempts: u32,
        elapsed: Duration,
    },
    /// Terminal failure: non-retryable, or the attempt budget ran out
    Failed {
        error: ClassifiedError,
        attempts: u32,
        elapsed: Duration,
    },
    /// Cancellation was requested before completion
    Cancelled { attempts: u32, elapsed: Duration },
}

impl<T> RetryOutcome<T> {
    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    /// The success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            RetryOutcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// How many tries ran before the outcome was reached.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. }
            | RetryOutcome::Failed { attempts, .. }
            | RetryOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }
}

/// Drive `operation` to completion under `policy`.
///
/// The operation is invoked up to `max_retries + 1` times, strictly
/// sequentially. On failure the error is classified; a non-retryable
/// classification (or an exhausted budget) returns immediately with no
/// further delay. `on_retry` fires synchronously before each backoff wait.
///
/// The controller does not deduplicate side effects of a re-invoked
/// operation; an operation that submits to a network must guard against
/// duplicates itself (e.g. with a stable identifier).
pub async fn run_with_retry<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut on_retry: impl FnMut(&RetryEvent),
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let start = Instant::now();
    let total = policy.total_attempts();
    let mut attempt: u32 = 1;

    loop {
        // Checkpoint: before invoking the operation.
        if cancel.is_cancelled() {
            return RetryOutcome::Cancelled {
                attempts: attempt - 1,
                elapsed: start.elapsed(),
            };
        }

        let mut record = AttemptRecord::begin(attempt);

        match operation().await {
            Ok(value) => {
                tracing::debug!(attempt, elapsed = ?start.elapsed(), "operation succeeded");
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                    elapsed: start.elapsed(),
                };
            }
            Err(raw) => {
                let raw: BoxError = raw.into();

                // A phase that observed the token mid-suspension reports
                // Interrupted; fold it into the cancelled outcome rather than
                // classifying it as a failure.
                if cancel.is_cancelled() || raw.downcast_ref::<Interrupted>().is_some() {
                    return RetryOutcome::Cancelled {
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                let error = classify(&raw);
                record.error = Some(error.clone());

                let out_of_attempts = attempt >= total;
                if out_of_attempts || !policy.should_retry(&error) {
                    tracing::warn!(
                        attempt,
                        code = %error.code,
                        retryable = error.retryable,
                        "giving up: {}",
                        error.message
                    );
                    return RetryOutcome::Failed {
                        error,
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                let delay = backoff::compute_delay(attempt, policy);
                record.delay_before_next = Some(delay);
                tracing::debug!(
                    attempt,
                    code = %error.code,
                    ?delay,
                    attempt_took = ?record.started_at.elapsed(),
                    "transient failure, retrying"
                );

                // Fired before the wait begins so a countdown starts at the
                // full delay.
                on_retry(&RetryEvent {
                    attempt,
                    error,
                    delay,
                    elapsed: start.elapsed(),
                });

                if sleep_cancellable(delay, cancel).await == DelayOutcome::Cancelled {
                    return RetryOutcome::Cancelled {
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                attempt += 1;
            }
        }
    }
}
