//! Phased submission orchestration.
//!
//! Drives the fixed build → prove → submit sequence for one logical
//! operation, wrapping the whole sequence in the retry controller: a failure
//! in any phase restarts from `Building` on the next attempt. Phases are
//! never resumed partway; a proof is only valid for the transaction built
//! in the same attempt.

use crate::cancel::{CancelToken, Interrupted};
use crate::classify::{ClassifiedError, ErrorCode};
use crate::config::Config;
use crate::error::BoxError;
use crate::retry::{run_with_retry, RetryEvent, RetryOutcome, RetryPolicy};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::phases::Submission;

/// Stage of a submission, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitPhase {
    /// No attempt has started
    Idle,
    /// Assembling the transaction
    Building,
    /// Waiting for proof generation (the slow step)
    Proving,
    /// Sending the proven transaction to the network
    Submitting,
    /// Terminal: the network acknowledged the submission
    Succeeded,
    /// Terminal: a non-retryable failure, or the attempt budget ran out
    Failed,
    /// Terminal: cancellation was requested
    Cancelled,
}

impl SubmitPhase {
    /// Whether this phase accepts no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmitPhase::Succeeded | SubmitPhase::Failed | SubmitPhase::Cancelled
        )
    }

    /// Stable identifier used in logs and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitPhase::Idle => "idle",
            SubmitPhase::Building => "building",
            SubmitPhase::Proving => "proving",
            SubmitPhase::Submitting => "submitting",
            SubmitPhase::Succeeded => "succeeded",
            SubmitPhase::Failed => "failed",
            SubmitPhase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubmitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable progress of one orchestrator invocation.
///
/// Owned exclusively by that invocation; a new invocation constructs a fresh
/// state rather than sharing this one. Transitions are monotonic within an
/// attempt; [`reset_for_attempt`](Self::reset_for_attempt) is the only way
/// back to the start of the sequence, and terminal phases accept no further
/// transitions at all.
#[derive(Debug)]
pub struct SubmissionState {
    /// Current stage
    pub phase: SubmitPhase,
    /// 1-based attempt currently running (0 before the first)
    pub attempt: u32,
    /// Most recent classified failure
    pub last_error: Option<ClassifiedError>,
    /// When the invocation began
    pub started_at: Instant,
}

impl SubmissionState {
    pub fn new() -> Self {
        Self {
            phase: SubmitPhase::Idle,
            attempt: 0,
            last_error: None,
            started_at: Instant::now(),
        }
    }

    /// Advance to `next`. Returns false (and leaves the state untouched) if a
    /// terminal phase has already been reached.
    pub fn transition(&mut self, next: SubmitPhase) -> bool {
        if self.phase.is_terminal() {
            tracing::debug!(current = %self.phase, ignored = %next, "transition after terminal phase");
            return false;
        }
        self.phase = next;
        true
    }

    /// Start attempt `attempt` from the top of the phase sequence.
    pub fn reset_for_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
        self.phase = SubmitPhase::Idle;
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result of a phased submission.
#[derive(Debug)]
pub enum SubmitOutcome<R> {
    /// The network acknowledged the submission on try `attempts`
    Succeeded {
        receipt: R,
        attempts: u32,
        elapsed: Duration,
    },
    /// Terminal failure with display-ready message and suggestion
    Failed {
        error: ClassifiedError,
        attempts: u32,
        elapsed: Duration,
    },
    /// Cancellation was requested before completion
    Cancelled { attempts: u32, elapsed: Duration },
}

impl<R> SubmitOutcome<R> {
    /// Whether the submission succeeded.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded { .. })
    }

    /// The receipt, if any.
    pub fn receipt(self) -> Option<R> {
        match self {
            SubmitOutcome::Succeeded { receipt, .. } => Some(receipt),
            _ => None,
        }
    }

    /// How many attempts ran before the outcome was reached.
    pub fn attempts(&self) -> u32 {
        match self {
            SubmitOutcome::Succeeded { attempts, .. }
            | SubmitOutcome::Failed { attempts, .. }
            | SubmitOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }
}

/// Observer for submission progress.
///
/// Callbacks are delivered synchronously from the orchestrating task, in
/// order, to a single subscriber: a countdown started in `on_retry` is
/// guaranteed to begin before the corresponding delay does. Implementations
/// must not block; they exist so a presentation layer can mirror engine
/// state, never to drive retry decisions.
pub trait SubmitObserver: Send + Sync {
    /// A phase transition, including terminal ones.
    fn on_phase(&self, phase: SubmitPhase) {
        let _ = phase;
    }

    /// A retry was scheduled; fired before the backoff delay begins.
    fn on_retry(&self, event: &RetryEvent) {
        let _ = event;
    }

    /// A phase failure was classified (fires for terminal failures too).
    fn on_error(&self, error: &ClassifiedError) {
        let _ = error;
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SubmitObserver for NoopObserver {}

/// Deliver every callback to two observers, left first.
pub struct ObserverPair<A, B>(pub A, pub B);

impl<A: SubmitObserver, B: SubmitObserver> SubmitObserver for ObserverPair<A, B> {
    fn on_phase(&self, phase: SubmitPhase) {
        self.0.on_phase(phase);
        self.1.on_phase(phase);
    }

    fn on_retry(&self, event: &RetryEvent) {
        self.0.on_retry(event);
        self.1.on_retry(event);
    }

    fn on_error(&self, error: &ClassifiedError) {
        self.0.on_error(error);
        self.1.on_error(error);
    }
}

impl<T: SubmitObserver> SubmitObserver for std::sync::Arc<T> {
    fn on_phase(&self, phase: SubmitPhase) {
        self.as_ref().on_phase(phase);
    }

    fn on_retry(&self, event: &RetryEvent) {
        self.as_ref().on_retry(event);
    }

    fn on_error(&self, error: &ClassifiedError) {
        self.as_ref().on_error(error);
    }
}

/// Drives one submission through its phases under a retry policy.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    policy: RetryPolicy,
    proof_timeout: Duration,
}

impl Orchestrator {
    /// Build an orchestrator from engine configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            policy: config.retry.to_policy(),
            proof_timeout: config.submit.proof_timeout(),
        }
    }

    /// Replace the retry policy (e.g. to attach a retryability override).
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the proving-phase timeout.
    pub fn with_proof_timeout(mut self, timeout: Duration) -> Self {
        self.proof_timeout = timeout;
        self
    }

    /// Run the build → prove → submit sequence to a terminal outcome.
    ///
    /// One cancellation token spans all phases of all attempts. Cancellation
    /// is observed before each phase, during the proving race, and during the
    /// inter-retry delay; an in-flight phase future that loses the race is
    /// dropped, so its eventual result is discarded rather than surfaced.
    pub async fn run<S, O>(
        &self,
        submission: &S,
        cancel: &CancelToken,
        observer: &O,
    ) -> SubmitOutcome<S::Receipt>
    where
        S: Submission,
        O: SubmitObserver,
    {
        let state = Mutex::new(SubmissionState::new());
        let attempt_counter = AtomicU32::new(0);

        let outcome = run_with_retry(
            || {
                let attempt = attempt_counter.fetch_add(1, Ordering::SeqCst) + 1;
                state
                    .lock()
                    .expect("submission state lock poisoned")
                    .reset_for_attempt(attempt);
                tracing::debug!(attempt, "starting submission attempt");
                run_phases(submission, &state, observer, cancel, self.proof_timeout)
            },
            &self.policy,
            cancel,
            |event| {
                state
                    .lock()
                    .expect("submission state lock poisoned")
                    .last_error = Some(event.error.clone());
                observer.on_error(&event.error);
                observer.on_retry(event);
            },
        )
        .await;

        match outcome {
            RetryOutcome::Success {
                value,
                attempts,
                elapsed,
            } => {
                set_phase(&state, observer, SubmitPhase::Succeeded);
                tracing::info!(attempts, ?elapsed, "submission succeeded");
                SubmitOutcome::Succeeded {
                    receipt: value,
                    attempts,
                    elapsed,
                }
            }
            RetryOutcome::Failed {
                error,
                attempts,
                elapsed,
            } => {
                state
                    .lock()
                    .expect("submission state lock poisoned")
                    .last_error = Some(error.clone());
                observer.on_error(&error);
                set_phase(&state, observer, SubmitPhase::Failed);
                tracing::warn!(attempts, code = %error.code, "submission failed: {}", error.message);
                SubmitOutcome::Failed {
                    error,
                    attempts,
                    elapsed,
                }
            }
            RetryOutcome::Cancelled { attempts, elapsed } => {
                set_phase(&state, observer, SubmitPhase::Cancelled);
                tracing::info!(attempts, ?elapsed, "submission cancelled");
                SubmitOutcome::Cancelled { attempts, elapsed }
            }
        }
    }
}

/// Advance the state machine and notify the observer of the transition.
fn set_phase(
    state: &Mutex<SubmissionState>,
    observer: &impl SubmitObserver,
    phase: SubmitPhase,
) {
    let transitioned = state
        .lock()
        .expect("submission state lock poisoned")
        .transition(phase);
    if transitioned {
        observer.on_phase(phase);
    }
}

/// One pass through the phase sequence. Any error returned here is classified
/// by the retry controller; `Interrupted` marks a cancellation observed at a
/// checkpoint or suspension point.
async fn run_phases<S: Submission>(
    submission: &S,
    state: &Mutex<SubmissionState>,
    observer: &impl SubmitObserver,
    cancel: &CancelToken,
    proof_timeout: Duration,
) -> Result<S::Receipt, BoxError> {
    if cancel.is_cancelled() {
        return Err(Box::new(Interrupted));
    }
    set_phase(state, observer, SubmitPhase::Building);
    let payload = submission.build().await?;

    if cancel.is_cancelled() {
        return Err(Box::new(Interrupted));
    }
    set_phase(state, observer, SubmitPhase::Proving);
    let proof = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Box::new(Interrupted)),
        result = submission.prove(payload) => result?,
        _ = tokio::time::sleep(proof_timeout) => {
            return Err(Box::new(ClassifiedError::new(
                ErrorCode::Timeout,
                format!("proof generation timed out after {}ms", proof_timeout.as_millis()),
            )));
        }
    };

    if cancel.is_cancelled() {
        return Err(Box::new(Interrupted));
    }
    set_phase(state, observer, SubmitPhase::Submitting);
    let receipt = submission.submit(proof).await?;
    Ok(receipt)
}
