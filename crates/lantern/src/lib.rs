//! Lantern - resilient submission engine for proof-backed transactions.
//!
//! Lantern drives a multi-phase, slow and fallible remote operation (build a
//! transaction, generate its proof, submit it to the network) through to
//! completion, with automatic retry, timeout, cooperative cancellation, and
//! caller-visible status reporting.
//!
//! # Architecture
//!
//! ```text
//! caller → Engine → Orchestrator → retry loop → (backoff, classify, cancellable delay)
//!                         │
//!                         └── status callbacks → StatusReporter → presentation layer
//! ```
//!
//! The phases themselves are caller-supplied opaque async functions; the
//! engine imposes no contract on their internals beyond "each eventually
//! settles or the proving timeout fires". Phase failures are classified into
//! a closed taxonomy that decides retryability and carries display-ready
//! text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lantern::{Config, Engine, SubmissionFns};
//!
//! #[tokio::main]
//! async fn main() -> lantern::Result<()> {
//!     let engine = Engine::new(Config::load()?)?;
//!
//!     let handle = engine.submit(SubmissionFns::new(build_tx, prove_tx, send_tx));
//!     println!("phase: {}", handle.status().phase);
//!     match handle.join().await {
//!         lantern::SubmitOutcome::Succeeded { receipt, .. } => println!("done: {receipt:?}"),
//!         lantern::SubmitOutcome::Failed { error, .. } => eprintln!("{}: {}", error.message, error.suggestion),
//!         lantern::SubmitOutcome::Cancelled { .. } => {}
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod backoff;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod status;
pub mod submit;

// Re-exports for convenient access
pub use cancel::{sleep_cancellable, CancelToken, DelayOutcome};
pub use classify::{classify, classify_message, ClassifiedError, ErrorCode};
pub use config::Config;
pub use error::{BoxError, ConfigError, LanternError, Result};
pub use retry::{run_with_retry, RetryEvent, RetryOutcome, RetryPolicy};
pub use status::{StatusReceiver, StatusReporter, StatusSnapshot};
pub use submit::{
    NoopObserver, ObserverPair, Orchestrator, Submission, SubmissionFns, SubmitObserver,
    SubmitOutcome, SubmitPhase,
};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One in-flight submission registered with the engine.
struct ActiveSubmission {
    generation: u64,
    cancel: CancelToken,
}

/// The submission engine - the main entry point.
///
/// Constructed once by the composition root with validated configuration and
/// shared by reference; there is no process-wide singleton. The engine tracks
/// at most one active submission: starting a new one cancels and replaces the
/// previous invocation rather than queueing behind it.
pub struct Engine {
    config: Config,
    active: Arc<Mutex<Option<ActiveSubmission>>>,
    generation: AtomicU64,
}

impl Engine {
    /// Create an engine with the given configuration.
    ///
    /// This is where malformed configuration surfaces, synchronously, before
    /// any attempt runs.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!("Initializing Lantern v{}", VERSION);
        Ok(Self {
            config,
            active: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        })
    }

    /// Create an engine with configuration from the default location.
    pub fn with_defaults() -> std::result::Result<Self, ConfigError> {
        Self::new(Config::load()?)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retry a standalone operation under the configured policy.
    ///
    /// Usable without the phased orchestrator; the caller's token is the
    /// cancellation handle. For a custom policy or an `on_retry` callback,
    /// use [`retry::run_with_retry`] directly.
    pub async fn run_with_retry<F, Fut, T, E>(
        &self,
        operation: F,
        cancel: &CancelToken,
    ) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        retry::run_with_retry(operation, &self.config.retry.to_policy(), cancel, |_| {}).await
    }

    /// Start a phased submission. Must be called within a Tokio runtime.
    ///
    /// Any previously active submission is cancelled and replaced; its handle
    /// resolves to a cancelled outcome.
    pub fn submit<S>(&self, submission: S) -> SubmissionHandle<S::Receipt>
    where
        S: Submission + 'static,
        S::Receipt: 'static,
    {
        self.submit_observed(submission, NoopObserver)
    }

    /// Start a phased submission with an additional observer for push
    /// callbacks (`on_phase` / `on_error` / `on_retry`).
    pub fn submit_observed<S, O>(&self, submission: S, observer: O) -> SubmissionHandle<S::Receipt>
    where
        S: Submission + 'static,
        S::Receipt: 'static,
        O: SubmitObserver + 'static,
    {
        let cancel = CancelToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut active = self.active.lock().expect("active-submission lock poisoned");
            if let Some(previous) = active.take() {
                tracing::debug!(
                    superseded = previous.generation,
                    by = generation,
                    "replacing active submission"
                );
                previous.cancel.cancel();
            }
            *active = Some(ActiveSubmission {
                generation,
                cancel: cancel.clone(),
            });
        }

        let reporter = Arc::new(StatusReporter::new());
        tokio::spawn(reporter.clone().run_ticker(
            self.config.status.tick_interval(),
            cancel.clone(),
        ));

        let orchestrator = Orchestrator::new(&self.config);
        let slot = self.active.clone();
        let task_cancel = cancel.clone();
        let task_reporter = reporter.clone();
        let task = tokio::spawn(async move {
            let observers = ObserverPair(task_reporter, observer);
            let outcome = orchestrator.run(&submission, &task_cancel, &observers).await;

            // Free the active slot only if this invocation still owns it; a
            // stale completion must not clobber a newer invocation.
            let mut active = slot.lock().expect("active-submission lock poisoned");
            if active.as_ref().map(|a| a.generation) == Some(generation) {
                *active = None;
            }

            outcome
        });

        SubmissionHandle {
            cancel,
            reporter,
            task,
        }
    }

    /// Cancel the currently active submission, if any. Idempotent.
    pub fn cancel_active(&self) {
        if let Some(active) = self
            .active
            .lock()
            .expect("active-submission lock poisoned")
            .as_ref()
        {
            active.cancel.cancel();
        }
    }

    /// Whether a submission is currently in flight.
    pub fn has_active(&self) -> bool {
        self.active
            .lock()
            .expect("active-submission lock poisoned")
            .is_some()
    }
}

/// Handle to an in-flight submission.
///
/// Carries the invocation's cancellation handle and its status surface; the
/// terminal outcome is obtained with [`join`](Self::join).
pub struct SubmissionHandle<R> {
    cancel: CancelToken,
    reporter: Arc<StatusReporter>,
    task: JoinHandle<SubmitOutcome<R>>,
}

impl<R> SubmissionHandle<R> {
    /// Request cancellation. Idempotent: calling it twice has no additional
    /// effect.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current status snapshot (polling surface).
    pub fn status(&self) -> StatusSnapshot {
        self.reporter.snapshot()
    }

    /// Subscribe to status updates (push surface).
    pub fn watch(&self) -> StatusReceiver {
        self.reporter.subscribe()
    }

    /// Await the terminal outcome.
    ///
    /// A panicked submission task is surfaced as a classified failure rather
    /// than propagating the panic across the engine boundary.
    pub async fn join(self) -> SubmitOutcome<R> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => SubmitOutcome::Failed {
                error: ClassifiedError::new(
                    ErrorCode::Unknown,
                    format!("submission task did not complete: {e}"),
                ),
                attempts: 0,
                elapsed: Duration::ZERO,
            },
        }
    }
}
