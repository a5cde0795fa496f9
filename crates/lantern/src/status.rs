//! Status and timing reporting for presentation layers.
//!
//! The reporter mirrors orchestrator callbacks into a [`StatusSnapshot`]
//! published through a `tokio::sync::watch` channel, so hosts can either
//! poll ([`StatusReporter::snapshot`]) or subscribe
//! ([`StatusReporter::subscribe`]). A ticker refreshes the elapsed time and
//! the countdown to the next retry at a sub-second interval. The reporter
//! only reads state published by callbacks; it never feeds back into retry
//! decisions.

use crate::cancel::CancelToken;
use crate::classify::ClassifiedError;
use crate::retry::RetryEvent;
use crate::submit::{SubmitObserver, SubmitPhase};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Point-in-time view of a submission, cheap to clone and serialize.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Current stage
    pub phase: SubmitPhase,
    /// 1-based attempt currently running (0 before the first)
    pub attempt: u32,
    /// Time since the invocation began
    pub elapsed: Duration,
    /// Countdown until the next attempt, while waiting between retries
    pub next_retry_in: Option<Duration>,
    /// Most recent classified failure
    pub last_error: Option<ClassifiedError>,
}

impl StatusSnapshot {
    fn idle() -> Self {
        Self {
            phase: SubmitPhase::Idle,
            attempt: 0,
            elapsed: Duration::ZERO,
            next_retry_in: None,
            last_error: None,
        }
    }
}

/// Receiver half of the status channel; `changed().await` for push updates.
pub type StatusReceiver = watch::Receiver<StatusSnapshot>;

/// Translates [`SubmitObserver`] callbacks into published snapshots.
///
/// One reporter serves exactly one invocation: `elapsed` is measured from
/// construction, and a new invocation gets a fresh reporter rather than a
/// reset of this one.
pub struct StatusReporter {
    tx: watch::Sender<StatusSnapshot>,
    started_at: Instant,
    resume_at: Mutex<Option<Instant>>,
}

impl StatusReporter {
    /// Create a reporter whose clock starts now.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::idle());
        Self {
            tx,
            started_at: Instant::now(),
            resume_at: Mutex::new(None),
        }
    }

    /// Current snapshot (polling surface).
    pub fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe for push updates (subscription surface).
    pub fn subscribe(&self) -> StatusReceiver {
        self.tx.subscribe()
    }

    /// Recompute the time-derived fields and publish.
    pub fn refresh(&self) {
        let resume_at = *self.resume_at.lock().expect("status lock poisoned");
        let elapsed = self.started_at.elapsed();
        self.tx.send_modify(|snap| {
            snap.elapsed = elapsed;
            snap.next_retry_in = resume_at.map(|at| at.saturating_duration_since(Instant::now()));
        });
    }

    /// Refresh the snapshot every `every` until the submission reaches a
    /// terminal phase or the token is cancelled.
    pub async fn run_ticker(self: Arc<Self>, every: Duration, cancel: CancelToken) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.refresh();
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh();
                    if self.snapshot().phase.is_terminal() {
                        break;
                    }
                }
            }
        }
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitObserver for StatusReporter {
    fn on_phase(&self, phase: SubmitPhase) {
        if phase == SubmitPhase::Building {
            // A fresh pass through the sequence: the countdown is over.
            *self.resume_at.lock().expect("status lock poisoned") = None;
        }
        let elapsed = self.started_at.elapsed();
        self.tx.send_modify(|snap| {
            if phase == SubmitPhase::Building {
                snap.attempt += 1;
                snap.next_retry_in = None;
            }
            snap.phase = phase;
            snap.elapsed = elapsed;
        });
    }

    fn on_retry(&self, event: &RetryEvent) {
        *self.resume_at.lock().expect("status lock poisoned") = Some(Instant::now() + event.delay);
        let elapsed = self.started_at.elapsed();
        let delay = event.delay;
        self.tx.send_modify(|snap| {
            snap.next_retry_in = Some(delay);
            snap.elapsed = elapsed;
        });
    }

    fn on_error(&self, error: &ClassifiedError) {
        let error = error.clone();
        self.tx.send_modify(|snap| {
            snap.last_error = Some(error);
        });
    }
}
