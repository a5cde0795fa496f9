//! Cooperative cancellation primitives.
//!
//! Cancellation is observed at explicit checkpoints, never forced: most
//! remote operations (proof generation, network submission) offer no portable
//! abort hook, so an in-flight call is left to settle and its stale result is
//! discarded by the invocation that raced it.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Shared handle allowing one party to request early termination of an
/// in-progress operation.
///
/// Cloning yields another handle to the same token. `cancel` is idempotent:
/// calling it twice has no additional effect.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Create a fresh, untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any task, any number of times.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolve when cancellation is requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }

    /// Derive a child token: cancelled when either the parent is cancelled or
    /// the child itself is.
    pub fn child(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
        }
    }
}

/// How a cancellable wait resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// The full duration passed
    Elapsed,
    /// The token fired first
    Cancelled,
}

/// Sentinel error returned by a phase whose suspension point was aborted by
/// the cancellation token. The retry controller converts it into a cancelled
/// outcome instead of classifying it as a failure.
#[derive(Debug, Clone, Copy, Error)]
#[error("operation cancelled")]
pub struct Interrupted;

/// Suspend for `duration`, resolving early if `token` fires.
///
/// The underlying timer is dropped on every exit path, so an early
/// cancellation releases it immediately. Concurrent waits on independent
/// tokens do not interfere.
pub async fn sleep_cancellable(duration: Duration, token: &CancelToken) -> DelayOutcome {
    if token.is_cancelled() {
        return DelayOutcome::Cancelled;
    }
    if duration.is_zero() {
        return DelayOutcome::Elapsed;
    }

    tokio::select! {
        _ = token.cancelled() => DelayOutcome::Cancelled,
        _ = tokio::time::sleep(duration) => DelayOutcome::Elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delay_elapses_without_cancellation() {
        let token = CancelToken::new();
        let start = Instant::now();
        let outcome = sleep_cancellable(Duration::from_millis(20), &token).await;
        assert_eq!(outcome, DelayOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        let outcome = sleep_cancellable(Duration::from_secs(60), &token).await;
        assert_eq!(outcome, DelayOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_cancellation_mid_sleep() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            sleep_cancellable(Duration::from_secs(60), &waiter).await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, DelayOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        let outcome = sleep_cancellable(Duration::from_millis(10), &token).await;
        assert_eq!(outcome, DelayOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_zero_duration_elapses_even_without_waiting() {
        let token = CancelToken::new();
        let outcome = sleep_cancellable(Duration::ZERO, &token).await;
        assert_eq!(outcome, DelayOutcome::Elapsed);
    }

    #[tokio::test]
    async fn test_independent_tokens_do_not_interfere() {
        let a = CancelToken::new();
        let b = CancelToken::new();
        a.cancel();

        let outcome_b = sleep_cancellable(Duration::from_millis(10), &b).await;
        assert_eq!(outcome_b, DelayOutcome::Elapsed);
        let outcome_a = sleep_cancellable(Duration::from_millis(10), &a).await;
        assert_eq!(outcome_a, DelayOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_child_token_follows_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());

        // Cancelling a child never propagates upward.
        let parent2 = CancelToken::new();
        let child2 = parent2.child();
        child2.cancel();
        assert!(!parent2.is_cancelled());
    }
}
