//! Backoff computation for retry delays.
//!
//! Pure function of the attempt number and the policy: multiplicative growth
//! from `initial_delay`, capped at `max_delay`, with optional jitter to avoid
//! synchronized retry storms across independent callers.

use crate::retry::RetryPolicy;
use rand::Rng;
use std::time::Duration;

/// Compute the delay to wait before the retry that follows `attempt`.
///
/// `attempt` is 1-based: after the first failed try, `attempt = 1` and the
/// delay is `initial_delay` (pre-jitter). Each further attempt multiplies the
/// base by `backoff_factor`, clamped at `max_delay` before any jitter so that
/// large attempt numbers cannot overflow.
///
/// With `policy.jitter`, the base is scaled by a uniform random factor in
/// `[0.5, 1.5]` and floored to whole milliseconds.
pub fn compute_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    debug_assert!(attempt >= 1, "attempt numbers are 1-based");

    let initial_ms = policy.initial_delay.as_millis() as f64;
    let max_ms = policy.max_delay.as_millis() as f64;

    // f64 exponentiation saturates to +inf long before u64 arithmetic would
    // wrap; clamp non-finite and oversized results to the ceiling first.
    let exponent = attempt.saturating_sub(1);
    let grown = initial_ms * policy.backoff_factor.powi(exponent.min(i32::MAX as u32) as i32);
    let base_ms = if grown.is_finite() { grown.min(max_ms) } else { max_ms };

    let delay_ms = if policy.jitter {
        let factor = rand::thread_rng().gen_range(0.5..=1.5);
        (base_ms * factor).floor()
    } else {
        base_ms
    };

    Duration::from_millis(delay_ms as u64)
}
