//! Bounded retry around the request → parse step.
//!
//! Model calls fail transiently (quota, 5xx, timeouts) and models sometimes
//! answer with prose instead of JSON. Both count as a failed attempt. The
//! default policy makes at most 3 attempts with a fixed 1 s delay after
//! each failure; [`Backoff::Exponential`] is available for providers that need more
//! breathing room under load.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Delay after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed { ms: u64 },
    /// `base_ms * 2^(n-1)` before retry `n`: 500 ms → 1 s → 2 s …
    Exponential { base_ms: u64 },
}

impl Backoff {
    /// Delay to wait after the `failed`-th consecutive failure (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        match *self {
            Backoff::Fixed { ms } => Duration::from_millis(ms),
            Backoff::Exponential { base_ms } => {
                let shift = failed.saturating_sub(1).min(16);
                Duration::from_millis(base_ms.saturating_mul(1u64 << shift))
            }
        }
    }
}

/// Attempt budget plus backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 3.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed { ms: 1000 },
        }
    }
}

/// Result of a retried operation plus how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `op` until it succeeds or the attempt budget is spent.
///
/// `op` receives the 1-based attempt number. `on_failure` is told about each
/// failed attempt before its backoff. Every failure is followed by the
/// backoff delay, the final one included, so a caller moving on to the next
/// request after exhaustion still leaves the provider a full gap.
/// On exhaustion the last error is returned.
pub async fn retry<T, E, F, Fut, L>(policy: &RetryPolicy, mut op: F, mut on_failure: L) -> Attempted<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E),
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) => {
                on_failure(attempt, &e);
                let delay = policy.backoff.delay_after(attempt);
                debug!("attempt {}/{} failed, waiting {:?}", attempt, max, delay);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                if attempt >= max {
                    return Attempted {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Backoff::Fixed { ms: 0 },
        }
    }

    #[test]
    fn exponential_backoff_doubles() {
        let b = Backoff::Exponential { base_ms: 500 };
        assert_eq!(b.delay_after(1), Duration::from_millis(500));
        assert_eq!(b.delay_after(2), Duration::from_millis(1000));
        assert_eq!(b.delay_after(3), Duration::from_millis(2000));
        assert_eq!(Backoff::Fixed { ms: 1000 }.delay_after(7), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_in_three_attempts() {
        let calls = Cell::new(0u32);
        let out = retry(
            &no_delay(3),
            |n| {
                calls.set(calls.get() + 1);
                async move {
                    if n < 3 {
                        Err("junk")
                    } else {
                        Ok(n)
                    }
                }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(out.result, Ok(3));
        assert_eq!(out.attempts, 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn always_failing_stops_at_budget() {
        let failures = Cell::new(Vec::new());
        let out: Attempted<(), String> = retry(
            &no_delay(3),
            |n| async move { Err(format!("fail {n}")) },
            |n, e: &String| {
                let mut v = failures.take();
                v.push((n, e.clone()));
                failures.set(v);
            },
        )
        .await;

        assert_eq!(out.attempts, 3);
        assert_eq!(out.result.unwrap_err(), "fail 3");
        assert_eq!(failures.take().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_backoff_follows_every_failure() {
        let start = Instant::now();
        let out: Attempted<(), &str> = retry(
            &RetryPolicy::default(),
            |_| async { Err("down") },
            |_, _| {},
        )
        .await;

        assert_eq!(out.attempts, 3);
        // One 1 s delay per failure, the last one included.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_failure_waits_only_for_the_failure() {
        let start = Instant::now();
        let out = retry(
            &RetryPolicy::default(),
            |n| async move { if n == 1 { Err("busy") } else { Ok(n) } },
            |_, _| {},
        )
        .await;

        assert_eq!(out.result, Ok(2));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    }

    #[tokio::test]
    async fn zero_budget_still_tries_once() {
        let out = retry(&no_delay(0), |_| async { Ok::<_, ()>("ok") }, |_, _| {}).await;
        assert_eq!(out.attempts, 1);
    }
}
