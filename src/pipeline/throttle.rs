//! Fixed-rate pause between documents.
//!
//! A leaky bucket of size one with a fixed refill: after each document the
//! orchestrator waits `interval` before starting the next. It does not look
//! at provider rate-limit headers.

use tokio::time::{sleep, Duration};

/// Inter-document pause.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait out the interval. Returns immediately when it is zero.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn zero_interval_returns_immediately() {
        let t = Throttle::from_millis(0);
        tokio_test::block_on(t.pause());
        assert!(t.interval().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_interval() {
        let t = Throttle::from_millis(500);
        let start = Instant::now();
        t.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
