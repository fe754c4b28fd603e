// src/fetch/rate_limit.rs
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Minimum-interval limiter shared by every outbound request.
///
/// `acquire` reserves the next send slot under the lock and sleeps outside
/// it, so concurrent callers serialize without holding the mutex across an
/// await point.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Default spacing between requests (the public APIs tolerate ~10 rps).
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait until this caller's reserved slot arrives.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().expect("rate limiter mutex poisoned");
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + self.min_interval;
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn acquires_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // First call fires immediately, the next two wait 100ms each.
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_limiter_does_not_accumulate_credit() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        // One immediate slot, then the usual spacing; no burst of banked slots.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
