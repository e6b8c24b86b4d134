use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared request budget for one upstream provider.
///
/// Concurrent fetches wait for a cell instead of failing.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<DirectRateLimiter>,
    quota_limit: u32,
    quota_window: Duration,
}

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            quota_limit: quota_limit.max(1),
            quota_window,
        }
    }

    /// Yahoo tolerates roughly a hundred calls a minute from one client.
    pub fn yahoo_default() -> Self {
        Self::new(Duration::from_secs(60), 100)
    }

    /// Returns immediately when budget is available.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until a request cell is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub const fn quota_limit(&self) -> u32 {
        self.quota_limit
    }

    pub const fn quota_window(&self) -> Duration {
        self.quota_window
    }
}

impl std::fmt::Debug for ThrottlingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottlingQueue")
            .field("quota_limit", &self.quota_limit)
            .field("quota_window", &self.quota_window)
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_capped_at_quota_limit() {
        let queue = ThrottlingQueue::new(Duration::from_secs(60), 2);
        assert_eq!(queue.quota_window(), Duration::from_secs(60));

        assert!(queue.try_acquire());
        assert!(queue.try_acquire());
        assert!(!queue.try_acquire());
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let queue = ThrottlingQueue::new(Duration::from_secs(60), 0);
        assert_eq!(queue.quota_limit(), 1);
        assert!(queue.try_acquire());
    }

    #[tokio::test]
    async fn acquire_waits_for_the_next_cell() {
        let queue = ThrottlingQueue::new(Duration::from_millis(100), 1);
        queue.acquire().await;

        let started = std::time::Instant::now();
        queue.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
