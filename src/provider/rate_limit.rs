//! Client-side request budget for the statistics provider.
//!
//! API-Football plans cap calls per day. The budget is a token bucket holding
//! `capacity` cells that refill one every `window / capacity`. Callers await a
//! cell; exhaustion suspends them instead of failing.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::config::RateLimitConfig;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct RequestBudget {
    limiter: Limiter,
    capacity: NonZeroU32,
    window: Duration,
}

impl RequestBudget {
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = NonZeroU32::new(capacity).unwrap_or(NonZeroU32::MIN);
        let replenish = window / capacity.get();

        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(capacity))
            .allow_burst(capacity);

        Self {
            limiter: RateLimiter::direct(quota),
            capacity,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_seconds))
    }

    /// Wait until a request may be sent. No timeout.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a cell if one is free right now.
    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.get()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl std::fmt::Debug for RequestBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBudget")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .finish()
    }
}
