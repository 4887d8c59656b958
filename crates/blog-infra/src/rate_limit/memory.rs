//! In-memory rate limiter using governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use blog_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// Tracked client keys above which idle ones are dropped.
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            max_tracked_keys: 10_000,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_MAX_REQUESTS`, `RATE_LIMIT_WINDOW_SECS` and
    /// `RATE_LIMIT_MAX_KEYS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
            max_tracked_keys: std::env::var("RATE_LIMIT_MAX_KEYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tracked_keys),
        }
    }
}

/// In-memory, per-key rate limiter using the GCRA algorithm.
///
/// Limits are per-process, not shared across instances. Once more than
/// `max_tracked_keys` clients are tracked, keys whose state has fully
/// replenished are dropped before the next check.
pub struct InMemoryRateLimiter {
    limiter: KeyedRateLimiter,
    clock: DefaultClock,
    max_tracked_keys: usize,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("max_requests must be positive".to_string()))?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("window must be positive".to_string()))?
            .allow_burst(burst);

        let clock = DefaultClock::default();
        let limiter = GovernorRateLimiter::keyed(quota)
            .with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            limiter,
            clock,
            max_tracked_keys: config.max_tracked_keys,
        })
    }

    /// Number of client keys currently held.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }

    fn prune(&self) {
        if self.limiter.len() < self.max_tracked_keys {
            return;
        }
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(before, after = self.limiter.len(), "Pruned idle rate limit keys");
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        self.prune();

        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => Ok(RateLimitResult {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: Duration::ZERO,
            }),
            Err(not_until) => {
                tracing::debug!(key = %key, "Rate limit exceeded");
                Ok(RateLimitResult {
                    allowed: false,
                    remaining: 0,
                    reset_after: not_until.wait_time_from(self.clock.now()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            ..RateLimitConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = limiter(3);

        let first = limiter.check("127.0.0.1").unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);
        assert!(limiter.check("127.0.0.1").unwrap().allowed);
        assert!(limiter.check("127.0.0.1").unwrap().allowed);

        let rejected = limiter.check("127.0.0.1").unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert!(rejected.reset_after > Duration::ZERO);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1);

        assert!(limiter.check("10.0.0.1").unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").unwrap().allowed);
        assert!(limiter.check("10.0.0.2").unwrap().allowed);
    }

    #[test]
    fn test_zero_requests_rejected() {
        assert!(
            InMemoryRateLimiter::new(RateLimitConfig {
                max_requests: 0,
                ..RateLimitConfig::default()
            })
            .is_err()
        );
    }

    #[test]
    fn test_idle_keys_are_dropped_past_the_threshold() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(500),
            max_tracked_keys: 10,
        })
        .unwrap();

        for i in 0..100 {
            assert!(limiter.check(&format!("10.0.{}.{}", i / 256, i % 256)).unwrap().allowed);
        }
        assert_eq!(limiter.tracked_keys(), 100);

        std::thread::sleep(Duration::from_secs(1));

        assert!(limiter.check("10.1.0.1").unwrap().allowed);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_busy_keys_survive_pruning() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
            max_tracked_keys: 2,
        })
        .unwrap();

        assert!(limiter.check("10.0.0.1").unwrap().allowed);
        assert!(limiter.check("10.0.0.2").unwrap().allowed);
        assert!(limiter.check("10.0.0.3").unwrap().allowed);

        assert!(!limiter.check("10.0.0.1").unwrap().allowed);
    }
}
