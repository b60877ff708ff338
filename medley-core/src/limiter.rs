//! Request rate limiting for the HTTP API.
//!
//! Implements the classic token bucket algorithm plus a per-client registry
//! on top of it, used to cap how many API requests a single client may issue
//! per minute.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Buckets map size at which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Errors that can occur during rate limit checks.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LimiterError {
    /// Client has exhausted its request budget for the current window
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateExceeded {
        /// Seconds until the next request would be admitted
        retry_after_secs: u64,
    },
}

/// Token bucket rate limiter.
///
/// Tokens are added at a fixed per-minute rate and consumed per request.
/// Allows bursts up to bucket capacity while maintaining the average rate
/// over time.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Maximum number of tokens the bucket can hold
    capacity: u64,
    /// Current number of tokens in the bucket
    tokens: u64,
    /// Rate at which tokens are added (tokens per minute)
    refill_per_minute: u64,
    /// Timestamp of last refill operation
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates new token bucket with specified capacity and refill rate.
    ///
    /// # Parameters
    /// - `capacity`: Maximum tokens the bucket can hold (burst size)
    /// - `refill_per_minute`: Tokens added per minute (sustained rate)
    ///
    /// # Panics
    ///
    /// Panics if capacity or refill rate is zero.
    pub fn new(capacity: u64, refill_per_minute: u64) -> Self {
        assert!(
            capacity > 0,
            "Token bucket capacity must be greater than zero"
        );
        assert!(
            refill_per_minute > 0,
            "Token bucket refill rate must be greater than zero"
        );

        Self {
            capacity,
            tokens: capacity, // Start with full bucket
            refill_per_minute,
            last_refill: Instant::now(),
        }
    }

    /// Attempts to consume specified number of tokens.
    ///
    /// # Errors
    ///
    /// - `LimiterError::RateExceeded` - If requested tokens exceed available tokens
    pub fn try_consume(&mut self, tokens: u64) -> Result<(), LimiterError> {
        self.refill();

        if self.tokens >= tokens {
            self.tokens -= tokens;
            Ok(())
        } else {
            let retry_after_secs = (60.0 / self.refill_per_minute as f64).ceil() as u64;
            Err(LimiterError::RateExceeded { retry_after_secs })
        }
    }

    /// Returns current number of available tokens.
    pub fn available_tokens(&mut self) -> u64 {
        self.refill();
        self.tokens
    }

    /// Returns bucket capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Adds tokens to bucket based on elapsed time since last refill.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);

        if elapsed >= Duration::from_millis(1) {
            let tokens_to_add =
                (elapsed.as_secs_f64() * self.refill_per_minute as f64 / 60.0) as u64;

            // Only advance the refill timestamp once a whole token accrued,
            // otherwise fractional progress would be lost on every check
            if tokens_to_add > 0 {
                self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
                self.last_refill = now;
            }
        }
    }
}

/// Per-client request limiter keyed by IP address.
///
/// Each client gets its own token bucket sized to the configured per-minute
/// budget. A budget of zero disables limiting entirely.
#[derive(Debug)]
pub struct RequestLimiter {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    requests_per_minute: u32,
}

impl RequestLimiter {
    /// Creates a limiter admitting `requests_per_minute` requests per client.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            requests_per_minute,
        }
    }

    /// Records one request from `client` against its budget.
    ///
    /// # Errors
    ///
    /// - `LimiterError::RateExceeded` - Budget exhausted for this client
    pub fn check(&self, client: IpAddr) -> Result<(), LimiterError> {
        if self.requests_per_minute == 0 {
            return Ok(());
        }

        let budget = u64::from(self.requests_per_minute);
        let mut buckets = self.buckets.lock().unwrap();

        // Full buckets belong to clients idle long enough to refill completely
        if buckets.len() > PRUNE_THRESHOLD {
            buckets.retain(|_, bucket| bucket.available_tokens() < bucket.capacity());
        }

        buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(budget, budget))
            .try_consume(1)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use super::*;

    fn client(last_octet: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet))
    }

    #[test]
    fn test_token_bucket_creation() {
        let bucket = TokenBucket::new(100, 60);
        assert_eq!(bucket.capacity(), 100);
    }

    #[test]
    #[should_panic(expected = "Token bucket capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        TokenBucket::new(0, 60);
    }

    #[test]
    #[should_panic(expected = "Token bucket refill rate must be greater than zero")]
    fn test_zero_refill_rate_panics() {
        TokenBucket::new(100, 0);
    }

    #[test]
    fn test_try_consume_success() {
        let mut bucket = TokenBucket::new(100, 60);

        assert!(bucket.try_consume(50).is_ok());
        assert_eq!(bucket.available_tokens(), 50);
    }

    #[test]
    fn test_try_consume_insufficient_tokens() {
        let mut bucket = TokenBucket::new(10, 60);

        assert!(bucket.try_consume(10).is_ok());

        let result = bucket.try_consume(1);
        assert_eq!(
            result,
            Err(LimiterError::RateExceeded {
                retry_after_secs: 1
            })
        );
    }

    #[test]
    fn test_token_refill() {
        // 60_000 per minute = 1000 tokens/sec for faster testing
        let mut bucket = TokenBucket::new(100, 60_000);

        assert!(bucket.try_consume(100).is_ok());
        assert_eq!(bucket.available_tokens(), 0);

        std::thread::sleep(Duration::from_millis(10));

        let available = bucket.available_tokens();
        assert!(
            available > 0,
            "Expected some tokens after refill, got {available}"
        );
        assert!(available <= 100, "Should not exceed capacity");
    }

    #[test]
    fn test_capacity_limit() {
        let mut bucket = TokenBucket::new(50, 60_000); // Small capacity, fast refill

        std::thread::sleep(Duration::from_millis(100));

        // Should not exceed capacity despite high refill rate
        assert!(bucket.available_tokens() <= 50);
    }

    #[test]
    fn test_limiter_admits_within_budget() {
        let limiter = RequestLimiter::new(3);

        for _ in 0..3 {
            assert!(limiter.check(client(1)).is_ok());
        }
    }

    #[test]
    fn test_limiter_rejects_over_budget() {
        let limiter = RequestLimiter::new(2);

        assert!(limiter.check(client(1)).is_ok());
        assert!(limiter.check(client(1)).is_ok());
        assert!(matches!(
            limiter.check(client(1)),
            Err(LimiterError::RateExceeded { .. })
        ));
    }

    #[test]
    fn test_limiter_clients_are_independent() {
        let limiter = RequestLimiter::new(1);

        assert!(limiter.check(client(1)).is_ok());
        assert!(limiter.check(client(2)).is_ok());
        assert!(limiter.check(client(1)).is_err());
    }

    #[test]
    fn test_limiter_zero_budget_disables_limiting() {
        let limiter = RequestLimiter::new(0);

        for _ in 0..100 {
            assert!(limiter.check(client(1)).is_ok());
        }
    }
}
