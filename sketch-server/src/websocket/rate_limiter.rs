use std::time::Duration;
use tokio::time::Instant;

/// Token bucket guarding one connection. Drawing clients send many small
/// stroke batches, so the bucket is sized for bursts.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::new_with_limits(120, Duration::from_millis(50))
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        let time_passed = self.last_refill.elapsed();
        let steps = time_passed.as_nanos() / self.refill_rate.as_nanos().max(1);
        if steps == 0 {
            return;
        }

        let tokens_to_add = u32::try_from(steps).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(tokens_to_add).min(self.max_tokens);
        self.last_refill += self.refill_rate * tokens_to_add;
        if self.tokens == self.max_tokens {
            self.last_refill = Instant::now();
        }
    }

    pub fn get_remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bucket_drains_and_refills() {
        let mut limiter = RateLimiter::new_with_limits(3, Duration::from_secs(1));

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(limiter.get_remaining_tokens(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.get_remaining_tokens(), 3);
    }
}
