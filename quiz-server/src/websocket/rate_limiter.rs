use std::time::{Duration, Instant};

/// Token bucket applied to each socket's incoming messages.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_every: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        // 20 messages in a burst, then one every 500ms
        Self::new_with_limits(20, Duration::from_millis(500))
    }

    pub fn new_with_limits(max_tokens: u32, refill_every: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_every: refill_every.max(Duration::from_millis(1)),
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
        let elapsed = self.last_refill.elapsed();
        let earned = (elapsed.as_millis() / self.refill_every.as_millis()) as u32;

        if earned > 0 {
            self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
            self.last_refill += self.refill_every * earned;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
