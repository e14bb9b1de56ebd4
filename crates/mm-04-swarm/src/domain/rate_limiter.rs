//! # Rate Limiter
//!
//! Token bucket guarding each connection's inbound frame rate. Owned by the
//! connection's reader task, so no interior locking is needed.

use std::time::Instant;

/// Token bucket rate limiter.
///
/// Tokens refill continuously at `refill_per_sec` up to `capacity`; each
/// frame consumes one.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(capacity: u64, refill_per_sec: u64) -> Self {
        Self::starting_at(capacity, refill_per_sec, Instant::now())
    }

    pub fn starting_at(capacity: u64, refill_per_sec: u64, now: Instant) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec as f64,
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    /// Take a token. `false` means the caller is over its rate.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refilled = elapsed.as_secs_f64() * self.refill_per_sec;
        self.tokens = (self.tokens + refilled).min(self.capacity);
        self.last_refill = now;
    }
}
