//! Token bucket state for a single client.

use jiff::Timestamp;

use crate::{admission::Quota, clock::elapsed_between};

/// Tokens available to one client key.
///
/// `tokens` stays within `0..=burst` of the quota it is refilled with.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBucket {
    tokens: f64,
    last_refill: Timestamp,
    last_seen: Timestamp,
}

impl ClientBucket {
    /// A full bucket first seen at `now`.
    #[must_use]
    pub fn full(quota: Quota, now: Timestamp) -> Self {
        Self {
            tokens: f64::from(quota.burst()),
            last_refill: now,
            last_seen: now,
        }
    }

    /// Add the tokens accrued since the last refill, capped at `burst`.
    ///
    /// `last_refill` never moves backwards, so an interval is credited once
    /// even if the clock steps back and recovers.
    pub fn refill(&mut self, quota: Quota, now: Timestamp) {
        let elapsed = elapsed_between(self.last_refill, now).as_secs_f64();
        let capacity = f64::from(quota.burst());

        self.tokens = (self.tokens + elapsed * quota.rate()).min(capacity);
        self.last_refill = self.last_refill.max(now);
        self.last_seen = now;
    }

    /// Take one token if a whole one is available.
    pub fn try_take(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;

            return true;
        }

        false
    }

    #[must_use]
    pub const fn tokens(&self) -> f64 {
        self.tokens
    }

    #[must_use]
    pub const fn last_seen(&self) -> Timestamp {
        self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::*;

    fn quota(rate: f64, burst: u32) -> Quota {
        Quota::new(rate, burst).unwrap_or_else(|error| panic!("{error}"))
    }

    #[test]
    fn refill_never_exceeds_burst() {
        let quota = quota(10.0, 3);
        let start = Timestamp::UNIX_EPOCH;
        let mut bucket = ClientBucket::full(quota, start);

        bucket.refill(quota, start + SignedDuration::from_secs(60));

        assert!((bucket.tokens() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_tokens_are_not_spendable() {
        let quota = quota(1.0, 1);
        let start = Timestamp::UNIX_EPOCH;
        let mut bucket = ClientBucket::full(quota, start);

        assert!(bucket.try_take());

        bucket.refill(quota, start + SignedDuration::from_millis(900));

        assert!(!bucket.try_take());
        assert!(bucket.tokens() > 0.0);
    }

    #[test]
    fn refill_with_backwards_clock_adds_nothing() {
        let quota = quota(5.0, 5);
        let start = Timestamp::UNIX_EPOCH + SignedDuration::from_secs(10);
        let mut bucket = ClientBucket::full(quota, start);

        while bucket.try_take() {}

        bucket.refill(quota, Timestamp::UNIX_EPOCH);

        assert!(bucket.tokens().abs() < f64::EPSILON);
    }

    #[test]
    fn clock_step_back_and_recovery_credits_the_interval_once() {
        let quota = quota(1.0, 10);
        let start = Timestamp::UNIX_EPOCH + SignedDuration::from_secs(100);
        let mut bucket = ClientBucket::full(quota, start);

        while bucket.try_take() {}

        bucket.refill(quota, start - SignedDuration::from_secs(5));
        bucket.refill(quota, start + SignedDuration::from_secs(2));

        assert!(
            (bucket.tokens() - 2.0).abs() < f64::EPSILON,
            "expected two tokens, got {}",
            bucket.tokens()
        );
    }
}
