//! Clock sources.
//!
//! Every component that compares times takes an `Arc<dyn Clock>` so tests can
//! drive time explicitly with [`ManualClock`].

use std::{fmt::Debug, time::Duration};

use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;

/// Supplies the current time.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward. Durations too large for a timestamp saturate at
    /// the maximum representable instant.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        let by = SignedDuration::try_from(by).unwrap_or(SignedDuration::MAX);

        *now = now.checked_add(by).unwrap_or(Timestamp::MAX);
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

/// Non-negative time elapsed from `earlier` to `now`. A clock that stepped
/// backwards yields zero.
#[must_use]
pub fn elapsed_between(earlier: Timestamp, now: Timestamp) -> Duration {
    let elapsed = now.duration_since(earlier);

    if elapsed.is_negative() {
        Duration::ZERO
    } else {
        elapsed.unsigned_abs()
    }
}
