//! Client bucket registry.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::{
    admission::{AdmissionConfig, ClientBucket, Quota},
    clock::{Clock, elapsed_between},
    lifecycle::Lifecycle,
};

/// Outcome of an admission check. Denial is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

impl Admission {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Per-client token bucket registry.
///
/// Each instance owns its own map; there is no process-wide limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: AdmissionConfig,
    clock: Arc<dyn Clock>,
    buckets: Mutex<FxHashMap<String, ClientBucket>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            buckets: Mutex::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Check `key` against the configured quota.
    pub fn admit(&self, key: &str) -> Admission {
        self.admit_with(key, self.config.quota)
    }

    /// Check `key` against an explicit quota.
    ///
    /// The first check for a key creates a full bucket. Every check refills the
    /// bucket for the elapsed time and then tries to take one token.
    pub fn admit_with(&self, key: &str, quota: Quota) -> Admission {
        if !self.config.enabled {
            return Admission::Allowed;
        }

        let now = self.clock.now();
        let mut buckets = self.buckets.lock();

        let allowed = if let Some(bucket) = buckets.get_mut(key) {
            bucket.refill(quota, now);
            bucket.try_take()
        } else {
            let mut bucket = ClientBucket::full(quota, now);
            let allowed = bucket.try_take();

            buckets.insert(key.to_owned(), bucket);

            allowed
        };

        if allowed {
            Admission::Allowed
        } else {
            Admission::Denied
        }
    }

    /// Evict every bucket idle for longer than the configured TTL. Returns the
    /// number of evicted buckets.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let idle_ttl = self.config.idle_ttl;
        let mut buckets = self.buckets.lock();
        let before = buckets.len();

        buckets.retain(|_key, bucket| elapsed_between(bucket.last_seen(), now) <= idle_ttl);

        before - buckets.len()
    }

    /// Number of client keys currently holding a bucket.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Start the periodic eviction sweep on `lifecycle`. The task exits when
    /// the lifecycle's shutdown signal fires. Disabled registries never hold
    /// buckets, so no task is started for them.
    pub fn spawn_sweeper(self: &Arc<Self>, lifecycle: &Lifecycle) {
        if !self.config.enabled {
            return;
        }

        let limiter = Arc::clone(self);
        let shutdown = lifecycle.shutdown_token();
        let period = self.config.sweep_interval.max(Duration::from_millis(1));

        lifecycle.spawn("admission.sweep", async move {
            let mut ticker = interval_at(Instant::now() + period, period);

            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(interval_ms = period.as_millis(), "admission sweep started");

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();

                        if evicted > 0 {
                            debug!(evicted, remaining = limiter.tracked_clients(), "evicted idle client buckets");
                        }
                    }
                }
            }

            info!("admission sweep stopped");
        });
    }
}
