//! Admission settings.

use std::time::Duration;

use thiserror::Error;

/// Refill rate and bucket capacity for one client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quota {
    rate: f64,
    burst: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuotaError {
    #[error("rate must be a finite, non-negative number of tokens per second, got {0}")]
    InvalidRate(f64),
}

impl Quota {
    /// Build a quota of `rate` tokens per second with capacity `burst`.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidRate`] for negative, NaN, or infinite rates.
    pub fn new(rate: f64, burst: u32) -> Result<Self, QuotaError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(QuotaError::InvalidRate(rate));
        }

        Ok(Self { rate, burst })
    }

    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    #[must_use]
    pub const fn burst(&self) -> u32 {
        self.burst
    }
}

/// Registry-wide admission configuration.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// When false every request is admitted and no bucket is ever created.
    pub enabled: bool,

    pub quota: Quota,

    /// Buckets unseen for longer than this are evicted by the sweep.
    pub idle_ttl: Duration,

    /// How often the sweep runs, independent of request traffic.
    pub sweep_interval: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quota: Quota {
                rate: 2.0,
                burst: 4,
            },
            idle_ttl: Duration::from_secs(3 * 60),
            sweep_interval: Duration::from_secs(15),
        }
    }
}
