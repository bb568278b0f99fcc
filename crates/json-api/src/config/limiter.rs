//! Rate Limiter Config

use std::time::Duration;

use clap::Args;

use reel_app::admission::{AdmissionConfig, Quota, QuotaError};

/// Per-client admission settings.
#[derive(Debug, Args)]
pub struct LimiterConfig {
    /// Enable per-client rate limiting
    #[arg(
        long = "limiter-enabled",
        env = "LIMITER_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub enabled: bool,

    /// Sustained requests per second per client
    #[arg(long = "limiter-rps", env = "LIMITER_RPS", default_value_t = 2.0_f64)]
    pub rps: f64,

    /// Requests a client may make in one burst
    #[arg(long = "limiter-burst", env = "LIMITER_BURST", default_value_t = 4_u32)]
    pub burst: u32,

    /// Seconds a client may stay idle before its bucket is evicted
    #[arg(
        long = "limiter-idle-ttl-seconds",
        env = "LIMITER_IDLE_TTL_SECONDS",
        default_value_t = 180_u64
    )]
    pub idle_ttl_seconds: u64,

    /// Seconds between idle bucket sweeps
    #[arg(
        long = "limiter-sweep-interval-seconds",
        env = "LIMITER_SWEEP_INTERVAL_SECONDS",
        default_value_t = 15_u64
    )]
    pub sweep_interval_seconds: u64,
}

impl LimiterConfig {
    /// Build the admission configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate or burst cannot form a valid quota.
    pub fn admission(&self) -> Result<AdmissionConfig, QuotaError> {
        Ok(AdmissionConfig {
            enabled: self.enabled,
            quota: Quota::new(self.rps, self.burst)?,
            idle_ttl: Duration::from_secs(self.idle_ttl_seconds),
            sweep_interval: Duration::from_secs(self.sweep_interval_seconds.max(1)),
        })
    }
}
