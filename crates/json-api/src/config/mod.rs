//! Server configuration module

use clap::Parser;

use reel_app::{admission::QuotaError, context::ContextSettings};

use crate::config::{
    db::DatabaseConfig,
    limiter::LimiterConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod limiter;
pub(crate) mod observability;
pub(crate) mod server;


/// Reel JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "reel-json", about = "Reel JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network and shutdown settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Per-client rate limiting settings.
    #[command(flatten)]
    pub limiter: LimiterConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings for wiring the application context.
    ///
    /// # Errors
    ///
    /// Returns an error if the limiter settings do not form a valid quota.
    pub fn context_settings(&self) -> Result<ContextSettings, QuotaError> {
        Ok(ContextSettings {
            database_url: self.database.database_url.clone(),
            max_connections: self.database.max_connections,
            store_timeout: self.database.store_timeout(),
            admission: self.limiter.admission()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn limiter_defaults_match_documented_values() -> TestResult {
        let config = ServerConfig::try_parse_from(["reel-json", "--database-url", "postgres://x"])?;
        let settings = config.context_settings()?;

        assert!(settings.admission.enabled, "limiter should default to on");
        assert!((settings.admission.quota.rate() - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.admission.quota.burst(), 4);
        assert_eq!(settings.admission.idle_ttl, Duration::from_secs(180));
        assert_eq!(settings.admission.sweep_interval, Duration::from_secs(15));
        assert_eq!(settings.store_timeout, Duration::from_secs(3));
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(5));

        Ok(())
    }

    #[test]
    fn limiter_can_be_switched_off() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "reel-json",
            "--database-url",
            "postgres://x",
            "--limiter-enabled",
            "false",
        ])?;

        assert!(!config.context_settings()?.admission.enabled);

        Ok(())
    }

    #[test]
    fn negative_rate_is_rejected() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "reel-json",
            "--database-url",
            "postgres://x",
            "--limiter-rps=-1",
        ])?;

        assert!(config.context_settings().is_err());

        Ok(())
    }
}
