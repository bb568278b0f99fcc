//! Database Config

use std::time::Duration;

use clap::Args;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum open connections in the pool
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 25_u32)]
    pub max_connections: u32,

    /// Deadline for a single store call, in seconds
    #[arg(long, env = "DATABASE_STORE_TIMEOUT_SECONDS", default_value_t = 3_u64)]
    pub store_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Store call deadline as a duration.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}
