//! Server Config

use std::time::Duration;

use clap::Args;

/// Server runtime network settings.
#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "4000")]
    pub port: u16,

    /// Seconds to let in-flight requests and background tasks drain on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 5_u64)]
    pub shutdown_grace_seconds: u64,
}

impl ServerRuntimeConfig {
    /// Get the socket address for binding.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shutdown drain period as a duration.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}
