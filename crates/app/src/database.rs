//! Database connection management and bounded store calls.

use std::{future::Future, time::Duration};

use sqlx::{
    PgPool,
    error::{DatabaseError, ErrorKind},
    postgres::PgPoolOptions,
};
use thiserror::Error;
use tracing::warn;

use crate::errors::{Classify, FailureKind, capture_internal};

/// Deadline applied to every backing store call unless configured otherwise.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Failure of a single backing store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} violated a uniqueness constraint")]
    UniqueViolation { operation: &'static str },

    #[error("{operation} failed")]
    Sql {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl Classify for StoreError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::UniqueViolation { .. } => FailureKind::Duplicate,
            Self::Sql { .. } => FailureKind::Internal,
        }
    }
}

/// Run one store call under a deadline.
///
/// Timeouts are logged with the operation name and surfaced as
/// [`StoreError::Timeout`]; nothing is retried here.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when `after` elapses first, or the classified
/// SQL error when the call itself fails.
pub async fn bounded<T, F>(operation: &'static str, after: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(classify_sql(operation, source)),
        Err(_elapsed) => {
            warn!(operation, timeout_ms = after.as_millis(), "store call timed out");

            Err(StoreError::Timeout { operation, after })
        }
    }
}

fn classify_sql(operation: &'static str, source: sqlx::Error) -> StoreError {
    if matches!(
        source.as_database_error().map(DatabaseError::kind),
        Some(ErrorKind::UniqueViolation)
    ) {
        return StoreError::UniqueViolation { operation };
    }

    StoreError::Sql {
        operation,
        source: capture_internal(operation, source),
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(DEFAULT_STORE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails or the recorded history diverges.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
