//! Optimistic concurrency control for versioned records.
//!
//! Writers race freely; the store's single atomic "update where version =
//! expected, increment version" primitive decides the winner. No application
//! lock is taken and conflicts are never retried here.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    database::{self, StoreError},
    errors::{Classify, FailureKind},
};

/// Record version. Starts at 1 and grows by exactly one per successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(i32);

impl Version {
    pub const INITIAL: Self = Self(1);

    #[must_use]
    pub const fn new(version: i32) -> Self {
        Self(version)
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// The version a successful write from `self` produces.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The atomic compare-version-and-increment primitive a store must offer.
#[async_trait]
pub trait VersionedStore<Id, Changes>: Send + Sync
where
    Id: Send + Sync,
    Changes: Send + Sync,
{
    /// Apply `changes` to `id` only if its version is still `expected`, setting
    /// version to `expected + 1`. Returns the new version, or `None` when zero
    /// rows matched.
    async fn compare_and_increment(
        &self,
        id: Id,
        expected: Version,
        changes: &Changes,
    ) -> Result<Option<Version>, sqlx::Error>;

    /// Whether a record with `id` exists at all.
    async fn exists(&self, id: Id) -> Result<bool, sqlx::Error>;
}

/// How a zero-row write is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictReporting {
    /// Always `Conflict`; the caller's earlier read established existence.
    #[default]
    Uniform,

    /// Run an existence check to tell `NotFound` from `Conflict`.
    Distinguish,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    Conflict { expected: Version },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for WriteError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound => FailureKind::NotFound,
            Self::Conflict { .. } => FailureKind::Conflict,
            Self::Store(source) => source.kind(),
        }
    }
}

/// Applies version-checked writes with a bounded store call.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyGuard {
    timeout: Duration,
}

impl ConcurrencyGuard {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Write `changes` to `id` if it is still at `expected`.
    ///
    /// # Errors
    ///
    /// [`WriteError::Conflict`] when another writer got there first,
    /// [`WriteError::NotFound`] when `reporting` asks for the distinction and
    /// the record is gone, or the store failure (including timeouts).
    pub async fn apply<S, Id, Changes>(
        &self,
        store: &S,
        id: Id,
        expected: Version,
        changes: &Changes,
        reporting: ConflictReporting,
    ) -> Result<Version, WriteError>
    where
        S: VersionedStore<Id, Changes> + ?Sized,
        Id: Copy + fmt::Display + Send + Sync,
        Changes: Send + Sync,
    {
        let written = database::bounded(
            "versioned.compare_and_increment",
            self.timeout,
            store.compare_and_increment(id, expected, changes),
        )
        .await?;

        if let Some(version) = written {
            debug!(%id, from = %expected, to = %version, "versioned write applied");

            return Ok(version);
        }

        if reporting == ConflictReporting::Distinguish
            && !database::bounded("versioned.exists", self.timeout, store.exists(id)).await?
        {
            return Err(WriteError::NotFound);
        }

        warn!(%id, expected = %expected, "edit conflict");

        Err(WriteError::Conflict { expected })
    }
}
