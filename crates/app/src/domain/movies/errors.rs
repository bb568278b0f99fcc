//! Movies service errors.

use thiserror::Error;

use crate::{
    concurrency::WriteError,
    database::StoreError,
    domain::validation::Violations,
    errors::{Classify, FailureKind},
};

#[derive(Debug, Error)]
pub enum MoviesServiceError {
    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    Conflict,

    #[error("invalid movie: {0}")]
    Invalid(Violations),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WriteError> for MoviesServiceError {
    fn from(error: WriteError) -> Self {
        match error {
            WriteError::NotFound => Self::NotFound,
            WriteError::Conflict { .. } => Self::Conflict,
            WriteError::Store(source) => Self::Store(source),
        }
    }
}

impl From<Violations> for MoviesServiceError {
    fn from(violations: Violations) -> Self {
        Self::Invalid(violations)
    }
}

impl Classify for MoviesServiceError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound => FailureKind::NotFound,
            Self::Conflict => FailureKind::Conflict,
            Self::Invalid(_) => FailureKind::Invalid,
            Self::Store(source) => source.kind(),
        }
    }
}
