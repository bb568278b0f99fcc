//! Users service errors.

use thiserror::Error;

use crate::{
    auth::{AccessError, PasswordError},
    concurrency::WriteError,
    database::StoreError,
    domain::validation::Violations,
    errors::{Classify, FailureKind},
};

/// Store operation whose uniqueness violation means the email is taken.
pub const INSERT_USER: &str = "users.insert";

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("invalid user: {0}")]
    Invalid(Violations),

    #[error("a user with this email address already exists")]
    DuplicateEmail,

    #[error("invalid or expired activation token")]
    InvalidActivationToken,

    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    Conflict,

    #[error(transparent)]
    Access(AccessError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for UsersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { operation } if operation == INSERT_USER => {
                Self::DuplicateEmail
            }
            other => Self::Store(other),
        }
    }
}

impl From<AccessError> for UsersServiceError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::Store(source) => Self::Store(source),
            other => Self::Access(other),
        }
    }
}

impl From<WriteError> for UsersServiceError {
    fn from(error: WriteError) -> Self {
        match error {
            WriteError::NotFound => Self::NotFound,
            WriteError::Conflict { .. } => Self::Conflict,
            WriteError::Store(source) => Self::Store(source),
        }
    }
}

impl From<Violations> for UsersServiceError {
    fn from(violations: Violations) -> Self {
        Self::Invalid(violations)
    }
}

impl Classify for UsersServiceError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Invalid(_) | Self::InvalidActivationToken => FailureKind::Invalid,
            Self::DuplicateEmail => FailureKind::Duplicate,
            Self::InvalidCredentials => FailureKind::Unauthenticated,
            Self::NotFound => FailureKind::NotFound,
            Self::Conflict => FailureKind::Conflict,
            Self::Access(source) => source.kind(),
            Self::Password(source) => source.kind(),
            Self::Store(StoreError::UniqueViolation { .. }) => FailureKind::Internal,
            Self::Store(source) => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_means_duplicate_email() {
        let error = UsersServiceError::from(StoreError::UniqueViolation {
            operation: INSERT_USER,
        });

        assert!(matches!(error, UsersServiceError::DuplicateEmail));
        assert_eq!(error.kind(), FailureKind::Duplicate);
    }

    #[test]
    fn unique_violation_elsewhere_is_not_a_duplicate_email() {
        for operation in ["tokens.insert", "users.update"] {
            let error = UsersServiceError::from(StoreError::UniqueViolation { operation });

            assert!(
                matches!(error, UsersServiceError::Store(StoreError::UniqueViolation { .. })),
                "{operation} must keep its store error"
            );
            assert_eq!(error.kind(), FailureKind::Internal, "{operation}");
        }

        let via_tokens = UsersServiceError::from(AccessError::Store(StoreError::UniqueViolation {
            operation: "tokens.insert",
        }));

        assert_eq!(via_tokens.kind(), FailureKind::Internal);
    }

    #[test]
    fn wrong_password_reads_as_unauthenticated() {
        assert_eq!(
            UsersServiceError::InvalidCredentials.kind(),
            FailureKind::Unauthenticated
        );
    }
}
