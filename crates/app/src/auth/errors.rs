//! Access errors.

use thiserror::Error;

use crate::{
    database::StoreError,
    errors::{Classify, FailureKind},
};

/// Failure of an identity or permission check.
///
/// Messages are fixed and generic; which digest or which code failed is never
/// carried here.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("account must be activated")]
    InactiveAccount,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for AccessError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthenticated => FailureKind::Unauthenticated,
            Self::InactiveAccount => FailureKind::InactiveAccount,
            Self::Forbidden => FailureKind::Forbidden,
            Self::InvalidTtl => FailureKind::Internal,
            Self::Store(source) => source.kind(),
        }
    }
}
