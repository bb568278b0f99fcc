//! Shared failure taxonomy.
//!
//! Component errors stay specific (`AccessError`, `WriteError`, ...), but all of
//! them classify into one [`FailureKind`] so the transport layer can map them to
//! responses in a single place.

use std::{backtrace::Backtrace, error::Error, fmt};

use tracing::error;

/// What went wrong, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The client exceeded its request rate.
    AdmissionDenied,

    /// Missing, malformed, expired, or unknown credential.
    Unauthenticated,

    /// The credential is valid but the account has not been activated.
    InactiveAccount,

    /// Authenticated but lacking the required permission code.
    Forbidden,

    /// The record does not exist.
    NotFound,

    /// The record changed since it was read.
    Conflict,

    /// The request carried data that cannot be accepted.
    Invalid,

    /// A uniqueness constraint rejected the data.
    Duplicate,

    /// A backing store call exceeded its deadline.
    Timeout,

    /// Anything unexpected.
    Internal,
}

impl FailureKind {
    /// Whether repeating the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::AdmissionDenied | Self::Conflict | Self::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AdmissionDenied => "admission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::InactiveAccount => "inactive_account",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Duplicate => "duplicate",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        };

        f.write_str(name)
    }
}

/// Errors that can be reduced to a [`FailureKind`].
pub trait Classify {
    fn kind(&self) -> FailureKind;
}

/// Log an unexpected failure together with a backtrace captured here.
///
/// Call this where the failure is first observed; the returned value is passed
/// through so it can be used inline in a `map_err`.
pub fn capture_internal<E>(context: &str, source: E) -> E
where
    E: Error,
{
    let backtrace = Backtrace::force_capture();

    error!(context, error = %source, %backtrace, "internal failure");

    source
}
