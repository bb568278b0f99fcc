//! Failure kind to HTTP response mapping.

use std::fmt::Display;

use salvo::http::StatusError;
use tracing::{error, warn};

use reel_app::{
    domain::validation::Violations,
    errors::{Classify, FailureKind},
};

use crate::observability::record_failure;

pub(crate) const RATE_LIMITED: &str = "rate limit exceeded";
pub(crate) const AUTHENTICATION_REQUIRED: &str = "authentication required";
pub(crate) const ACCOUNT_INACTIVE: &str = "account must be activated";
pub(crate) const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";
pub(crate) const RECORD_NOT_FOUND: &str = "record not found";
pub(crate) const EDIT_CONFLICT: &str = "edit conflict, retry";
pub(crate) const UNAVAILABLE: &str = "the server is temporarily unable to handle the request, retry later";
pub(crate) const INVALID_REQUEST: &str = "the request contains invalid data";
pub(crate) const SERVER_ERROR: &str =
    "the server encountered a problem and could not process your request";

/// Response for a failure kind. Messages are fixed; nothing from the
/// underlying error reaches the client.
pub(crate) fn kind_to_status(kind: FailureKind) -> StatusError {
    match kind {
        FailureKind::AdmissionDenied => StatusError::too_many_requests().brief(RATE_LIMITED),
        FailureKind::Unauthenticated => StatusError::unauthorized().brief(AUTHENTICATION_REQUIRED),
        FailureKind::InactiveAccount => StatusError::unauthorized().brief(ACCOUNT_INACTIVE),
        FailureKind::Forbidden => StatusError::forbidden().brief(INSUFFICIENT_PERMISSIONS),
        FailureKind::NotFound => StatusError::not_found().brief(RECORD_NOT_FOUND),
        FailureKind::Conflict => StatusError::conflict().brief(EDIT_CONFLICT),
        FailureKind::Invalid | FailureKind::Duplicate => {
            StatusError::unprocessable_entity().brief(INVALID_REQUEST)
        }
        FailureKind::Timeout => StatusError::service_unavailable().brief(UNAVAILABLE),
        FailureKind::Internal => StatusError::internal_server_error().brief(SERVER_ERROR),
    }
}

/// Classify `error`, log it when operators need to see it, and build the
/// response.
pub(crate) fn into_status_error<E>(operation: &str, error: &E) -> StatusError
where
    E: Classify + Display,
{
    let kind = error.kind();

    match kind {
        FailureKind::Timeout => warn!(operation, "store deadline exceeded: {error}"),
        FailureKind::Internal => error!(operation, "request failed: {error}"),
        _ => {}
    }

    record_failure(operation, kind);

    kind_to_status(kind)
}

/// 422 listing each offending field.
pub(crate) fn invalid(violations: &Violations) -> StatusError {
    StatusError::unprocessable_entity()
        .brief(INVALID_REQUEST)
        .detail(violations.to_string())
}
