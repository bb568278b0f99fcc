//! Movie Errors

use salvo::http::StatusError;

use reel_app::domain::movies::MoviesServiceError;

use crate::errors;

pub(crate) fn into_status_error(operation: &str, error: &MoviesServiceError) -> StatusError {
    match error {
        MoviesServiceError::Invalid(violations) => errors::invalid(violations),
        other => errors::into_status_error(operation, other),
    }
}
