//! User Errors

use salvo::http::StatusError;

use reel_app::domain::{users::UsersServiceError, validation::Violations};

use crate::errors;

pub(crate) fn into_status_error(operation: &str, error: &UsersServiceError) -> StatusError {
    match error {
        UsersServiceError::Invalid(violations) => errors::invalid(violations),
        UsersServiceError::DuplicateEmail => errors::invalid(&Violations::single(
            "email",
            "a user with this email address already exists",
        )),
        UsersServiceError::InvalidActivationToken => errors::invalid(&Violations::single(
            "token",
            "invalid or expired activation token",
        )),
        UsersServiceError::InvalidCredentials => {
            StatusError::unauthorized().brief("invalid authentication credentials")
        }
        other => errors::into_status_error(operation, other),
    }
}
