//! Movie Handlers

use salvo::prelude::StatusError;

use reel_app::domain::{movies::runtime::Runtime, validation::Violations};

use crate::errors::invalid;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

/// Parse a `"<n> mins"` runtime, reporting failure against the `runtime` field.
fn parse_runtime(value: &str) -> Result<Runtime, StatusError> {
    value
        .parse::<Runtime>()
        .map_err(|error| invalid(&Violations::single("runtime", error.to_string())))
}
