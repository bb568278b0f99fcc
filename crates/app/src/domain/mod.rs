//! Catalog domains.

pub mod mailer;
pub mod movies;
pub mod users;
pub mod validation;
