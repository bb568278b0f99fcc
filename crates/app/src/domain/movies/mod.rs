//! Movies

pub mod data;
pub mod errors;
pub mod filters;
pub mod records;
mod repository;
pub mod runtime;
pub mod service;

pub use errors::MoviesServiceError;
pub use repository::{MockMoviesRepository, MoviesRepository, PgMoviesRepository};
pub use service::*;
