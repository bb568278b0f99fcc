//! Catalog core: admission control, credentials, authorization, optimistic
//! concurrency, and the movie/user domains built on top of them.

pub mod admission;
pub mod auth;
pub mod clock;
pub mod concurrency;
pub mod context;
pub mod database;
pub mod domain;
pub mod errors;
pub mod ids;
pub mod lifecycle;

#[cfg(test)]
mod test;
