//! Movie Records

use jiff::Timestamp;

use crate::{concurrency::Version, domain::movies::runtime::Runtime, ids::TypedId};

/// Movie ID
pub type MovieId = TypedId<MovieRecord>;

/// Movie Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub id: MovieId,
    pub created_at: Timestamp,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: Version,
}
