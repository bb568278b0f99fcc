//! Movies Data

use crate::{
    concurrency::Version,
    domain::{
        movies::{records::MovieRecord, runtime::Runtime},
        validation::{Violations, all_unique},
    },
};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_GENRES: usize = 5;

/// New Movie Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl NewMovie {
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self, current_year: i32) -> Result<(), Violations> {
        validate_movie(
            &self.title,
            self.year,
            &self.genres,
            current_year,
        )
    }
}

/// Movie Update Data
///
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,

    /// Version the client last saw, when it supplied one.
    pub expected_version: Option<Version>,
}

impl MovieUpdate {
    /// Overlay the provided fields on `record`.
    #[must_use]
    pub fn merge_into(self, record: &MovieRecord) -> MovieChanges {
        MovieChanges {
            title: self.title.unwrap_or_else(|| record.title.clone()),
            year: self.year.unwrap_or(record.year),
            runtime: self.runtime.unwrap_or(record.runtime),
            genres: self.genres.unwrap_or_else(|| record.genres.clone()),
        }
    }
}

/// Full payload written by a versioned update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieChanges {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl MovieChanges {
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self, current_year: i32) -> Result<(), Violations> {
        validate_movie(&self.title, self.year, &self.genres, current_year)
    }

    #[must_use]
    pub fn into_record(self, base: &MovieRecord, version: Version) -> MovieRecord {
        MovieRecord {
            id: base.id,
            created_at: base.created_at,
            title: self.title,
            year: self.year,
            runtime: self.runtime,
            genres: self.genres,
            version,
        }
    }
}

fn validate_movie(
    title: &str,
    year: i32,
    genres: &[String],
    current_year: i32,
) -> Result<(), Violations> {
    let mut violations = Violations::new();

    violations.check(!title.trim().is_empty(), "title", "must be provided");
    violations.check(
        title.chars().count() <= MAX_TITLE_CHARS,
        "title",
        format!("must not be more than {MAX_TITLE_CHARS} characters long"),
    );

    violations.check(year >= MIN_YEAR, "year", format!("must be {MIN_YEAR} or later"));
    violations.check(year <= current_year, "year", "must not be in the future");

    violations.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
    violations.check(
        genres.len() <= MAX_GENRES,
        "genres",
        format!("must not contain more than {MAX_GENRES} genres"),
    );
    violations.check(
        genres.iter().all(|genre| !genre.trim().is_empty()),
        "genres",
        "must not contain blank values",
    );
    violations.check(all_unique(genres), "genres", "must not contain duplicate values");

    violations.into_result()
}
