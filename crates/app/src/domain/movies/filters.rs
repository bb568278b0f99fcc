//! Movie listing filters and pagination.

use std::str::FromStr;

use crate::domain::{movies::records::MovieRecord, validation::Violations};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE: u32 = 10_000;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Title,
    Year,
    Runtime,
}

/// Whitelisted sort key. Only these ever reach an `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("must be one of id, title, year, runtime, optionally prefixed with '-'")]
pub struct UnknownSort;

impl Sort {
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match (self.field, self.descending) {
            (SortField::Id, false) => "id ASC",
            (SortField::Id, true) => "id DESC",
            (SortField::Title, false) => "title ASC",
            (SortField::Title, true) => "title DESC",
            (SortField::Year, false) => "year ASC",
            (SortField::Year, true) => "year DESC",
            (SortField::Runtime, false) => "runtime ASC",
            (SortField::Runtime, true) => "runtime DESC",
        }
    }
}

impl FromStr for Sort {
    type Err = UnknownSort;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match value.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, value),
        };

        let field = match name {
            "id" => SortField::Id,
            "title" => SortField::Title,
            "year" => SortField::Year,
            "runtime" => SortField::Runtime,
            _ => return Err(UnknownSort),
        };

        Ok(Self { field, descending })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
    /// Full-text title match; empty matches everything.
    pub title: String,

    /// Movies must carry every listed genre.
    pub genres: Vec<String>,

    pub page: u32,
    pub page_size: u32,
    pub sort: Sort,
}

impl Default for MovieQuery {
    fn default() -> Self {
        Self {
            title: String::new(),
            genres: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl MovieQuery {
    /// # Errors
    ///
    /// Returns every out-of-range parameter.
    pub fn validate(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();

        violations.check(
            (1..=MAX_PAGE).contains(&self.page),
            "page",
            format!("must be between 1 and {MAX_PAGE}"),
        );
        violations.check(
            (1..=MAX_PAGE_SIZE).contains(&self.page_size),
            "page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        );
        violations.check(
            self.title.is_empty() || (2..=255).contains(&self.title.chars().count()),
            "title",
            "must be between 2 and 255 characters long",
        );

        violations.into_result()
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// Pagination metadata. All zero when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    pub current_page: u32,
    pub page_size: u32,
    pub first_page: u32,
    pub last_page: u64,
    pub total_records: u64,
}

impl Metadata {
    #[must_use]
    pub fn calculate(total_records: u64, page: u32, page_size: u32) -> Self {
        if total_records == 0 || page_size == 0 {
            return Self::default();
        }

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: total_records.div_ceil(u64::from(page_size)),
            total_records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoviePage {
    pub movies: Vec<MovieRecord>,
    pub metadata: Metadata,
}
