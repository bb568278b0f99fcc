//! Movies service.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::tz::TimeZone;
use mockall::automock;
use sqlx::PgPool;
use tracing::debug;

use crate::{
    clock::Clock,
    concurrency::{ConcurrencyGuard, ConflictReporting, Version, VersionedStore},
    database::{self, DEFAULT_STORE_TIMEOUT},
    domain::movies::{
        data::{MovieChanges, MovieUpdate, NewMovie},
        errors::MoviesServiceError,
        filters::{Metadata, MoviePage, MovieQuery},
        records::{MovieId, MovieRecord},
        repository::{MoviesRepository, PgMoviesRepository},
    },
};

#[automock]
#[async_trait]
pub trait MoviesService: Send + Sync {
    async fn create_movie(&self, movie: NewMovie) -> Result<MovieRecord, MoviesServiceError>;

    async fn get_movie(&self, id: MovieId) -> Result<MovieRecord, MoviesServiceError>;

    async fn update_movie(
        &self,
        id: MovieId,
        update: MovieUpdate,
    ) -> Result<MovieRecord, MoviesServiceError>;

    async fn delete_movie(&self, id: MovieId) -> Result<(), MoviesServiceError>;

    async fn list_movies(&self, query: MovieQuery) -> Result<MoviePage, MoviesServiceError>;
}

#[derive(Clone)]
pub struct PgMoviesService {
    repository: Arc<dyn MoviesRepository>,
    clock: Arc<dyn Clock>,
    guard: ConcurrencyGuard,
    timeout: Duration,
}

impl fmt::Debug for PgMoviesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgMoviesService")
            .field("guard", &self.guard)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PgMoviesService {
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self::with_repository(Arc::new(PgMoviesRepository::new(pool)), clock)
    }

    #[must_use]
    pub fn with_repository(repository: Arc<dyn MoviesRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            guard: ConcurrencyGuard::new(DEFAULT_STORE_TIMEOUT),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.guard = ConcurrencyGuard::new(timeout);
        self.timeout = timeout;
        self
    }

    fn current_year(&self) -> i32 {
        i32::from(self.clock.now().to_zoned(TimeZone::UTC).year())
    }
}

#[async_trait]
impl MoviesService for PgMoviesService {
    async fn create_movie(&self, movie: NewMovie) -> Result<MovieRecord, MoviesServiceError> {
        movie.validate(self.current_year())?;

        let created = database::bounded(
            "movies.insert",
            self.timeout,
            self.repository.insert_movie(&movie),
        )
        .await?;

        debug!(movie = %created.id, "created movie");

        Ok(created)
    }

    async fn get_movie(&self, id: MovieId) -> Result<MovieRecord, MoviesServiceError> {
        if !id.is_valid() {
            return Err(MoviesServiceError::NotFound);
        }

        database::bounded("movies.get", self.timeout, self.repository.get_movie(id))
            .await?
            .ok_or(MoviesServiceError::NotFound)
    }

    async fn update_movie(
        &self,
        id: MovieId,
        update: MovieUpdate,
    ) -> Result<MovieRecord, MoviesServiceError> {
        let current = self.get_movie(id).await?;

        if update
            .expected_version
            .is_some_and(|expected| expected != current.version)
        {
            return Err(MoviesServiceError::Conflict);
        }

        let changes = update.merge_into(&current);
        changes.validate(self.current_year())?;

        let version = self
            .guard
            .apply(
                &MovieVersions(self.repository.as_ref()),
                id,
                current.version,
                &changes,
                ConflictReporting::Uniform,
            )
            .await?;

        Ok(changes.into_record(&current, version))
    }

    async fn delete_movie(&self, id: MovieId) -> Result<(), MoviesServiceError> {
        if !id.is_valid() {
            return Err(MoviesServiceError::NotFound);
        }

        let rows_affected =
            database::bounded("movies.delete", self.timeout, self.repository.delete_movie(id))
                .await?;

        if rows_affected == 0 {
            return Err(MoviesServiceError::NotFound);
        }

        Ok(())
    }

    async fn list_movies(&self, query: MovieQuery) -> Result<MoviePage, MoviesServiceError> {
        query.validate()?;

        let (movies, total_records) =
            database::bounded("movies.list", self.timeout, self.repository.list_movies(&query))
                .await?;

        Ok(MoviePage {
            movies,
            metadata: Metadata::calculate(total_records, query.page, query.page_size),
        })
    }
}

/// Exposes a movies repository's conditional write to the guard.
struct MovieVersions<'a>(&'a dyn MoviesRepository);

#[async_trait]
impl VersionedStore<MovieId, MovieChanges> for MovieVersions<'_> {
    async fn compare_and_increment(
        &self,
        id: MovieId,
        expected: Version,
        changes: &MovieChanges,
    ) -> Result<Option<Version>, sqlx::Error> {
        self.0.update_movie(id, expected, changes).await
    }

    async fn exists(&self, id: MovieId) -> Result<bool, sqlx::Error> {
        self.0.movie_exists(id).await
    }
}
