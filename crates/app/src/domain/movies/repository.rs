//! Movies Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    concurrency::Version,
    domain::movies::{
        data::{MovieChanges, NewMovie},
        filters::MovieQuery,
        records::{MovieId, MovieRecord},
        runtime::Runtime,
    },
};

const INSERT_MOVIE_SQL: &str = include_str!("sql/insert_movie.sql");
const GET_MOVIE_SQL: &str = include_str!("sql/get_movie.sql");
const UPDATE_MOVIE_SQL: &str = include_str!("sql/update_movie.sql");
const MOVIE_EXISTS_SQL: &str = include_str!("sql/movie_exists.sql");
const DELETE_MOVIE_SQL: &str = include_str!("sql/delete_movie.sql");
const LIST_MOVIES_SQL: &str = include_str!("sql/list_movies.sql");

#[automock]
#[async_trait]
pub trait MoviesRepository: Send + Sync {
    async fn insert_movie(&self, movie: &NewMovie) -> Result<MovieRecord, sqlx::Error>;

    async fn get_movie(&self, id: MovieId) -> Result<Option<MovieRecord>, sqlx::Error>;

    /// Conditional write; `None` when no row had `expected` as its version.
    async fn update_movie(
        &self,
        id: MovieId,
        expected: Version,
        changes: &MovieChanges,
    ) -> Result<Option<Version>, sqlx::Error>;

    async fn movie_exists(&self, id: MovieId) -> Result<bool, sqlx::Error>;

    async fn delete_movie(&self, id: MovieId) -> Result<u64, sqlx::Error>;

    /// One page of matches plus the total match count.
    async fn list_movies(&self, query: &MovieQuery)
    -> Result<(Vec<MovieRecord>, u64), sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgMoviesRepository {
    pool: PgPool,
}

impl PgMoviesRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MoviesRepository for PgMoviesRepository {
    async fn insert_movie(&self, movie: &NewMovie) -> Result<MovieRecord, sqlx::Error> {
        query_as::<Postgres, MovieRecord>(INSERT_MOVIE_SQL)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.minutes())
            .bind(&movie.genres)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_movie(&self, id: MovieId) -> Result<Option<MovieRecord>, sqlx::Error> {
        query_as::<Postgres, MovieRecord>(GET_MOVIE_SQL)
            .bind(id.into_i64())
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_movie(
        &self,
        id: MovieId,
        expected: Version,
        changes: &MovieChanges,
    ) -> Result<Option<Version>, sqlx::Error> {
        let version = query_scalar::<Postgres, i32>(UPDATE_MOVIE_SQL)
            .bind(id.into_i64())
            .bind(expected.get())
            .bind(&changes.title)
            .bind(changes.year)
            .bind(changes.runtime.minutes())
            .bind(&changes.genres)
            .fetch_optional(&self.pool)
            .await?;

        Ok(version.map(Version::new))
    }

    async fn movie_exists(&self, id: MovieId) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(MOVIE_EXISTS_SQL)
            .bind(id.into_i64())
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_movie(&self, id: MovieId) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_MOVIE_SQL)
            .bind(id.into_i64())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn list_movies(
        &self,
        movie_query: &MovieQuery,
    ) -> Result<(Vec<MovieRecord>, u64), sqlx::Error> {
        let sql = LIST_MOVIES_SQL.replace("{order_by}", movie_query.sort.order_by());

        let rows = query(&sql)
            .bind(&movie_query.title)
            .bind(&movie_query.genres)
            .bind(movie_query.limit())
            .bind(movie_query.offset())
            .fetch_all(&self.pool)
            .await?;

        let mut total_records = 0_u64;
        let mut movies = Vec::with_capacity(rows.len());

        for row in &rows {
            let total: i64 = row.try_get("total_records")?;

            total_records = u64::try_from(total).map_err(|e| sqlx::Error::ColumnDecode {
                index: "total_records".to_string(),
                source: Box::new(e),
            })?;

            movies.push(MovieRecord::from_row(row)?);
        }

        Ok((movies, total_records))
    }
}

impl<'r> FromRow<'r, PgRow> for MovieRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let minutes: i32 = row.try_get("runtime")?;

        let runtime = Runtime::from_minutes(minutes).map_err(|e| sqlx::Error::ColumnDecode {
            index: "runtime".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: MovieId::from_i64(row.try_get("id")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            runtime,
            genres: row.try_get("genres")?,
            version: Version::new(row.try_get("version")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::movies::filters::{Sort, SortField},
        test::db::TestDb,
    };

    use super::*;

    fn new_movie(title: &str, year: i32, genres: &[&str]) -> NewMovie {
        NewMovie {
            title: title.to_owned(),
            year,
            runtime: Runtime::from_minutes(100).unwrap_or_else(|error| panic!("{error}")),
            genres: genres.iter().map(|genre| (*genre).to_owned()).collect(),
        }
    }

    #[tokio::test]
    async fn conditional_update_matches_only_the_expected_version() -> TestResult {
        let db = TestDb::new().await;
        let movies = PgMoviesRepository::new(db.pool.clone());

        let created = movies
            .insert_movie(&new_movie("Black Panther", 2018, &["action"]))
            .await?;

        assert_eq!(created.version, Version::INITIAL);

        let changes = MovieChanges {
            title: "Black Panther".to_owned(),
            year: 2018,
            runtime: created.runtime,
            genres: vec!["action".to_owned(), "adventure".to_owned()],
        };

        let bumped = movies
            .update_movie(created.id, Version::INITIAL, &changes)
            .await?;
        assert_eq!(bumped, Some(Version::new(2)));

        let stale = movies
            .update_movie(created.id, Version::INITIAL, &changes)
            .await?;
        assert_eq!(stale, None);

        let stored = movies.get_movie(created.id).await?;
        assert_eq!(stored.map(|movie| movie.version), Some(Version::new(2)));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_updates_on_one_version_have_a_single_winner() -> TestResult {
        let db = TestDb::new().await;
        let movies = std::sync::Arc::new(PgMoviesRepository::new(db.pool.clone()));

        let created = movies
            .insert_movie(&new_movie("Arrival", 2016, &["drama"]))
            .await?;

        let mut writers = tokio::task::JoinSet::new();

        for writer in 0..8 {
            let movies = std::sync::Arc::clone(&movies);
            let changes = MovieChanges {
                title: format!("Arrival (cut {writer})"),
                year: 2016,
                runtime: created.runtime,
                genres: vec!["drama".to_owned()],
            };

            writers.spawn(async move {
                movies
                    .update_movie(created.id, Version::INITIAL, &changes)
                    .await
            });
        }

        let mut winners = Vec::new();

        while let Some(outcome) = writers.join_next().await {
            if let Some(version) = outcome?? {
                winners.push(version);
            }
        }

        assert_eq!(winners, vec![Version::new(2)], "exactly one writer may win");

        let retried = movies
            .update_movie(
                created.id,
                Version::new(2),
                &MovieChanges {
                    title: "Arrival".to_owned(),
                    year: 2016,
                    runtime: created.runtime,
                    genres: vec!["drama".to_owned(), "sci-fi".to_owned()],
                },
            )
            .await?;

        assert_eq!(retried, Some(Version::new(3)));

        Ok(())
    }

    #[tokio::test]
    async fn list_filters_sorts_and_counts() -> TestResult {
        let db = TestDb::new().await;
        let movies = PgMoviesRepository::new(db.pool.clone());

        movies
            .insert_movie(&new_movie("The Club", 1986, &["comedy", "drama"]))
            .await?;
        movies
            .insert_movie(&new_movie("The Breakfast Club", 1985, &["drama"]))
            .await?;
        movies
            .insert_movie(&new_movie("Moana", 2016, &["animation"]))
            .await?;

        let query = MovieQuery {
            title: "club".to_owned(),
            genres: vec!["drama".to_owned()],
            page_size: 1,
            sort: Sort {
                field: SortField::Year,
                descending: false,
            },
            ..MovieQuery::default()
        };

        let (page, total) = movies.list_movies(&query).await?;

        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "The Breakfast Club");

        assert_eq!(movies.delete_movie(page[0].id).await?, 1);
        assert_eq!(movies.delete_movie(page[0].id).await?, 0);
        assert!(!movies.movie_exists(page[0].id).await?);

        Ok(())
    }
}
