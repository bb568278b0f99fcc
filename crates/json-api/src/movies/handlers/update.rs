//! Update Movie Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use reel_app::{
    concurrency::Version,
    domain::movies::{data::MovieUpdate, records::MovieId},
};

use crate::{
    extensions::*,
    movies::{errors::into_status_error, get::MovieEnvelope, handlers::parse_runtime},
    state::State,
};

/// Optional header carrying the version the client last read.
pub(crate) const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Update Movie Request
///
/// Absent fields keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateMovieRequest {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<String>,

    #[salvo(schema(value_type = Option<Vec<String>>))]
    pub genres: Option<SmallVec<[String; 5]>>,
}

impl UpdateMovieRequest {
    fn into_update(self, expected_version: Option<Version>) -> Result<MovieUpdate, StatusError> {
        Ok(MovieUpdate {
            title: self.title,
            year: self.year,
            runtime: self.runtime.as_deref().map(parse_runtime).transpose()?,
            genres: self.genres.map(SmallVec::into_vec),
            expected_version,
        })
    }
}

fn expected_version(req: &Request) -> Result<Option<Version>, StatusError> {
    let Some(value) = req.headers().get(EXPECTED_VERSION_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i32>().ok())
        .map(|version| Some(Version::new(version)))
        .ok_or_else(|| StatusError::bad_request().brief("invalid X-Expected-Version header"))
}

/// Update Movie Handler
///
/// Applies a partial update guarded by the record version.
#[endpoint(
    tags("movies"),
    summary = "Update Movie",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Movie updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Movie not found"),
        (status_code = StatusCode::CONFLICT, description = "Edit conflict"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid movie"),
    ),
)]
#[tracing::instrument(
    name = "movies.update",
    skip(req, id, json, depot),
    fields(movie_id = tracing::field::Empty, expected_version = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    id: PathParam<i64>,
    json: JsonBody<UpdateMovieRequest>,
    depot: &mut Depot,
) -> Result<Json<MovieEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = MovieId::from_i64(id.into_inner());
    let expected_version = expected_version(req)?;

    let span = tracing::Span::current();
    span.record("movie_id", id.into_i64());

    if let Some(version) = expected_version {
        span.record("expected_version", version.get());
    }

    let update = json.into_inner().into_update(expected_version)?;

    let movie = state
        .app
        .movies
        .update_movie(id, update)
        .await
        .map_err(|error| into_status_error("movies.update", &error))?;

    Ok(Json(movie.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use reel_app::domain::movies::{MockMoviesService, MoviesServiceError};

    use crate::test_helpers::{make_movie, movies_service};

    use super::*;

    fn make_service(movies: MockMoviesService) -> Service {
        movies_service(movies, Router::with_path("movies/{id}").patch(handler))
    }

    #[tokio::test]
    async fn test_partial_update_returns_new_version() -> TestResult {
        let mut updated = make_movie(4)?;
        updated.year = 1943;
        updated.version = Version::new(2);

        let mut movies = MockMoviesService::new();

        movies
            .expect_update_movie()
            .once()
            .withf(|id, update| {
                id.into_i64() == 4
                    && update.year == Some(1943)
                    && update.title.is_none()
                    && update.runtime.is_none()
                    && update.expected_version.is_none()
            })
            .return_once(move |_, _| Ok(updated));

        let mut res = TestClient::patch("http://example.com/movies/4")
            .json(&json!({ "year": 1943 }))
            .send(&make_service(movies))
            .await;

        let body: MovieEnvelope = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.movie.year, 1943);
        assert_eq!(body.movie.version, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_expected_version_header_is_forwarded() -> TestResult {
        let movie = make_movie(4)?;

        let mut movies = MockMoviesService::new();

        movies
            .expect_update_movie()
            .once()
            .withf(|_, update| update.expected_version == Some(Version::new(3)))
            .return_once(move |_, _| Ok(movie));

        let res = TestClient::patch("http://example.com/movies/4")
            .add_header(EXPECTED_VERSION_HEADER, "3", true)
            .json(&json!({ "title": "Casablanca" }))
            .send(&make_service(movies))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_garbled_expected_version_returns_400() -> TestResult {
        let mut movies = MockMoviesService::new();

        movies.expect_update_movie().never();

        let res = TestClient::patch("http://example.com/movies/4")
            .add_header(EXPECTED_VERSION_HEADER, "three", true)
            .json(&json!({ "title": "Casablanca" }))
            .send(&make_service(movies))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_version_conflict_returns_409() -> TestResult {
        let mut movies = MockMoviesService::new();

        movies
            .expect_update_movie()
            .once()
            .return_once(|_, _| Err(MoviesServiceError::Conflict));

        let mut res = TestClient::patch("http://example.com/movies/4")
            .json(&json!({ "title": "Casablanca" }))
            .send(&make_service(movies))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert!(res.take_string().await?.contains("edit conflict, retry"));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_of_missing_movie_returns_404() -> TestResult {
        let mut movies = MockMoviesService::new();

        movies
            .expect_update_movie()
            .once()
            .return_once(|_, _| Err(MoviesServiceError::NotFound));

        let res = TestClient::patch("http://example.com/movies/99")
            .json(&json!({ "title": "Casablanca" }))
            .send(&make_service(movies))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
