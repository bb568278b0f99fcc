//! Get Movie Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use reel_app::domain::movies::records::{MovieId, MovieRecord};

use crate::{extensions::*, movies::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MovieResponse {
    /// The unique identifier of the movie
    pub id: i64,

    pub title: String,

    /// Release year
    pub year: i32,

    /// Running time, written as `"<n> mins"`
    pub runtime: String,

    pub genres: Vec<String>,

    /// Current record version; send it back as `X-Expected-Version` to guard
    /// an update
    pub version: i32,
}

impl From<MovieRecord> for MovieResponse {
    fn from(movie: MovieRecord) -> Self {
        MovieResponse {
            id: movie.id.into_i64(),
            title: movie.title,
            year: movie.year,
            runtime: movie.runtime.to_string(),
            genres: movie.genres,
            version: movie.version.get(),
        }
    }
}

/// Single movie envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MovieEnvelope {
    pub movie: MovieResponse,
}

impl From<MovieRecord> for MovieEnvelope {
    fn from(movie: MovieRecord) -> Self {
        MovieEnvelope {
            movie: movie.into(),
        }
    }
}

/// Get Movie Handler
///
/// Returns a movie.
#[endpoint(
    tags("movies"),
    summary = "Get Movie",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Movie found"),
        (status_code = StatusCode::NOT_FOUND, description = "Movie not found"),
    ),
)]
pub(crate) async fn handler(
    id: PathParam<i64>,
    depot: &mut Depot,
) -> Result<Json<MovieEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let movie = state
        .app
        .movies
        .get_movie(MovieId::from_i64(id.into_inner()))
        .await
        .map_err(|error| into_status_error("movies.get", &error))?;

    Ok(Json(movie.into()))
}
