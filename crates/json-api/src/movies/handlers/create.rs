//! Create Movie Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use reel_app::domain::{movies::data::NewMovie, validation::Violations};

use crate::{
    errors::invalid,
    extensions::*,
    movies::{errors::into_status_error, get::MovieEnvelope, handlers::parse_runtime},
    state::State,
};

/// Create Movie Request
///
/// Missing fields are reported by validation rather than rejected as
/// undecodable.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct CreateMovieRequest {
    pub title: String,
    pub year: i32,
    pub runtime: Option<String>,

    #[salvo(schema(value_type = Vec<String>))]
    pub genres: SmallVec<[String; 5]>,
}

impl TryFrom<CreateMovieRequest> for NewMovie {
    type Error = StatusError;

    fn try_from(request: CreateMovieRequest) -> Result<Self, Self::Error> {
        let Some(runtime) = request.runtime else {
            return Err(invalid(&Violations::single("runtime", "must be provided")));
        };

        Ok(NewMovie {
            title: request.title,
            year: request.year,
            runtime: parse_runtime(&runtime)?,
            genres: request.genres.into_vec(),
        })
    }
}

/// Create Movie Handler
#[endpoint(
    tags("movies"),
    summary = "Create Movie",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Movie created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid movie"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "movies.create",
    skip(json, depot, res),
    fields(movie_id = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateMovieRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<MovieEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let movie = NewMovie::try_from(json.into_inner())?;

    let created = state
        .app
        .movies
        .create_movie(movie)
        .await
        .map_err(|error| into_status_error("movies.create", &error))?;

    tracing::Span::current().record("movie_id", created.id.into_i64());

    res.add_header(LOCATION, format!("/v1/movies/{}", created.id), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(created.into()))
}
