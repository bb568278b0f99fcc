//! Delete Movie Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use reel_app::domain::movies::records::MovieId;

use crate::{extensions::*, movies::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MovieDeletedResponse {
    pub message: String,
}

/// Delete Movie Handler
#[endpoint(
    tags("movies"),
    summary = "Delete Movie",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Movie deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Movie not found"),
    ),
)]
pub(crate) async fn handler(
    id: PathParam<i64>,
    depot: &mut Depot,
) -> Result<Json<MovieDeletedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .movies
        .delete_movie(MovieId::from_i64(id.into_inner()))
        .await
        .map_err(|error| into_status_error("movies.delete", &error))?;

    Ok(Json(MovieDeletedResponse {
        message: "movie successfully deleted".to_owned(),
    }))
}
