//! Movie Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use reel_app::domain::{
    movies::filters::{Metadata, MovieQuery, Sort},
    validation::Violations,
};

use crate::{
    errors::invalid,
    extensions::*,
    movies::{errors::into_status_error, get::MovieResponse},
    state::State,
};

/// Pagination metadata. Fields are omitted when nothing matched.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct MetadataResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
}

impl From<Metadata> for MetadataResponse {
    fn from(metadata: Metadata) -> Self {
        if metadata.total_records == 0 {
            return Self::default();
        }

        Self {
            current_page: Some(metadata.current_page),
            page_size: Some(metadata.page_size),
            first_page: Some(metadata.first_page),
            last_page: Some(metadata.last_page),
            total_records: Some(metadata.total_records),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MoviesResponse {
    /// The requested page of movies
    pub movies: Vec<MovieResponse>,

    pub metadata: MetadataResponse,
}

fn build_query(
    title: Option<String>,
    genres: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    sort: Option<String>,
) -> Result<MovieQuery, StatusError> {
    let defaults = MovieQuery::default();

    let sort = match sort.as_deref() {
        None | Some("") => defaults.sort,
        Some(value) => value
            .parse::<Sort>()
            .map_err(|_unknown| invalid(&Violations::single("sort", "invalid sort value")))?,
    };

    let genres = genres
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(MovieQuery {
        title: title.unwrap_or_default(),
        genres,
        page: page.unwrap_or(defaults.page),
        page_size: page_size.unwrap_or(defaults.page_size),
        sort,
    })
}

/// Movie Index Handler
///
/// Returns a filtered, sorted page of movies.
#[endpoint(
    tags("movies"),
    summary = "List Movies",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "A page of movies"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid filters"),
    ),
)]
pub(crate) async fn handler(
    title: QueryParam<String, false>,
    genres: QueryParam<String, false>,
    page: QueryParam<u32, false>,
    page_size: QueryParam<u32, false>,
    sort: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<MoviesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let query = build_query(
        title.into_inner(),
        genres.into_inner(),
        page.into_inner(),
        page_size.into_inner(),
        sort.into_inner(),
    )?;

    let page = state
        .app
        .movies
        .list_movies(query)
        .await
        .map_err(|error| into_status_error("movies.list", &error))?;

    Ok(Json(MoviesResponse {
        movies: page.movies.into_iter().map(Into::into).collect(),
        metadata: page.metadata.into(),
    }))
}
