use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{MovieDetails, MovieSummary, SearchMode, SearchRequest},
    services::{movies, search},
};

use super::AppState;

pub const NO_RESULTS_MESSAGE: &str = "No movies found for your search.";

/// A search hit with its ready-to-render poster thumbnail
#[derive(Debug, Serialize)]
pub struct MovieCard {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub poster_url: Option<String>,
}

impl From<MovieSummary> for MovieCard {
    fn from(movie: MovieSummary) -> Self {
        Self {
            poster_url: movie.poster_url(),
            movie,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub mode: SearchMode,
    pub results: Vec<MovieCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Runs an orchestrated search for the caller
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    let target = request.limit.unwrap_or(state.search_target);

    let outcome = search::search(
        state.catalog.as_ref(),
        state.history.as_ref(),
        user_id,
        &request,
        target,
    )
    .await
    .map_err(upstream_search_error)?;

    // Trending with nothing in it is not worth a message
    let message = (outcome.movies.is_empty() && outcome.mode.is_logged())
        .then_some(NO_RESULTS_MESSAGE);

    Ok(Json(SearchResponse {
        mode: outcome.mode,
        results: outcome.movies.into_iter().map(MovieCard::from).collect(),
        message,
    }))
}

pub async fn details(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MovieDetails>> {
    let details = movies::movie_details(
        state.catalog.as_ref(),
        &state.cache,
        state.history.as_ref(),
        user_id,
        movie_id,
    )
    .await?;
    Ok(Json(details))
}

fn upstream_search_error(error: AppError) -> AppError {
    match error {
        AppError::ExternalApi(msg) => AppError::ExternalApi(format!("Movie search failed: {}", msg)),
        AppError::HttpClient(e) => AppError::ExternalApi(format!("Movie search failed: {}", e)),
        other => other,
    }
}
