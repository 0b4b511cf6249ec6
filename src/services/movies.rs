use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey, HistoryRepository},
    error::{AppError, AppResult},
    models::{MovieDetails, NewHistoryEntry},
    services::providers::CatalogSource,
};

const DETAILS_CACHE_TTL: u64 = 86400; // 1 day

/// Looks up one movie and records the view in the user's history
pub async fn movie_details(
    catalog: &dyn CatalogSource,
    cache: &Cache,
    history: &dyn HistoryRepository,
    user_id: Uuid,
    movie_id: u64,
) -> AppResult<MovieDetails> {
    if movie_id == 0 {
        return Err(AppError::InvalidInput("Movie id must be positive".to_string()));
    }

    let details = cached_details(catalog, cache, movie_id).await?;

    if let Err(e) = history
        .append(NewHistoryEntry::movie_view(user_id, movie_id))
        .await
    {
        tracing::warn!(error = %e, user_id = %user_id, movie_id, "Failed to record movie view");
    }

    Ok(details)
}

async fn cached_details(
    catalog: &dyn CatalogSource,
    cache: &Cache,
    movie_id: u64,
) -> AppResult<MovieDetails> {
    cached!(
        cache,
        CacheKey::MovieDetails(movie_id),
        DETAILS_CACHE_TTL,
        catalog.movie_details(movie_id)
    )
}
