use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    db::HistoryRepository,
    error::{AppError, AppResult},
    models::{
        search::MAX_TARGET, CatalogQuery, MovieSummary, NewHistoryEntry, RatingRange,
        SearchMode, SearchRequest, SearchResults,
    },
    services::providers::CatalogSource,
};

/// TMDb refuses page numbers above this
pub const MAX_PAGES: u32 = 500;

/// Runs one user search end to end
///
/// Picks the query mode (filters, then title, then trending), pages through
/// the catalog until `target` results are collected or the catalog runs out,
/// drops results outside the rating range when filters were applied, and
/// orders by vote count. Title searches and filtered searches are written to
/// the user's history whether or not the catalog answered.
///
/// A catalog failure on any page fails the whole search; partial results are
/// never returned.
pub async fn search(
    catalog: &dyn CatalogSource,
    history: &dyn HistoryRepository,
    user_id: Uuid,
    request: &SearchRequest,
    target: usize,
) -> AppResult<SearchResults> {
    if !(1..=MAX_TARGET).contains(&target) {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_TARGET
        )));
    }

    let mode = SearchMode::select(request);

    let (query, rating, entry) = match (mode, &request.filters) {
        (SearchMode::Discover, Some(filters)) => {
            filters.validate()?;
            let entry = NewHistoryEntry::discovery(
                user_id,
                &filters.genres,
                filters.years.map(|y| y.from),
            );
            (
                CatalogQuery::Discover(filters.discovery()),
                Some(filters.rating),
                Some(entry),
            )
        }
        (SearchMode::TitleSearch, _) => {
            let text = request.trimmed_query().unwrap_or_default();
            (
                CatalogQuery::Search(text.to_string()),
                None,
                Some(NewHistoryEntry::title_search(user_id, text)),
            )
        }
        _ => (CatalogQuery::Trending, None, None),
    };

    let fetched = collect_pages(catalog, &query, target).await;

    if let Some(entry) = entry {
        record_history(history, entry).await;
    }

    let mut movies = fetched.map_err(|e| {
        tracing::warn!(error = %e, kind = query.kind(), user_id = %user_id, "Search failed");
        e
    })?;

    if let Some(range) = rating {
        apply_rating_filter(&mut movies, range);
    }
    sort_by_popularity(&mut movies);

    tracing::info!(
        user_id = %user_id,
        mode = ?mode,
        results = movies.len(),
        "Search completed"
    );

    Ok(SearchResults { mode, movies })
}

/// Fetches pages starting at 1 until `target` movies are collected or the
/// catalog has nothing more; the result is truncated to `target`
pub async fn collect_pages(
    catalog: &dyn CatalogSource,
    query: &CatalogQuery,
    target: usize,
) -> AppResult<Vec<MovieSummary>> {
    let mut movies: Vec<MovieSummary> = Vec::with_capacity(target);
    let mut seen = HashSet::new();
    let mut page = 1;

    loop {
        let batch = catalog.fetch_page(query, page).await?;
        let has_more = batch.has_more();

        // Popularity ordering can shift between requests, repeating a movie
        movies.extend(batch.results.into_iter().filter(|m| seen.insert(m.id)));

        if movies.len() >= target || !has_more || page >= MAX_PAGES {
            break;
        }
        page += 1;
    }

    tracing::debug!(
        kind = query.kind(),
        pages = page,
        collected = movies.len(),
        target,
        "Pagination finished"
    );

    movies.truncate(target);
    Ok(movies)
}

pub fn apply_rating_filter(movies: &mut Vec<MovieSummary>, range: RatingRange) {
    movies.retain(|m| range.contains(m.vote_average));
}

/// Most-voted first; ties keep catalog order
pub fn sort_by_popularity(movies: &mut [MovieSummary]) {
    movies.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
}

async fn record_history(history: &dyn HistoryRepository, entry: NewHistoryEntry) {
    let user_id = entry.user_id;
    if let Err(e) = history.append(entry).await {
        tracing::warn!(error = %e, user_id = %user_id, "Failed to record search history");
    }
}
