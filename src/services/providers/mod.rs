/// Movie catalog abstraction
///
/// The search orchestrator only needs paged listing queries and single-movie
/// lookups, so any catalog backend (TMDb today) plugs in behind this trait.
use crate::{
    error::AppResult,
    models::{CatalogQuery, MovieDetails, MoviePage},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Remote movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches one page (1-based) of results for `query`
    async fn fetch_page(&self, query: &CatalogQuery, page: u32) -> AppResult<MoviePage>;

    /// Fetches a single movie with credits and keywords
    async fn movie_details(&self, movie_id: u64) -> AppResult<MovieDetails>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
