/// TMDb (The Movie Database) v3 provider
///
/// Endpoints used:
/// 1. `/search/movie` for free-text title search
/// 2. `/discover/movie` for genre/year/language/region filtered listings
/// 3. `/trending/movie/week` for the default listing
/// 4. `/movie/{id}` with credits and keywords appended for details
///
/// The API key travels as the `api_key` query parameter.
use crate::{
    error::{AppError, AppResult},
    models::{CatalogQuery, DiscoveryFilter, MovieDetails, MoviePage, TmdbMovieDetails},
    services::providers::CatalogSource,
};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Path and query parameters for one page of a listing query
    fn page_request(query: &CatalogQuery, page: u32) -> (&'static str, Vec<(&'static str, String)>) {
        let mut params = Vec::new();

        let path = match query {
            CatalogQuery::Search(text) => {
                params.push(("query", text.clone()));
                "/search/movie"
            }
            CatalogQuery::Discover(filter) => {
                params.extend(Self::discover_params(filter));
                "/discover/movie"
            }
            CatalogQuery::Trending => "/trending/movie/week",
        };

        params.push(("page", page.to_string()));
        (path, params)
    }

    fn discover_params(filter: &DiscoveryFilter) -> Vec<(&'static str, String)> {
        let mut params = vec![("sort_by", "popularity.desc".to_string())];

        if !filter.genres.is_empty() {
            let genres = filter
                .genres
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("with_genres", genres));
        }

        if let Some(years) = filter.years {
            params.push(("primary_release_date.gte", format!("{:04}-01-01", years.from)));
            params.push(("primary_release_date.lte", format!("{:04}-12-31", years.to)));
        }

        if let Some(language) = &filter.language {
            params.push(("with_original_language", language.clone()));
        }

        if let Some(region) = &filter.region {
            params.push(("region", region.clone()));
        }

        params
    }

    async fn send(&self, path: &str, params: &[(&str, String)]) -> AppResult<Response> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %path, "TMDb request failed");
                e
            })?;
        Ok(response)
    }

    /// Decodes a successful response; any other status is an upstream failure
    async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "TMDb API request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDb API returned status {}",
                status
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDb response");
            AppError::ExternalApi(format!("Failed to parse TMDb response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogSource for TmdbProvider {
    async fn fetch_page(&self, query: &CatalogQuery, page: u32) -> AppResult<MoviePage> {
        let (path, params) = Self::page_request(query, page);
        let response = self.send(path, &params).await?;
        let movie_page: MoviePage = Self::read_json(path, response).await?;

        tracing::debug!(
            kind = query.kind(),
            page = movie_page.page,
            total_pages = movie_page.total_pages,
            results = movie_page.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(movie_page)
    }

    async fn movie_details(&self, movie_id: u64) -> AppResult<MovieDetails> {
        let path = format!("/movie/{}", movie_id);
        let params = [("append_to_response", "credits,keywords".to_string())];

        let response = self.send(&path, &params).await?;
        // Only an unknown id is a 404 here; listings treat it as an outage
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
        }
        let details: TmdbMovieDetails = Self::read_json(&path, response).await?;

        tracing::info!(movie_id, provider = "tmdb", "Movie details fetched");

        Ok(details.into())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearRange;

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_search_request() {
        let (path, params) = TmdbProvider::page_request(&CatalogQuery::Search("alien".into()), 2);
        assert_eq!(path, "/search/movie");
        assert_eq!(param(&params, "query"), Some("alien"));
        assert_eq!(param(&params, "page"), Some("2"));
    }

    #[test]
    fn test_trending_request() {
        let (path, params) = TmdbProvider::page_request(&CatalogQuery::Trending, 1);
        assert_eq!(path, "/trending/movie/week");
        assert_eq!(params, vec![("page", "1".to_string())]);
    }

    #[test]
    fn test_discover_request_with_all_filters() {
        let filter = DiscoveryFilter {
            genres: vec![28, 878],
            years: Some(YearRange { from: 1999, to: 2003 }),
            language: Some("en".into()),
            region: Some("US".into()),
        };

        let (path, params) = TmdbProvider::page_request(&CatalogQuery::Discover(filter), 3);
        assert_eq!(path, "/discover/movie");
        assert_eq!(param(&params, "sort_by"), Some("popularity.desc"));
        assert_eq!(param(&params, "with_genres"), Some("28,878"));
        assert_eq!(param(&params, "primary_release_date.gte"), Some("1999-01-01"));
        assert_eq!(param(&params, "primary_release_date.lte"), Some("2003-12-31"));
        assert_eq!(param(&params, "with_original_language"), Some("en"));
        assert_eq!(param(&params, "region"), Some("US"));
        assert_eq!(param(&params, "page"), Some("3"));
    }

    #[test]
    fn test_discover_request_without_filters() {
        let (_, params) =
            TmdbProvider::page_request(&CatalogQuery::Discover(DiscoveryFilter::default()), 1);
        assert_eq!(param(&params, "with_genres"), None);
        assert_eq!(param(&params, "primary_release_date.gte"), None);
        assert_eq!(param(&params, "region"), None);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = TmdbProvider::new(
            "key".into(),
            "http://localhost:9999/3/".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(provider.api_url, "http://localhost:9999/3");
    }
}
