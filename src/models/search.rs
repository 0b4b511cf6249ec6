use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{genre::is_known_genre, MovieSummary},
};

/// Earliest year the catalog has films for
pub const MIN_YEAR: i32 = 1874;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_RATING: f64 = 10.0;
/// Upper bound on how many results one search may ask for
pub const MAX_TARGET: usize = 100;

/// Inclusive release year range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

/// Inclusive vote average range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: MAX_RATING,
        }
    }
}

impl RatingRange {
    pub fn contains(&self, vote_average: f64) -> bool {
        self.min <= vote_average && vote_average <= self.max
    }
}

/// Filters the user applied from the advanced search panel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilters {
    #[serde(default)]
    pub genres: Vec<u32>,
    #[serde(default)]
    pub years: Option<YearRange>,
    #[serde(default)]
    pub rating: RatingRange,
    /// ISO 639-1 original language, e.g. "en"
    #[serde(default)]
    pub language: Option<String>,
    /// ISO 3166-1 release region, e.g. "US"
    #[serde(default)]
    pub region: Option<String>,
}

impl SearchFilters {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(unknown) = self.genres.iter().find(|&&g| !is_known_genre(g)) {
            return Err(AppError::InvalidInput(format!("Unknown genre id {}", unknown)));
        }

        if let Some(years) = self.years {
            if years.from > years.to {
                return Err(AppError::InvalidInput(
                    "Year range start must not be after its end".to_string(),
                ));
            }
            if years.from < MIN_YEAR || years.to > MAX_YEAR {
                return Err(AppError::InvalidInput(format!(
                    "Years must be between {} and {}",
                    MIN_YEAR, MAX_YEAR
                )));
            }
        }

        let rating = self.rating;
        if !(0.0..=MAX_RATING).contains(&rating.min) || !(0.0..=MAX_RATING).contains(&rating.max) {
            return Err(AppError::InvalidInput(
                "Rating bounds must be between 0 and 10".to_string(),
            ));
        }
        if rating.min > rating.max {
            return Err(AppError::InvalidInput(
                "Minimum rating must not exceed maximum rating".to_string(),
            ));
        }

        if let Some(language) = non_blank(&self.language) {
            if language.len() != 2 || !language.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(AppError::InvalidInput(format!(
                    "Invalid language code '{}'",
                    language
                )));
            }
        }

        if let Some(region) = non_blank(&self.region) {
            if region.len() != 2 || !region.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(AppError::InvalidInput(format!(
                    "Invalid region code '{}'",
                    region
                )));
            }
        }

        Ok(())
    }

    /// The part of the filters the catalog applies server-side
    pub fn discovery(&self) -> DiscoveryFilter {
        DiscoveryFilter {
            genres: self.genres.clone(),
            years: self.years,
            language: non_blank(&self.language).map(str::to_string),
            region: non_blank(&self.region).map(str::to_string),
        }
    }
}

/// "Any" arrives as an empty string from some clients
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Search request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Present when the user applied filters, even if all of them are empty
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    /// Number of results wanted; the configured target when absent
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn trimmed_query(&self) -> Option<&str> {
        non_blank(&self.query)
    }
}

/// Which upstream query a search issues
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Discover,
    TitleSearch,
    Trending,
}

impl SearchMode {
    /// Filters win over a title query; trending is the fallback
    pub fn select(request: &SearchRequest) -> Self {
        if request.filters.is_some() {
            SearchMode::Discover
        } else if request.trimmed_query().is_some() {
            SearchMode::TitleSearch
        } else {
            SearchMode::Trending
        }
    }

    /// Whether this mode records an entry in the user's history
    pub fn is_logged(&self) -> bool {
        !matches!(self, SearchMode::Trending)
    }
}

/// Server-side constraints for the discover endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub genres: Vec<u32>,
    pub years: Option<YearRange>,
    pub language: Option<String>,
    pub region: Option<String>,
}

/// A paged query against the movie catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    Discover(DiscoveryFilter),
    Search(String),
    Trending,
}

impl CatalogQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogQuery::Discover(_) => "discover",
            CatalogQuery::Search(_) => "search",
            CatalogQuery::Trending => "trending",
        }
    }
}

/// Outcome of an orchestrated search
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResults {
    pub mode: SearchMode,
    pub movies: Vec<MovieSummary>,
}
