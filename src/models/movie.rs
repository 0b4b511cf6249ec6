use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Base URL for poster thumbnails served by the TMDb image CDN
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w200";

/// Number of cast members kept on movie details
const MAIN_CAST_LIMIT: usize = 5;

/// A movie as listed by the catalog's search, discover and trending endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
}

impl MovieSummary {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|path| format!("{}{}", POSTER_BASE_URL, path))
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MoviePage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

fn first_page() -> u32 {
    1
}

impl MoviePage {
    /// Whether the source has pages after this one
    pub fn has_more(&self) -> bool {
        !self.results.is_empty() && self.page < self.total_pages
    }
}

/// Full movie record returned by the details endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub runtime: Option<u32>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<GenreTag>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub poster_path: Option<String>,
    pub main_cast: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreTag {
    pub id: u32,
    pub name: String,
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// Raw response from GET /movie/{id}?append_to_response=credits,keywords
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genres: Vec<GenreTag>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub keywords: Option<TmdbKeywords>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub keywords: Vec<TmdbKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

impl From<TmdbMovieDetails> for MovieDetails {
    fn from(details: TmdbMovieDetails) -> Self {
        let mut cast = details.credits.map(|c| c.cast).unwrap_or_default();
        // Billing order; members without one go last
        cast.sort_by_key(|member| member.order.unwrap_or(u32::MAX));

        MovieDetails {
            id: details.id,
            title: details.title,
            overview: details.overview.filter(|o| !o.is_empty()),
            tagline: details.tagline.filter(|t| !t.is_empty()),
            runtime: details.runtime,
            release_date: details.release_date,
            genres: details.genres,
            vote_average: details.vote_average,
            vote_count: details.vote_count,
            poster_path: details.poster_path,
            main_cast: cast
                .into_iter()
                .take(MAIN_CAST_LIMIT)
                .map(|member| member.name)
                .collect(),
            keywords: details
                .keywords
                .map(|k| k.keywords.into_iter().map(|kw| kw.name).collect())
                .unwrap_or_default(),
        }
    }
}

/// TMDb sends `""` or `null` for unknown release dates
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}
