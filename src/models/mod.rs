pub mod genre;
pub mod history;
pub mod movie;
pub mod search;
pub mod user;

pub use genre::{Genre, GENRES};
pub use history::{NewHistoryEntry, SearchHistoryEntry};
pub use movie::{GenreTag, MovieDetails, MoviePage, MovieSummary, TmdbMovieDetails};
pub use search::{
    CatalogQuery, DiscoveryFilter, RatingRange, SearchFilters, SearchMode, SearchRequest,
    SearchResults, YearRange,
};
pub use user::{Gender, NewUser, PublicUser, User};
