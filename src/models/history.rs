use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One row of a user's append-only search history
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query: Option<String>,
    pub genres: Option<Vec<i32>>,
    pub year: Option<i32>,
    pub movie_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A history record before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub user_id: Uuid,
    pub query: Option<String>,
    pub genres: Option<Vec<i32>>,
    pub year: Option<i32>,
    pub movie_id: Option<i64>,
}

impl NewHistoryEntry {
    pub fn title_search(user_id: Uuid, query: &str) -> Self {
        Self {
            user_id,
            query: Some(query.to_string()),
            genres: None,
            year: None,
            movie_id: None,
        }
    }

    pub fn discovery(user_id: Uuid, genres: &[u32], year: Option<i32>) -> Self {
        let genres = (!genres.is_empty()).then(|| genres.iter().map(|&g| g as i32).collect());
        Self {
            user_id,
            query: None,
            genres,
            year,
            movie_id: None,
        }
    }

    pub fn movie_view(user_id: Uuid, movie_id: u64) -> Self {
        Self {
            user_id,
            query: None,
            genres: None,
            year: None,
            movie_id: Some(movie_id as i64),
        }
    }
}
