use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewHistoryEntry, SearchHistoryEntry},
};

/// Append-only log of what each user searched for or opened
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<SearchHistoryEntry>;

    /// Most recent entries first
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<SearchHistoryEntry>>;
}

#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<SearchHistoryEntry> {
        let row = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            INSERT INTO search_history (id, user_id, query, genres, year, movie_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, query, genres, year, movie_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.query)
        .bind(entry.genres)
        .bind(entry.year)
        .bind(entry.movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<SearchHistoryEntry>> {
        let rows = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            SELECT id, user_id, query, genres, year, movie_id, created_at
            FROM search_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
