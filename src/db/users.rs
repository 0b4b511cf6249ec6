use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::postgres::is_unique_violation,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

const USER_COLUMNS: &str = "id, username, email, name, phone, address, date_of_birth, gender, \
                            favorite_genres, password_hash, created_at";

/// Credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user whose username or email equals `identifier`
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    /// Inserts a user; a duplicate username or email is a `Conflict`
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    /// Replaces the password hash; returns false when no user has that email
    async fn update_password(&self, email: &str, password_hash: &str) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = lower($1) LIMIT 1",
            USER_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (id, username, email, name, phone, address, date_of_birth, gender,
                 favorite_genres, password_hash)
            VALUES ($1, $2, lower($3), $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.date_of_birth)
        .bind(user.gender.as_str())
        .bind(&user.favorite_genres)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "Username or email already registered.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = lower($1)")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
