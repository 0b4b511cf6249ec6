//! In-memory stand-ins for the stores, catalog and mailer behind `AppState`.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use cinematch_api::{
    auth::JwtKeys,
    db::{create_redis_client, Cache, HistoryRepository, ResetCodeStore, UserRepository},
    error::{AppError, AppResult},
    models::{
        CatalogQuery, MovieDetails, MoviePage, MovieSummary, NewHistoryEntry, NewUser,
        SearchHistoryEntry, User,
    },
    routes::{create_router, AppState},
    services::{CatalogSource, Mailer},
};

pub const JWT_SECRET: &str = "integration-secret";

pub fn movie(id: u64, vote_average: f64, vote_count: u64) -> MovieSummary {
    MovieSummary {
        id,
        title: format!("Movie {}", id),
        poster_path: Some(format!("/poster{}.jpg", id)),
        genre_ids: vec![28],
        vote_average,
        vote_count,
        release_date: None,
    }
}

/// Serves a fixed list of movies in pages of `page_size`
pub struct FakeCatalog {
    movies: Vec<MovieSummary>,
    page_size: usize,
    fail: bool,
    pub calls: Mutex<Vec<(String, u32)>>,
}

impl FakeCatalog {
    pub fn with_movies(movies: Vec<MovieSummary>, page_size: usize) -> Self {
        Self {
            movies,
            page_size,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_movies(Vec::new(), 20)
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_page(&self, query: &CatalogQuery, page: u32) -> AppResult<MoviePage> {
        self.calls
            .lock()
            .unwrap()
            .push((query.kind().to_string(), page));

        if self.fail {
            return Err(AppError::ExternalApi(
                "TMDb API returned status 503 Service Unavailable".to_string(),
            ));
        }

        let total_pages = self.movies.len().div_ceil(self.page_size).max(1) as u32;
        let results = self
            .movies
            .chunks(self.page_size)
            .nth(page as usize - 1)
            .map(<[MovieSummary]>::to_vec)
            .unwrap_or_default();

        Ok(MoviePage {
            page,
            results,
            total_pages,
            total_results: self.movies.len() as u64,
        })
    }

    async fn movie_details(&self, movie_id: u64) -> AppResult<MovieDetails> {
        let summary = self
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

        Ok(MovieDetails {
            id: summary.id,
            title: summary.title.clone(),
            overview: Some("A heist goes wrong.".to_string()),
            tagline: None,
            runtime: Some(120),
            release_date: summary.release_date,
            genres: vec![],
            vote_average: summary.vote_average,
            vote_count: summary.vote_count,
            poster_path: summary.poster_path.clone(),
            main_cast: vec!["Lead Actor".to_string()],
            keywords: vec!["heist".to_string()],
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let email = identifier.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == identifier || u.email == email)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username))
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("Username already exists.".to_string()));
        }

        let stored = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            name: user.name,
            phone: user.phone,
            address: user.address,
            date_of_birth: user.date_of_birth,
            gender: user.gender.as_str().to_string(),
            favorite_genres: user.favorite_genres,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> AppResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryHistory {
    pub entries: Mutex<Vec<SearchHistoryEntry>>,
}

#[async_trait::async_trait]
impl HistoryRepository for InMemoryHistory {
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<SearchHistoryEntry> {
        let stored = SearchHistoryEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            query: entry.query,
            genres: entry.genres,
            year: entry.year,
            movie_id: entry.movie_id,
            created_at: Utc::now(),
        };
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<SearchHistoryEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Codes never expire here; only replacement and consumption are modelled
#[derive(Default)]
pub struct InMemoryResetCodes {
    codes: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl ResetCodeStore for InMemoryResetCodes {
    async fn issue(&self, email: &str, code: &str, _ttl_secs: u64) -> AppResult<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }

    async fn matches(&self, email: &str, code: &str) -> AppResult<bool> {
        Ok(self.codes.lock().unwrap().get(email).map(String::as_str) == Some(code))
    }

    async fn consume(&self, email: &str, code: &str) -> AppResult<bool> {
        let mut codes = self.codes.lock().unwrap();
        if codes.get(email).map(String::as_str) == Some(code) {
            codes.remove(email);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Keeps every code it was asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_code(&self, to: &str, code: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<FakeCatalog>,
    pub history: Arc<InMemoryHistory>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new(catalog: FakeCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let history = Arc::new(InMemoryHistory::default());
        let mailer = Arc::new(RecordingMailer::default());

        // Nothing listens on port 1, so every cache read misses
        let redis = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(redis);

        let state = AppState {
            catalog: catalog.clone(),
            users: Arc::new(InMemoryUsers::default()),
            history: history.clone(),
            reset_codes: Arc::new(InMemoryResetCodes::default()),
            mailer: mailer.clone(),
            cache,
            jwt: JwtKeys::new(JWT_SECRET, 5),
            search_target: 50,
        };

        Self {
            router: create_router(state),
            catalog,
            history,
            mailer,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Registers a user and returns an access token for them
    pub async fn signed_in(&self, username: &str) -> String {
        let (status, _) = self
            .request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(registration(username, "correct-horse-battery")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({
                    "identifier": username,
                    "password": "correct-horse-battery",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn registration(username: &str, password: &str) -> Value {
    serde_json::json!({
        "username": username,
        "name": "Test User",
        "phone": "555-0100",
        "email": format!("{}@example.com", username),
        "address": "1 Main St",
        "password": password,
        "date_of_birth": "1990-05-17",
        "gender": "Other",
        "favorite_genres": [28, 18],
    })
}
