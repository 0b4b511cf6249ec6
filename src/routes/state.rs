use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::JwtKeys,
    db::{Cache, HistoryRepository, ResetCodeStore, UserRepository},
    services::{CatalogSource, Mailer},
};

/// Shared handles cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogSource>,
    pub users: Arc<dyn UserRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub reset_codes: Arc<dyn ResetCodeStore>,
    pub mailer: Arc<dyn Mailer>,
    pub cache: Cache,
    pub jwt: JwtKeys,
    /// Results a search collects when the request does not set a limit
    pub search_target: usize,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
