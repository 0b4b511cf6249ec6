use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Gender, PublicUser};

/// Request body for registration. Everything but the genres is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub favorite_genres: Vec<u32>,
}

/// Request body for login; `identifier` is a username or an email
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfirm {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Plain acknowledgement for flows that return no data
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
