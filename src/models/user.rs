use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account as stored in the `users` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub favorite_genres: Vec<i32>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
    #[serde(alias = "Other")]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Fields needed to insert a user; the password is already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub favorite_genres: Vec<i32>,
    pub password_hash: String,
}

/// User profile returned to clients (no credentials)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub favorite_genres: Vec<i32>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            date_of_birth: user.date_of_birth,
            gender: user.gender.clone(),
            favorite_genres: user.favorite_genres.clone(),
        }
    }
}
