use chrono::Utc;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PasswordResetConfirm, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    db::{ResetCodeStore, UserRepository},
    error::{AppError, AppResult},
    models::{genre::is_known_genre, NewUser, PublicUser},
    services::mailer::Mailer,
};

/// Reset codes expire after 10 minutes
pub const RESET_CODE_TTL_SECS: u64 = 600;
pub const MIN_PASSWORD_LEN: usize = 8;

const BAD_CREDENTIALS: &str = "Invalid username/email or password.";
const BAD_RESET_CODE: &str = "Invalid or expired OTP.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Six digit numeric code
pub fn generate_reset_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub async fn register(users: &dyn UserRepository, request: RegisterRequest) -> AppResult<PublicUser> {
    let username = required("username", &request.username)?;
    let name = required("name", &request.name)?;
    let phone = required("phone", &request.phone)?;
    let address = required("address", &request.address)?;
    let email = normalize_email(&request.email);

    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }
    check_password(&request.password)?;
    if request.date_of_birth > Utc::now().date_naive() {
        return Err(AppError::InvalidInput(
            "Date of birth cannot be in the future".to_string(),
        ));
    }
    if let Some(unknown) = request.favorite_genres.iter().find(|&&g| !is_known_genre(g)) {
        return Err(AppError::InvalidInput(format!("Unknown genre id {}", unknown)));
    }

    if users.username_exists(&username).await? {
        return Err(AppError::Conflict("Username already exists.".to_string()));
    }
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered.".to_string()));
    }

    let user = users
        .insert(NewUser {
            username,
            email,
            name,
            phone,
            address,
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            favorite_genres: request.favorite_genres.iter().map(|&g| g as i32).collect(),
            password_hash: hash_password(&request.password)?,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(PublicUser::from(&user))
}

pub async fn login(
    users: &dyn UserRepository,
    keys: &JwtKeys,
    request: LoginRequest,
) -> AppResult<AuthResponse> {
    let identifier = request.identifier.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let Some(user) = users.find_by_identifier(identifier).await? else {
        tracing::info!("Login rejected: unknown identifier");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let access_token = keys.sign(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer",
        user: PublicUser::from(&user),
    })
}

/// Issues a reset code for a registered email and mails it
pub async fn initiate_password_reset(
    users: &dyn UserRepository,
    codes: &dyn ResetCodeStore,
    mailer: &dyn Mailer,
    email: &str,
) -> AppResult<()> {
    let email = normalize_email(email);

    let Some(user) = users.find_by_email(&email).await? else {
        return Err(AppError::NotFound("Email not found.".to_string()));
    };

    let code = generate_reset_code();
    codes.issue(&email, &code, RESET_CODE_TTL_SECS).await?;
    mailer.send_reset_code(&email, &code).await?;

    tracing::info!(user_id = %user.id, "Password reset code issued");
    Ok(())
}

/// Sets a new password if `code` is the live reset code for the email
///
/// The code is only consumed once the new hash is stored, so a failed write
/// leaves it usable for another attempt.
pub async fn reset_password(
    users: &dyn UserRepository,
    codes: &dyn ResetCodeStore,
    request: PasswordResetConfirm,
) -> AppResult<()> {
    let email = normalize_email(&request.email);
    let code = request.code.trim();

    check_password(&request.new_password)?;

    if code.is_empty() || !codes.matches(&email, code).await? {
        return Err(AppError::InvalidInput(BAD_RESET_CODE.to_string()));
    }

    let password_hash = hash_password(&request.new_password)?;
    if !users.update_password(&email, &password_hash).await? {
        return Err(AppError::NotFound("Email not found.".to_string()));
    }

    match codes.consume(&email, code).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(email = %email, "Reset code was already consumed"),
        Err(e) => tracing::warn!(error = %e, email = %email, "Failed to consume reset code"),
    }

    tracing::info!(email = %email, "Password reset completed");
    Ok(())
}
