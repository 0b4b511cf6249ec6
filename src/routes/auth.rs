use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PasswordResetConfirm,
            PasswordResetRequest, RegisterRequest,
        },
        services, AuthUser,
    },
    error::{AppError, AppResult},
    models::PublicUser,
};

use super::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = services::register(state.users.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = services::login(state.users.as_ref(), &state.jwt, request).await?;
    Ok(Json(response))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::initiate_password_reset(
        state.users.as_ref(),
        state.reset_codes.as_ref(),
        state.mailer.as_ref(),
        &request.email,
    )
    .await?;
    Ok(Json(MessageResponse::new(
        "OTP sent to email (valid for 10 minutes).",
    )))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirm>,
) -> AppResult<Json<MessageResponse>> {
    services::reset_password(state.users.as_ref(), state.reset_codes.as_ref(), request).await?;
    Ok(Json(MessageResponse::new("Password reset successful.")))
}

/// Profile of the token's owner
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    Ok(Json(PublicUser::from(&user)))
}
