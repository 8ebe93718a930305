use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{info, warn};

use chirpy_auth::{ACCESS_TOKEN_TTL, AuthError, REFRESH_TOKEN_TTL};
use chirpy_types::api::{CredentialsRequest, LoginResponse, RefreshResponse, User};

use crate::error::ApiError;
use crate::extract::BearerToken;
use crate::state::{AppState, run_blocking};

const BAD_LOGIN: &str = "Incorrect email or password";

/// POST /api/login: exchange credentials for an access token and a refresh token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let email = req.email.clone();
    let user = state
        .with_db(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| {
            info!("Login for unknown email");
            ApiError::Unauthorized(BAD_LOGIN.into())
        })?;

    let hash = user.hashed_password.clone();
    let password = req.password;
    let verdict = run_blocking(move || Ok(chirpy_auth::check_password(&hash, &password))).await?;
    verdict.map_err(|e| match e {
        AuthError::PasswordMismatch => {
            info!("Wrong password for user {}", user.id);
            ApiError::Unauthorized(BAD_LOGIN.into())
        }
        other => ApiError::Internal(other.into()),
    })?;

    let token = chirpy_auth::make_jwt(user.id, &state.jwt_secret, ACCESS_TOKEN_TTL)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let refresh_token = chirpy_auth::make_refresh_token();
    let user_id = user.id;
    let stored = refresh_token.clone();
    let expires_at = Utc::now() + REFRESH_TOKEN_TTL;
    state
        .with_db(move |db| db.create_refresh_token(&stored, user_id, expires_at))
        .await?;

    info!("User {} logged in", user_id);
    Ok(Json(LoginResponse {
        user: User::from(user),
        token,
        refresh_token,
    }))
}

/// POST /api/refresh: trade a live refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .with_db(move |db| db.get_refresh_token(&token))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;

    if !row.is_usable(Utc::now()) {
        warn!(
            "Refused refresh token for user {} (revoked: {}, expires_at: {})",
            row.user_id,
            row.revoked_at.is_some(),
            row.expires_at
        );
        return Err(ApiError::Unauthorized("Refresh token expired or revoked".into()));
    }

    let token = chirpy_auth::make_jwt(row.user_id, &state.jwt_secret, ACCESS_TOKEN_TTL)
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(RefreshResponse { token }))
}

/// POST /api/revoke: revoke a refresh token.
pub async fn revoke(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let revoked = state
        .with_db(move |db| db.revoke_refresh_token(&token))
        .await?;

    if !revoked {
        return Err(ApiError::Unauthorized("Invalid refresh token".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}
