use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use chirpy_db::queries::UpdateUserOutcome;
use chirpy_types::api::{CredentialsRequest, User};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::{AppState, run_blocking};

/// POST /api/users: register a new account.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validate_credentials(&req)?;

    let password = req.password;
    let hashed_password = run_blocking(move || Ok(chirpy_auth::hash_password(&password)?)).await?;

    let email = req.email;
    let user = state
        .with_db(move |db| db.create_user(&email, &hashed_password))
        .await?
        .ok_or_else(|| ApiError::Conflict("Email is already registered".into()))?;

    info!("User {} registered", user.id);
    Ok((StatusCode::CREATED, Json(User::from(user))))
}

/// PUT /api/users: change the caller's email and password.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validate_credentials(&req)?;

    let password = req.password;
    let hashed_password = run_blocking(move || Ok(chirpy_auth::hash_password(&password)?)).await?;

    let email = req.email;
    let outcome = state
        .with_db(move |db| db.update_user_credentials(user_id, &email, &hashed_password))
        .await?;

    match outcome {
        UpdateUserOutcome::Updated(user) => {
            info!("User {} updated credentials", user.id);
            Ok(Json(User::from(user)))
        }
        UpdateUserOutcome::NotFound => Err(ApiError::Unauthorized("User no longer exists".into())),
        UpdateUserOutcome::EmailTaken => {
            Err(ApiError::Conflict("Email is already registered".into()))
        }
    }
}

fn validate_credentials(req: &CredentialsRequest) -> Result<(), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }
    Ok(())
}
