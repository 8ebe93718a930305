use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use chirpy_types::api::{USER_UPGRADED_EVENT, WebhookRequest};

use crate::error::ApiError;
use crate::extract::ApiKey;
use crate::state::AppState;

/// POST /api/polka/webhooks: payment provider events. Only `user.upgraded`
/// has an effect; everything else is acknowledged and dropped.
pub async fn polka(
    State(state): State<AppState>,
    ApiKey(key): ApiKey,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if key != state.polka_key {
        warn!("Webhook with wrong API key");
        return Err(ApiError::Unauthorized("Invalid API key".into()));
    }

    let Json(req) = payload?;
    if req.event != USER_UPGRADED_EVENT {
        debug!("Ignoring webhook event '{}'", req.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id: Uuid = req
        .data
        .user_id
        .parse()
        .map_err(|_| ApiError::NotFound("User not found".into()))?;

    let upgraded = state
        .with_db(move |db| db.upgrade_user_to_red(user_id))
        .await?;
    if !upgraded {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!("User {} upgraded to Chirpy Red", user_id);
    Ok(StatusCode::NO_CONTENT)
}
