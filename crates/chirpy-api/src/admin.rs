use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, Platform};

/// GET /api/healthz
pub async fn healthz() -> &'static str {
    "OK"
}

/// GET /admin/metrics
pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html><body><h1>Welcome, Chirpy Admin</h1><p>Chirpy has been visited {} times!</p></body></html>",
        state.metrics.hits()
    ))
}

/// POST /admin/reset: wipe all users, then zero the hit counter. Dev only.
pub async fn reset(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if state.platform != Platform::Dev {
        return Err(ApiError::Forbidden("Reset is only allowed in dev environment".into()));
    }

    let deleted = state.with_db(|db| db.delete_all_users()).await?;
    state.metrics.reset();

    info!("Reset: hit counter zeroed, {} users deleted", deleted);
    Ok("Hits reset to 0")
}
