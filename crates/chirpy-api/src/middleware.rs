use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Count every request that reaches the static file server.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.metrics.hit();
    next.run(req).await
}
