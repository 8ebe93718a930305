pub mod admin;
pub mod auth;
pub mod chirps;
pub mod error;
pub mod extract;
pub mod filter;
pub mod metrics;
pub mod middleware;
pub mod state;
pub mod users;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, AppStateInner, Platform};

/// Build the full HTTP surface: the JSON API, the admin pages and the
/// hit-counted static file server under `/app/`.
pub fn router(state: AppState) -> Router {
    let static_files = Router::new()
        .nest_service("/app", ServeDir::new(&state.static_dir))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::count_hits,
        ));

    let api = Router::new()
        .route("/api/healthz", get(admin::healthz))
        .route("/api/users", post(users::create_user).put(users::update_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .route("/api/chirps", get(chirps::list_chirps).post(chirps::create_chirp))
        .route(
            "/api/chirps/{chirp_id}",
            get(chirps::get_chirp).delete(chirps::delete_chirp),
        )
        .route("/api/polka/webhooks", post(webhooks::polka))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset));

    Router::new()
        .merge(api)
        .merge(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
