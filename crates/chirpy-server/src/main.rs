mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use chirpy_api::AppStateInner;
use chirpy_api::metrics::Metrics;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy_server=debug,chirpy_api=debug,chirpy_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = chirpy_db::Database::open(&config.db_path)?;

    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        polka_key: config.polka_key,
        platform: config.platform,
        static_dir: config.static_dir,
        metrics: Metrics::default(),
    });

    let app = chirpy_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chirpy listening on {} ({:?})", addr, config.platform);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
