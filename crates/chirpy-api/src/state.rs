use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::error;

use chirpy_db::Database;

use crate::error::ApiError;
use crate::metrics::Metrics;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub polka_key: String,
    pub platform: Platform,
    pub static_dir: PathBuf,
    pub metrics: Metrics,
}

impl AppStateInner {
    /// Run a blocking database call off the async runtime.
    pub async fn with_db<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        run_blocking(move || f(&state.db)).await
    }
}

/// Run CPU-heavy or blocking work (database calls, Argon2) on the blocking pool.
pub async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}

/// Deployment flavour. Destructive admin endpoints only exist on `Dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Dev,
    Production,
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Production),
            other => anyhow::bail!("unknown platform '{}', expected 'dev' or 'prod'", other),
        }
    }
}
