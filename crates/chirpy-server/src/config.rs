use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use chirpy_api::Platform;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub platform: Platform,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JWT_SECRET is unset or still a placeholder");
        }

        let polka_key = lookup("POLKA_KEY").unwrap_or_default();
        if polka_key.is_empty() {
            bail!("POLKA_KEY is unset");
        }

        let platform = match lookup("PLATFORM") {
            Some(raw) => raw.parse().context("invalid PLATFORM")?,
            None => Platform::Production,
        };

        let port = match lookup("CHIRPY_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid CHIRPY_PORT '{}'", raw))?,
            None => 8080,
        };

        let db_path: PathBuf = lookup("CHIRPY_DB_PATH")
            .unwrap_or_else(|| "chirpy.db".into())
            .into();
        let static_dir: PathBuf = lookup("CHIRPY_STATIC_DIR")
            .unwrap_or_else(|| "./static".into())
            .into();

        // Anything under the static root is downloadable from /app/.
        if absolute(&db_path)?.starts_with(absolute(&static_dir)?) {
            bail!(
                "CHIRPY_DB_PATH '{}' lies inside CHIRPY_STATIC_DIR '{}'",
                db_path.display(),
                static_dir.display()
            );
        }

        Ok(Self {
            jwt_secret,
            polka_key,
            platform,
            db_path,
            host: lookup("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            static_dir,
        })
    }
}

/// Resolve `path` against the working directory and fold `.`/`..` lexically.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to read working directory")?
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
