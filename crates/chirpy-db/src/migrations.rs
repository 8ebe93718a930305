use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, chirps, refresh tokens)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              BLOB PRIMARY KEY,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL
            );

            CREATE TABLE chirps (
                id          BLOB PRIMARY KEY,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                body        TEXT NOT NULL,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_chirps_created ON chirps(created_at);
            CREATE INDEX idx_chirps_user ON chirps(user_id, created_at);

            CREATE TABLE refresh_tokens (
                token       TEXT PRIMARY KEY,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at  TEXT NOT NULL,
                revoked_at  TEXT
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (chirpy red)");
        conn.execute_batch(
            "
            ALTER TABLE users ADD COLUMN is_chirpy_red INTEGER NOT NULL DEFAULT 0;

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
