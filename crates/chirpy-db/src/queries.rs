use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, ffi, params};
use uuid::Uuid;

use crate::Database;
use crate::models::{ChirpRow, RefreshTokenRow, UserRow};

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";
const CHIRP_COLUMNS: &str = "id, created_at, updated_at, body, user_id";
const REFRESH_TOKEN_COLUMNS: &str = "token, created_at, updated_at, user_id, expires_at, revoked_at";

impl Database {
    // -- Users --

    /// Insert a new user. Returns `None` if the email is already registered.
    pub fn create_user(&self, email: &str, hashed_password: &str) -> Result<Option<UserRow>> {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };

        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, created_at, updated_at, email, hashed_password, is_chirpy_red)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.id, row.created_at, row.updated_at, row.email, row.hashed_password, row.is_chirpy_red],
            );
            match inserted {
                Ok(_) => Ok(Some(row)),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            Ok(conn.query_row(&sql, [email], user_from_row).optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
        })
    }

    /// Replace a user's email and password hash.
    pub fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UpdateUserOutcome> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE users SET email = ?1, hashed_password = ?2, updated_at = ?3
                 WHERE id = ?4
                 RETURNING {USER_COLUMNS}"
            );
            let updated = conn
                .query_row(&sql, params![email, hashed_password, Utc::now(), id], user_from_row)
                .optional();
            match updated {
                Ok(Some(row)) => Ok(UpdateUserOutcome::Updated(row)),
                Ok(None) => Ok(UpdateUserOutcome::NotFound),
                Err(e) if is_unique_violation(&e) => Ok(UpdateUserOutcome::EmailTaken),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Flag a user as Chirpy Red. Returns false if no such user exists.
    pub fn upgrade_user_to_red(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_chirpy_red = 1, updated_at = ?1 WHERE id = ?2",
                params![Utc::now(), id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete every user. Chirps and refresh tokens go with them.
    pub fn delete_all_users(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users", [])?))
    }

    // -- Chirps --

    pub fn create_chirp(&self, body: &str, user_id: Uuid) -> Result<ChirpRow> {
        let now = Utc::now();
        let row = ChirpRow {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chirps (id, created_at, updated_at, body, user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.created_at, row.updated_at, row.body, row.user_id],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    /// All chirps, oldest first, optionally limited to one author.
    pub fn get_chirps(&self, author: Option<Uuid>) -> Result<Vec<ChirpRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHIRP_COLUMNS} FROM chirps
                 WHERE ?1 IS NULL OR user_id = ?1
                 ORDER BY created_at, rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([author], chirp_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_chirp(&self, id: Uuid) -> Result<Option<ChirpRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHIRP_COLUMNS} FROM chirps WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], chirp_from_row).optional()?)
        })
    }

    /// Returns false if the chirp was already gone.
    pub fn delete_chirp(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM chirps WHERE id = ?1", [id])? > 0))
    }

    // -- Refresh tokens --

    pub fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRow> {
        let now = Utc::now();
        let row = RefreshTokenRow {
            token: token.to_string(),
            created_at: now,
            updated_at: now,
            user_id,
            expires_at,
            revoked_at: None,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at, revoked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
                params![row.token, row.created_at, row.updated_at, row.user_id, row.expires_at],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    pub fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token = ?1");
            Ok(conn.query_row(&sql, [token], refresh_token_from_row).optional()?)
        })
    }

    /// Stamp `revoked_at`. Revoking twice keeps the first timestamp.
    /// Returns false if the token is unknown.
    pub fn revoke_refresh_token(&self, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let changed = conn.execute(
                "UPDATE refresh_tokens
                 SET revoked_at = COALESCE(revoked_at, ?1), updated_at = ?1
                 WHERE token = ?2",
                params![now, token],
            )?;
            Ok(changed > 0)
        })
    }
}

#[derive(Debug)]
pub enum UpdateUserOutcome {
    Updated(UserRow),
    NotFound,
    EmailTaken,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        email: row.get(3)?,
        hashed_password: row.get(4)?,
        is_chirpy_red: row.get(5)?,
    })
}

fn chirp_from_row(row: &Row<'_>) -> rusqlite::Result<ChirpRow> {
    Ok(ChirpRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        body: row.get(3)?,
        user_id: row.get(4)?,
    })
}

fn refresh_token_from_row(row: &Row<'_>) -> rusqlite::Result<RefreshTokenRow> {
    Ok(RefreshTokenRow {
        token: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        user_id: row.get(3)?,
        expires_at: row.get(4)?,
        revoked_at: row.get(5)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn duplicate_email_is_reported() {
        let db = db();
        assert!(db.create_user("a@example.com", "hash").unwrap().is_some());
        assert!(db.create_user("a@example.com", "hash").unwrap().is_none());
    }

    #[test]
    fn user_lookups() {
        let db = db();
        let user = db.create_user("a@example.com", "hash").unwrap().unwrap();

        let by_email = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(!by_email.is_chirpy_red);

        let by_id = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        assert!(db.get_user_by_email("b@example.com").unwrap().is_none());
        assert!(db.get_user_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn update_credentials() {
        let db = db();
        let user = db.create_user("a@example.com", "old").unwrap().unwrap();
        db.create_user("taken@example.com", "x").unwrap().unwrap();

        match db.update_user_credentials(user.id, "new@example.com", "new").unwrap() {
            UpdateUserOutcome::Updated(row) => {
                assert_eq!(row.email, "new@example.com");
                assert_eq!(row.hashed_password, "new");
                assert!(row.updated_at >= user.updated_at);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(matches!(
            db.update_user_credentials(user.id, "taken@example.com", "new").unwrap(),
            UpdateUserOutcome::EmailTaken
        ));
        assert!(matches!(
            db.update_user_credentials(Uuid::new_v4(), "z@example.com", "new").unwrap(),
            UpdateUserOutcome::NotFound
        ));
    }

    #[test]
    fn upgrade_to_red() {
        let db = db();
        let user = db.create_user("a@example.com", "hash").unwrap().unwrap();

        assert!(db.upgrade_user_to_red(user.id).unwrap());
        assert!(db.get_user_by_id(user.id).unwrap().unwrap().is_chirpy_red);
        assert!(!db.upgrade_user_to_red(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn chirps_are_listed_oldest_first() {
        let db = db();
        let alice = db.create_user("alice@example.com", "hash").unwrap().unwrap();
        let bob = db.create_user("bob@example.com", "hash").unwrap().unwrap();

        let first = db.create_chirp("one", alice.id).unwrap();
        let second = db.create_chirp("two", bob.id).unwrap();
        let third = db.create_chirp("three", alice.id).unwrap();

        let all: Vec<Uuid> = db.get_chirps(None).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(all, vec![first.id, second.id, third.id]);

        let alices: Vec<Uuid> = db
            .get_chirps(Some(alice.id))
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(alices, vec![first.id, third.id]);
    }

    #[test]
    fn chirp_requires_existing_user() {
        let db = db();
        assert!(db.create_chirp("orphan", Uuid::new_v4()).is_err());
    }

    #[test]
    fn delete_chirp() {
        let db = db();
        let user = db.create_user("a@example.com", "hash").unwrap().unwrap();
        let chirp = db.create_chirp("bye", user.id).unwrap();

        assert!(db.get_chirp(chirp.id).unwrap().is_some());
        assert!(db.delete_chirp(chirp.id).unwrap());
        assert!(db.get_chirp(chirp.id).unwrap().is_none());
        assert!(!db.delete_chirp(chirp.id).unwrap());
    }

    #[test]
    fn refresh_token_lifecycle() {
        let db = db();
        let user = db.create_user("a@example.com", "hash").unwrap().unwrap();
        let expires_at = Utc::now() + Duration::days(60);
        db.create_refresh_token("tok", user.id, expires_at).unwrap();

        let row = db.get_refresh_token("tok").unwrap().unwrap();
        assert_eq!(row.user_id, user.id);
        assert!(row.revoked_at.is_none());
        assert!(row.is_usable(Utc::now()));

        assert!(db.revoke_refresh_token("tok").unwrap());
        let revoked = db.get_refresh_token("tok").unwrap().unwrap();
        let first_revocation = revoked.revoked_at.unwrap();
        assert!(!revoked.is_usable(Utc::now()));

        assert!(db.revoke_refresh_token("tok").unwrap());
        let again = db.get_refresh_token("tok").unwrap().unwrap();
        assert_eq!(again.revoked_at, Some(first_revocation));

        assert!(!db.revoke_refresh_token("missing").unwrap());
    }

    #[test]
    fn delete_all_users_cascades() {
        let db = db();
        let user = db.create_user("a@example.com", "hash").unwrap().unwrap();
        let chirp = db.create_chirp("hello", user.id).unwrap();
        db.create_refresh_token("tok", user.id, Utc::now() + Duration::days(1))
            .unwrap();

        assert_eq!(db.delete_all_users().unwrap(), 1);
        assert!(db.get_user_by_id(user.id).unwrap().is_none());
        assert!(db.get_chirp(chirp.id).unwrap().is_none());
        assert!(db.get_refresh_token("tok").unwrap().is_none());
    }
}
