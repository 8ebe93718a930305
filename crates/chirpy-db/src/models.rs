//! Database row types. Distinct from chirpy-types API models so that secrets
//! like the password hash never reach a response by accident.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use chirpy_types::api::{Chirp, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone)]
pub struct ChirpRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRow {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    /// A token can be exchanged only while it is unrevoked and unexpired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            email: row.email,
            is_chirpy_red: row.is_chirpy_red,
        }
    }
}

impl From<ChirpRow> for Chirp {
    fn from(row: ChirpRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            body: row.body,
            user_id: row.user_id,
        }
    }
}
