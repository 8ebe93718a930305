//! Credential primitives for Chirpy: Argon2id password hashes, HS256 access
//! tokens and opaque refresh tokens.

pub mod jwt;
pub mod password;
pub mod refresh;

pub use jwt::{ACCESS_TOKEN_TTL, make_jwt, validate_jwt};
pub use password::{check_password, hash_password};
pub use refresh::{REFRESH_TOKEN_TTL, make_refresh_token};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("password does not match")]
    PasswordMismatch,
    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    InvalidSubject,
}
