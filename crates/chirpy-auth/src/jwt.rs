use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use chirpy_types::api::Claims;

use crate::AuthError;

pub const ISSUER: &str = "chirpy";

/// Access tokens are short lived; clients trade a refresh token for a new one.
pub const ACCESS_TOKEN_TTL: chrono::Duration = chrono::Duration::hours(1);

/// Sign an HS256 access token for `user_id`. A negative `expires_in` yields an
/// already expired token.
pub fn make_jwt(user_id: Uuid, secret: &str, expires_in: chrono::Duration) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + expires_in).timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate signature, issuer and expiry, and return the user id in `sub`.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AuthError::InvalidSubject)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn validates_to_signing_user() {
        let user_id = Uuid::new_v4();
        let token = make_jwt(user_id, SECRET, ACCESS_TOKEN_TTL).unwrap();
        assert_eq!(validate_jwt(&token, SECRET).unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = make_jwt(Uuid::new_v4(), SECRET, ACCESS_TOKEN_TTL).unwrap();
        assert!(matches!(
            validate_jwt(&token, "other-secret"),
            Err(AuthError::Jwt(_))
        ));
    }

    #[test]
    fn expired_token_fails() {
        let token = make_jwt(Uuid::new_v4(), SECRET, chrono::Duration::seconds(-5)).unwrap();
        let err = validate_jwt(&token, SECRET).unwrap_err();
        match err {
            AuthError::Jwt(e) => assert_eq!(
                *e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn foreign_issuer_fails() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: "someone-else".into(),
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn non_uuid_subject_fails() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: ISSUER.into(),
            sub: "admin".into(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            validate_jwt(&token, SECRET),
            Err(AuthError::InvalidSubject)
        ));
    }

    #[test]
    fn garbage_fails() {
        assert!(validate_jwt("not.a.jwt", SECRET).is_err());
    }
}
