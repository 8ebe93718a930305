use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Raw token from `Authorization: Bearer <token>`. Used for refresh tokens,
/// which are opaque and checked against the database.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Missing bearer token".into()))?;

        Ok(Self(bearer.token().to_string()))
    }
}

/// The user id carried by a valid access token.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let user_id = chirpy_auth::validate_jwt(&token, &state.jwt_secret).map_err(|e| {
            debug!("Rejected access token: {}", e);
            ApiError::Unauthorized("Invalid token".into())
        })?;

        Ok(Self(user_id))
    }
}

/// Key from `Authorization: ApiKey <key>`, sent by the payment provider.
pub struct ApiKey(pub String);

impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        api_key(&parts.headers)
            .map(|key| Self(key.to_string()))
            .ok_or_else(|| ApiError::Unauthorized("Missing API key".into()))
    }
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("ApiKey") {
        return None;
    }

    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_api_key() {
        assert_eq!(api_key(&headers("ApiKey f271c81ff7084ee5")), Some("f271c81ff7084ee5"));
        assert_eq!(api_key(&headers("apikey  abc ")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(api_key(&headers("Bearer abc")), None);
        assert_eq!(api_key(&headers("ApiKey")), None);
        assert_eq!(api_key(&headers("ApiKey   ")), None);
        assert_eq!(api_key(&HeaderMap::new()), None);
    }
}
