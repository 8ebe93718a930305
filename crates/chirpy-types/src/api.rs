use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Access token claims. `sub` carries the user id as a hyphenated UUID string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Users --

/// Body of `POST /api/users`, `PUT /api/users` and `POST /api/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

// -- Chirps --

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query string of `GET /api/chirps`.
#[derive(Debug, Default, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub sort: SortOrder,
}

// -- Webhooks --

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Payment provider event. `user_id` is left as a string so a malformed id
/// can be answered with 404 instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_flattens_user() {
        let now = Utc::now();
        let resp = LoginResponse {
            user: User {
                id: Uuid::nil(),
                created_at: now,
                updated_at: now,
                email: "a@b.c".into(),
                is_chirpy_red: false,
            },
            token: "jwt".into(),
            refresh_token: "opaque".into(),
        };

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["email"], "a@b.c");
        assert_eq!(value["token"], "jwt");
        assert_eq!(value["refresh_token"], "opaque");
        assert!(value.get("user").is_none());
    }

    #[test]
    fn request_bodies_ignore_extra_fields() {
        let req: CredentialsRequest = serde_json::from_str(
            r#"{"email":"a@b.c","password":"pw","expires_in_seconds":60}"#,
        )
        .unwrap();
        assert_eq!(req.email, "a@b.c");
        assert_eq!(req.password, "pw");

        let req: CreateChirpRequest =
            serde_json::from_str(r#"{"body":"hello","user_id":"ignored"}"#).unwrap();
        assert_eq!(req.body, "hello");
    }

    #[test]
    fn webhook_tolerates_missing_data() {
        let req: WebhookRequest = serde_json::from_str(r#"{"event":"user.payment_failed"}"#).unwrap();
        assert_eq!(req.event, "user.payment_failed");
        assert!(req.data.user_id.is_empty());
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        let q: ListChirpsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, SortOrder::Asc);
        assert!(q.author_id.is_none());

        let q: ListChirpsQuery = serde_json::from_str(r#"{"sort":"desc"}"#).unwrap();
        assert_eq!(q.sort, SortOrder::Desc);
    }
}
