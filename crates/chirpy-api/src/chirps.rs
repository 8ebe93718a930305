use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use chirpy_types::api::{Chirp, CreateChirpRequest, ListChirpsQuery, SortOrder};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::filter::clean_body;
use crate::state::AppState;

pub const MAX_CHIRP_LENGTH: usize = 140;

/// POST /api/chirps
pub async fn create_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let body = validate_chirp(&req.body)?;

    let chirp = state
        .with_db(move |db| db.create_chirp(&body, user_id))
        .await?;

    Ok((StatusCode::CREATED, Json(Chirp::from(chirp))))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
pub async fn list_chirps(
    State(state): State<AppState>,
    query: Result<Query<ListChirpsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let author = query.author_id;

    let rows = state.with_db(move |db| db.get_chirps(author)).await?;

    let mut chirps: Vec<Chirp> = rows.into_iter().map(Chirp::from).collect();
    if query.sort == SortOrder::Desc {
        chirps.reverse();
    }

    Ok(Json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&chirp_id)?;

    let chirp = state
        .with_db(move |db| db.get_chirp(chirp_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".into()))?;

    Ok(Json(Chirp::from(chirp)))
}

/// DELETE /api/chirps/{chirp_id}: only the author may delete.
pub async fn delete_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(chirp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&chirp_id)?;

    let chirp = state
        .with_db(move |db| db.get_chirp(chirp_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".into()))?;

    if chirp.user_id != user_id {
        return Err(ApiError::Forbidden("Only chirp authors can delete chirps".into()));
    }

    let deleted = state.with_db(move |db| db.delete_chirp(chirp_id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Chirp not found".into()));
    }

    info!("User {} deleted chirp {}", user_id, chirp_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Enforce the length limit (in characters) and mask profanity.
fn validate_chirp(body: &str) -> Result<String, ApiError> {
    let len = body.chars().count();
    if len == 0 {
        return Err(ApiError::BadRequest("Chirp is empty".into()));
    }
    if len > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".into()));
    }
    Ok(clean_body(body))
}

// A malformed id names no chirp, hence 404.
fn parse_chirp_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Chirp not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_boundaries() {
        assert!(validate_chirp(&"a".repeat(140)).is_ok());
        assert!(matches!(
            validate_chirp(&"a".repeat(141)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(validate_chirp(""), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_chirp(&"é".repeat(140)).is_ok());
    }

    #[test]
    fn body_is_cleaned() {
        assert_eq!(validate_chirp("what a kerfuffle").unwrap(), "what a ****");
    }

    #[test]
    fn bad_id_is_not_found() {
        assert!(matches!(parse_chirp_id("nope"), Err(ApiError::NotFound(_))));
        assert!(parse_chirp_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
