use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use aid_engagement::EnrollmentView;
use aid_store::LedgerStore;
use aid_types::{CauseId, Enrollment, EnrollmentId, EnrollmentStatus, LikeStatus};

use crate::auth::Authenticated;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnrollmentRequestBody {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewBody {
    pub status: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentCreated {
    pub enrollment_id: EnrollmentId,
}

fn parse_id<T>(raw: &str, what: &str) -> ServerResult<T>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| ServerError::validation(format!("malformed {what} id: {raw}")))
}

/// Decode a JSON body; an empty body decodes as `T::default()`.
fn parse_body<T>(body: &Bytes) -> ServerResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_required_body(body)
}

fn parse_required_body<T: DeserializeOwned>(body: &Bytes) -> ServerResult<T> {
    serde_json::from_slice(body).map_err(|e| ServerError::validation(format!("invalid body: {e}")))
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "aid-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /causes/:id/like`
pub async fn toggle_like<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(cause): Path<String>,
) -> ServerResult<Json<LikeStatus>> {
    let cause: CauseId = parse_id(&cause, "cause")?;
    let status = state.engagement.likes.toggle_like(&actor.user, &cause).await?;
    Ok(Json(status))
}

/// `GET /causes/:id/like`
pub async fn like_status<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(cause): Path<String>,
) -> ServerResult<Json<LikeStatus>> {
    let cause: CauseId = parse_id(&cause, "cause")?;
    let status = state.engagement.likes.like_status(&actor.user, &cause).await?;
    Ok(Json(status))
}

/// `POST /offerings/:id/enrollments`
pub async fn request_enrollment<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(offering): Path<String>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<EnrollmentCreated>)> {
    let offering: CauseId = parse_id(&offering, "offering")?;
    let request: EnrollmentRequestBody = parse_body(&body)?;
    let enrollment_id = state
        .engagement
        .enrollments
        .request_enrollment(&actor.user, &offering, request.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(EnrollmentCreated { enrollment_id })))
}

/// `GET /offerings/:id/enrollments`
pub async fn list_enrollments<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(offering): Path<String>,
) -> ServerResult<Json<EnrollmentView>> {
    let offering: CauseId = parse_id(&offering, "offering")?;
    let view = state
        .engagement
        .enrollments
        .list_enrollments(&offering, &actor.user)
        .await?;
    Ok(Json(view))
}

/// `PUT /enrollments/:id`
pub async fn review_enrollment<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(enrollment): Path<String>,
    body: Bytes,
) -> ServerResult<Json<Enrollment>> {
    let enrollment: EnrollmentId = parse_id(&enrollment, "enrollment")?;
    let review: ReviewBody = parse_required_body(&body)?;
    let status: EnrollmentStatus = review
        .status
        .parse()
        .map_err(|e: aid_types::TypeError| ServerError::validation(e.to_string()))?;

    let updated = state
        .engagement
        .enrollments
        .review_enrollment(&actor, &enrollment, status, review.admin_notes)
        .await?;
    Ok(Json(updated))
}

/// `DELETE /enrollments/:id`: the enrolled user withdraws.
pub async fn withdraw_enrollment<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(enrollment): Path<String>,
) -> ServerResult<Json<Enrollment>> {
    let enrollment: EnrollmentId = parse_id(&enrollment, "enrollment")?;
    let updated = state
        .engagement
        .enrollments
        .withdraw_enrollment(&actor.user, &enrollment)
        .await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let parsed: EnrollmentRequestBody = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(parsed.notes.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_body::<EnrollmentRequestBody>(&Bytes::from_static(b"{\"seats\":3}"))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_ids_are_validation_errors() {
        let err = parse_id::<CauseId>("42", "cause").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("malformed cause id"));
    }
}
