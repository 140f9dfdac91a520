//! HTTP server for the mutual-aid engagement service.
//!
//! Exposes like toggling, enrollment requests, moderation, and the
//! owner-gated enrollment listing over JSON, behind a bearer-token
//! authentication seam.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, Authenticated, Credentials, StaticTokenAuth};
pub use config::{SeedCause, ServerConfig, TokenGrant};
pub use error::{ServerError, ServerResult};
pub use server::AidServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use aid_engagement::InMemoryActivityLog;
    use aid_store::{InMemoryLedgerStore, LedgerStore};
    use aid_types::{Actor, Cause, CauseId, UserId, UserProfile};

    const OWNER: &str = "owner-token";
    const MEMBER: &str = "member-token";
    const OTHER: &str = "other-token";
    const ADMIN: &str = "admin-token";

    struct TestApp {
        router: Router,
        store: Arc<InMemoryLedgerStore>,
        log: Arc<InMemoryActivityLog>,
        offering: CauseId,
        member: UserId,
    }

    async fn app(max_participants: u32) -> TestApp {
        let owner = UserId::new();
        let member = UserId::new();
        let store = Arc::new(InMemoryLedgerStore::default());
        store
            .upsert_user(UserProfile::new(member, "Member"))
            .await
            .unwrap();
        let offering = Cause::offering(owner, "Repair café", max_participants);
        let offering_id = offering.id;
        store.insert_cause(offering).await.unwrap();

        let auth = StaticTokenAuth::new()
            .with(OWNER, Actor::user(owner))
            .with(MEMBER, Actor::user(member))
            .with(OTHER, Actor::user(UserId::new()))
            .with(ADMIN, Actor::admin(UserId::new()));
        let log = Arc::new(InMemoryActivityLog::new());
        let state = AppState::new(store.clone(), log.clone(), Arc::new(auth));

        TestApp {
            router: router::build_router(state),
            store,
            log,
            offering: offering_id,
            member,
        }
    }

    impl TestApp {
        async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("authorization", format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn enroll(&self, token: &str) -> String {
            let uri = format!("/offerings/{}/enrollments", self.offering);
            let (status, body) = self.call(Method::POST, &uri, Some(token), None).await;
            assert_eq!(status, StatusCode::CREATED);
            body["enrollmentId"].as_str().unwrap().to_string()
        }

        async fn review(&self, token: &str, enrollment: &str, status: &str) -> (StatusCode, Value) {
            self.call(
                Method::PUT,
                &format!("/enrollments/{enrollment}"),
                Some(token),
                Some(json!({ "status": status })),
            )
            .await
        }
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app(1).await;
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn anonymous_calls_are_rejected() {
        let app = app(1).await;
        let uri = format!("/causes/{}/like", app.offering);
        let (status, body) = app.call(Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "AuthenticationRequired");

        let (status, _) = app.call(Method::GET, &uri, Some("forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn like_toggle_round_trip() {
        let app = app(1).await;
        let uri = format!("/causes/{}/like", app.offering);

        let (status, body) = app.call(Method::POST, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "liked": true, "likeCount": 1 }));

        let (_, body) = app.call(Method::GET, &uri, Some(OTHER), None).await;
        assert_eq!(body, json!({ "liked": false, "likeCount": 1 }));

        let (_, body) = app.call(Method::POST, &uri, Some(MEMBER), None).await;
        assert_eq!(body, json!({ "liked": false, "likeCount": 0 }));
        assert_eq!(app.log.len(), 2);
    }

    #[tokio::test]
    async fn like_on_unknown_cause_is_404() {
        let app = app(1).await;
        let uri = format!("/causes/{}/like", CauseId::new());
        let (status, body) = app.call(Method::POST, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let app = app(1).await;
        let (status, body) = app
            .call(Method::GET, "/causes/not-an-id/like", Some(MEMBER), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn enrollment_request_and_duplicate() {
        let app = app(2).await;
        let uri = format!("/offerings/{}/enrollments", app.offering);

        let (status, body) = app
            .call(Method::POST, &uri, Some(MEMBER), Some(json!({ "notes": "first time" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id: aid_types::EnrollmentId = body["enrollmentId"].as_str().unwrap().parse().unwrap();
        let row = app.store.enrollment(&id).await.unwrap().unwrap();
        assert_eq!(row.notes.as_deref(), Some("first time"));

        let (status, body) = app.call(Method::POST, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Duplicate");
    }

    #[tokio::test]
    async fn enrollment_on_unknown_offering_is_404() {
        let app = app(1).await;
        let uri = format!("/offerings/{}/enrollments", CauseId::new());
        let (status, _) = app.call(Method::POST, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn owner_gets_full_view_others_get_count() {
        let app = app(2).await;
        app.enroll(MEMBER).await;
        let uri = format!("/offerings/{}/enrollments", app.offering);

        let (status, body) = app.call(Method::GET, &uri, Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "full");
        assert_eq!(body["enrollments"][0]["user"], app.member.to_string());
        assert_eq!(body["enrollments"][0]["userProfile"]["displayName"], "Member");
        assert_eq!(body["stats"]["pending"], 1);
        assert_eq!(body["stats"]["remaining"], 2);

        let (status, body) = app.call(Method::GET, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "countOnly");
        assert_eq!(body["total"], 1);
        assert!(body.get("enrollments").is_none());
    }

    #[tokio::test]
    async fn review_lifecycle_over_http() {
        let app = app(1).await;
        let first = app.enroll(MEMBER).await;
        let second = app.enroll(OTHER).await;

        let (status, body) = app.review(OWNER, &first, "accepted").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "accepted");

        let (status, body) = app.review(ADMIN, &second, "accepted").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CapacityExceeded");

        let (status, _) = app.review(OWNER, &first, "completed").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.review(OWNER, &first, "pending").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "InvalidTransition");

        let offering = app.store.cause(&app.offering).await.unwrap().unwrap();
        assert_eq!(offering.capacity.unwrap().current_participants, 0);
    }

    #[tokio::test]
    async fn review_requires_moderator() {
        let app = app(1).await;
        let id = app.enroll(MEMBER).await;
        let (status, body) = app.review(MEMBER, &id, "accepted").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn review_rejects_unknown_status_and_missing_body() {
        let app = app(1).await;
        let id = app.enroll(MEMBER).await;

        let (status, body) = app.review(OWNER, &id, "banned").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let (status, _) = app
            .call(Method::PUT, &format!("/enrollments/{id}"), Some(OWNER), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn review_of_unknown_enrollment_is_404() {
        let app = app(1).await;
        let (status, _) = app
            .review(OWNER, &aid_types::EnrollmentId::new().to_string(), "accepted")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn member_withdraws_own_enrollment() {
        let app = app(1).await;
        let id = app.enroll(MEMBER).await;
        let uri = format!("/enrollments/{id}");

        let (status, _) = app.call(Method::DELETE, &uri, Some(OTHER), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.call(Method::DELETE, &uri, Some(MEMBER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");
    }
}
