use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use aid_engagement::EngagementError;
use aid_store::LedgerStore;
use aid_types::Actor;

use crate::config::TokenGrant;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read `Authorization: Bearer <token>`; anything else is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self::Bearer(token.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Session/identity provider seam. Returns `None` for unknown callers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Actor>>;
}

/// Resolves bearer tokens against a fixed table of grants.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenAuth {
    grants: HashMap<String, Actor>,
}

impl StaticTokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grants(grants: &[TokenGrant]) -> Self {
        let mut auth = Self::new();
        for grant in grants {
            auth.insert(grant.token.clone(), grant.actor());
        }
        auth
    }

    pub fn insert(&mut self, token: impl Into<String>, actor: Actor) {
        self.grants.insert(token.into(), actor);
    }

    pub fn with(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.insert(token, actor);
        self
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Actor>> {
        match credentials {
            Credentials::Bearer(token) => Ok(self.grants.get(token).copied()),
            Credentials::Anonymous => Ok(None),
        }
    }
}

/// Extractor for an authenticated caller; rejects with `AuthenticationRequired`.
#[derive(Clone, Copy, Debug)]
pub struct Authenticated(pub Actor);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for Authenticated
where
    S: LedgerStore + 'static,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_headers(&parts.headers);
        state
            .auth
            .authenticate(&credentials)
            .await?
            .map(Authenticated)
            .ok_or(ServerError::Engagement(EngagementError::AuthenticationRequired))
    }
}
