use std::sync::Arc;

use tokio::net::TcpListener;

use aid_engagement::TracingActivityLog;
use aid_store::{InMemoryLedgerStore, LedgerStore};

use crate::auth::StaticTokenAuth;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Engagement service backed by the in-memory ledger store.
pub struct AidServer {
    config: ServerConfig,
    store: Arc<InMemoryLedgerStore>,
    state: AppState<InMemoryLedgerStore>,
}

impl AidServer {
    /// Validate `config`, provision its users and causes, and wire handlers.
    pub async fn bootstrap(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let store = Arc::new(InMemoryLedgerStore::new(config.store_config()));
        for grant in &config.tokens {
            store.upsert_user(grant.profile()).await?;
        }
        for seed in &config.causes {
            store.insert_cause(seed.to_cause()).await?;
        }
        tracing::info!(
            users = config.tokens.len(),
            causes = config.causes.len(),
            "store provisioned"
        );

        let auth = Arc::new(StaticTokenAuth::from_grants(&config.tokens));
        let state = AppState::new(store.clone(), Arc::new(TracingActivityLog), auth);
        Ok(Self { config, store, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<InMemoryLedgerStore> {
        &self.store
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("aid server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aid_types::{CauseId, CauseKind, UserId};

    use crate::config::{SeedCause, TokenGrant};

    fn config() -> ServerConfig {
        let owner = UserId::new();
        ServerConfig {
            tokens: vec![TokenGrant {
                token: "t-owner".into(),
                user: owner,
                display_name: "Owner".into(),
                email: None,
                admin: false,
            }],
            causes: vec![SeedCause {
                id: CauseId::new(),
                owner,
                kind: CauseKind::Offer,
                title: "Knitting circle".into(),
                max_participants: Some(6),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_provisions_store() {
        let config = config();
        let seeded = config.causes[0].id;
        let user = config.tokens[0].user;

        let server = AidServer::bootstrap(config).await.unwrap();
        let cause = server.store().cause(&seeded).await.unwrap().unwrap();
        assert_eq!(cause.capacity.unwrap().max_participants, 6);
        assert_eq!(server.store().user_profiles(&[user]).await.unwrap().len(), 1);
        let _router = server.router();
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_config() {
        let mut config = config();
        config.causes[0].max_participants = Some(0);
        assert!(matches!(
            AidServer::bootstrap(config).await,
            Err(ServerError::Config(_))
        ));
    }
}
