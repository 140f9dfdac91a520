use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use aid_store::StoreConfig;
use aid_types::{Actor, Cause, CauseId, CauseKind, UserId, UserProfile};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Row-lock wait bound for store transactions, in milliseconds.
    pub lock_timeout_ms: u64,
    pub tokens: Vec<TokenGrant>,
    pub causes: Vec<SeedCause>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            lock_timeout_ms: 5_000,
            tokens: Vec::new(),
            causes: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.lock_timeout_ms == 0 {
            return Err(ServerError::Config("lock_timeout_ms must be positive".into()));
        }

        let mut tokens = HashSet::new();
        for grant in &self.tokens {
            if grant.token.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "empty token for user {}",
                    grant.user
                )));
            }
            if !tokens.insert(grant.token.as_str()) {
                return Err(ServerError::Config(format!(
                    "token for user {} is granted more than once",
                    grant.user
                )));
            }
        }

        let mut causes = HashSet::new();
        for cause in &self.causes {
            if !causes.insert(cause.id) {
                return Err(ServerError::Config(format!("duplicate cause id {}", cause.id)));
            }
            if cause.max_participants == Some(0) {
                return Err(ServerError::Config(format!(
                    "offering {} must allow at least one participant",
                    cause.id
                )));
            }
        }
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
    }
}

/// A bearer token mapped to a platform user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub user: UserId,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

impl TokenGrant {
    pub fn actor(&self) -> Actor {
        Actor {
            user: self.user,
            is_admin: self.admin,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// A cause provisioned at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedCause {
    pub id: CauseId,
    pub owner: UserId,
    pub kind: CauseKind,
    pub title: String,
    /// Present for capacity-bounded offerings.
    #[serde(default)]
    pub max_participants: Option<u32>,
}

impl SeedCause {
    pub fn to_cause(&self) -> Cause {
        let mut cause = match self.max_participants {
            Some(max) => Cause::offering(self.owner, self.title.clone(), max),
            None => Cause::new(self.owner, self.kind, self.title.clone()),
        };
        cause.id = self.id;
        cause.kind = self.kind;
        cause
    }
}
