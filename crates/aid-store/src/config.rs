use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for a [`LedgerStore`](crate::LedgerStore) backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Longest a transaction waits for a row lock before failing.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self { lock_timeout }
    }
}
