use std::sync::Arc;

use aid_engagement::{ActivityLog, Engagement};
use aid_store::LedgerStore;

use crate::auth::AuthProvider;

/// Shared handler state.
pub struct AppState<S> {
    pub engagement: Engagement<S>,
    pub auth: Arc<dyn AuthProvider>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engagement: self.engagement.clone(),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: Arc<S>, activity: Arc<dyn ActivityLog>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            engagement: Engagement::new(store, activity),
            auth,
        }
    }
}
