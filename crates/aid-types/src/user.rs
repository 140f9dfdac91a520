use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The authenticated caller of an engagement operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user: UserId) -> Self {
        Self { user, is_admin: false }
    }

    pub fn admin(user: UserId) -> Self {
        Self { user, is_admin: true }
    }
}

/// Display details for a user, as supplied by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
