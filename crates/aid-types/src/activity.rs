use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enrollment::EnrollmentStatus;
use crate::error::TypeError;
use crate::ids::{CauseId, UserId};
use crate::Timestamp;

/// Kind of engagement event recorded in the activity log.
///
/// Serialized as its display name (`like`, `enroll_accepted`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ActivityKind {
    Like,
    Unlike,
    EnrollRequested,
    /// A status change; rendered as `enroll_<status>`.
    Enroll(EnrollmentStatus),
}

impl ActivityKind {
    pub fn like(liked: bool) -> Self {
        if liked {
            Self::Like
        } else {
            Self::Unlike
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::Unlike => write!(f, "unlike"),
            Self::EnrollRequested => write!(f, "enroll_requested"),
            Self::Enroll(status) => write!(f, "enroll_{status}"),
        }
    }
}

impl FromStr for ActivityKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "unlike" => Ok(Self::Unlike),
            "enroll_requested" => Ok(Self::EnrollRequested),
            other => other
                .strip_prefix("enroll_")
                .and_then(|status| status.parse().ok())
                .map(Self::Enroll)
                .ok_or_else(|| TypeError::UnknownActivityKind(s.to_string())),
        }
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for ActivityKind {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Immutable record of one engagement event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub user: UserId,
    pub cause: CauseId,
    pub kind: ActivityKind,
    pub metadata: BTreeMap<String, Value>,
    pub timestamp: Timestamp,
}

impl ActivityLogEntry {
    pub fn new(user: UserId, cause: CauseId, kind: ActivityKind) -> Self {
        Self {
            user,
            cause,
            kind,
            metadata: BTreeMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach a metadata field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
