use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use aid_types::{ActivityLogEntry, CauseId};

/// Errors from an activity sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    #[error("activity sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only history of engagement events.
///
/// Entries are written after the owning transaction commits. A failing sink
/// never undoes the committed state change.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: &ActivityLogEntry) -> Result<(), ActivityError>;
}

/// Append `entry`, reporting a failure instead of propagating it.
pub(crate) async fn record_best_effort(log: &dyn ActivityLog, entry: ActivityLogEntry) {
    if let Err(err) = log.record(&entry).await {
        tracing::warn!(
            user = %entry.user,
            cause = %entry.cause,
            kind = %entry.kind,
            error = %err,
            "failed to record activity"
        );
    }
}

/// Activity log held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry, in append order.
    ///
    /// Entries stay readable after a writer panicked while holding the lock.
    pub fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn for_cause(&self, cause: &CauseId) -> Vec<ActivityLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.cause == *cause)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn record(&self, entry: &ActivityLogEntry) -> Result<(), ActivityError> {
        self.entries
            .write()
            .map_err(|_| ActivityError::Unavailable("activity log lock poisoned".into()))?
            .push(entry.clone());
        Ok(())
    }
}

/// Emits every entry as a structured event on the `aid::activity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivityLog for TracingActivityLog {
    async fn record(&self, entry: &ActivityLogEntry) -> Result<(), ActivityError> {
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|e| ActivityError::Unavailable(e.to_string()))?;
        tracing::info!(
            target: "aid::activity",
            user = %entry.user,
            cause = %entry.cause,
            kind = %entry.kind,
            timestamp = %entry.timestamp,
            metadata = %metadata,
            "activity"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use aid_types::{ActivityKind, UserId};

    /// Sink that rejects every entry.
    pub(crate) struct FailingActivityLog;

    #[async_trait]
    impl ActivityLog for FailingActivityLog {
        async fn record(&self, _entry: &ActivityLogEntry) -> Result<(), ActivityError> {
            Err(ActivityError::Unavailable("sink offline".into()))
        }
    }

    #[tokio::test]
    async fn in_memory_log_appends_in_order() {
        let log = InMemoryActivityLog::new();
        let cause = CauseId::new();
        let user = UserId::new();

        log.record(&ActivityLogEntry::new(user, cause, ActivityKind::Like))
            .await
            .unwrap();
        log.record(&ActivityLogEntry::new(user, CauseId::new(), ActivityKind::Like))
            .await
            .unwrap();
        log.record(&ActivityLogEntry::new(user, cause, ActivityKind::Unlike))
            .await
            .unwrap();

        assert_eq!(log.len(), 3);
        let kinds: Vec<_> = log.for_cause(&cause).into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActivityKind::Like, ActivityKind::Unlike]);
    }

    #[tokio::test]
    async fn history_survives_a_poisoned_lock() {
        let log = InMemoryActivityLog::new();
        let cause = CauseId::new();
        for kind in [ActivityKind::Like, ActivityKind::Unlike] {
            log.record(&ActivityLogEntry::new(UserId::new(), cause, kind))
                .await
                .unwrap();
        }

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = log.entries.write().unwrap();
            panic!("writer crashed");
        }));
        assert!(poisoned.is_err());
        assert!(log.entries.is_poisoned());

        assert_eq!(log.len(), 2);
        assert_eq!(log.for_cause(&cause).len(), 2);
        assert!(matches!(
            log.record(&ActivityLogEntry::new(UserId::new(), cause, ActivityKind::Like))
                .await,
            Err(ActivityError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn tracing_log_accepts_entries() {
        let entry = ActivityLogEntry::new(UserId::new(), CauseId::new(), ActivityKind::EnrollRequested)
            .with("enrollmentId", "e-1");
        TracingActivityLog.record(&entry).await.unwrap();
    }

    #[tokio::test]
    async fn best_effort_swallows_sink_failures() {
        let entry = ActivityLogEntry::new(UserId::new(), CauseId::new(), ActivityKind::Like);
        record_best_effort(&FailingActivityLog, entry).await;
    }
}
