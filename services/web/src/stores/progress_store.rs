//! services/web/src/stores/progress_store.rs
//!
//! The standalone study-session list written by the progress calendar after every
//! change, independent of any user's cache snapshot.

use nebulearn_core::calendar::dedupe_cells;
use nebulearn_core::domain::StudySession;
use nebulearn_core::ports::KeyValueStore;
use std::sync::Arc;
use tracing::error;

use super::{parse_records, read_json, write_json, STUDY_SESSIONS_KEY};

pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored sessions, or `None` when nothing has been saved yet or the stored
    /// value cannot be read.
    pub async fn load(&self) -> Option<Vec<StudySession>> {
        match read_json::<Vec<serde_json::Value>>(self.kv.as_ref(), STUDY_SESSIONS_KEY).await {
            Ok(Some(values)) => {
                let mut sessions: Vec<StudySession> = parse_records(values, "study session");
                dedupe_cells(&mut sessions);
                Some(sessions)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to load study sessions: {}", e);
                None
            }
        }
    }

    /// Replaces the stored list with `sessions`.
    pub async fn save(&self, sessions: &[StudySession]) {
        if let Err(e) = write_json(self.kv.as_ref(), STUDY_SESSIONS_KEY, sessions).await {
            error!("Failed to save study sessions: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::seed::seed_snapshot;
    use crate::adapters::MemoryStore;
    use crate::stores::testing::FailingStore;

    #[tokio::test]
    async fn save_replaces_the_whole_list() {
        let store = ProgressStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load().await, None);

        let sessions = seed_snapshot().study_sessions;
        store.save(&sessions).await;
        assert_eq!(store.load().await, Some(sessions.clone()));

        store.save(&sessions[..1]).await;
        assert_eq!(store.load().await.unwrap().len(), 1);

        store.save(&[]).await;
        assert_eq!(store.load().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn stored_dates_are_plain_days() {
        let kv = Arc::new(MemoryStore::new());
        let store = ProgressStore::new(kv.clone());
        store.save(&seed_snapshot().study_sessions[..1]).await;

        let text = kv.get_item(STUDY_SESSIONS_KEY).await.unwrap().unwrap();
        assert!(text.contains(r#""date":"2025-06-01""#));
    }

    #[tokio::test]
    async fn failing_storage_reads_as_nothing() {
        let store = ProgressStore::new(Arc::new(FailingStore));
        store.save(&seed_snapshot().study_sessions).await;
        assert_eq!(store.load().await, None);
    }
}
