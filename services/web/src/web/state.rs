//! services/web/src/web/state.rs
//!
//! Defines the application's shared state and how it is assembled from configuration.

use crate::adapters::{FileStore, MemoryStore, MockUserRepository, SeedDataSource};
use crate::config::Config;
use crate::error::ApiError;
use crate::stores::{CacheStore, ProgressStore, SessionStore};
use nebulearn_core::ports::{KeyValueStore, PortResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub cache: Arc<CacheStore>,
    pub progress: Arc<ProgressStore>,
    /// Serializes read-modify-write cycles on a user's study sessions.
    pub study_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Wires the stores over the key-value store the configuration asks for.
    pub async fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        let kv: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => {
                info!("Using file storage at {}", path.display());
                let store = FileStore::open(path.clone(), config.storage_quota_bytes)
                    .await
                    .map_err(|source| ApiError::StorageOpen {
                        path: path.clone(),
                        source,
                    })?;
                Arc::new(store)
            }
            None => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(config, kv).await?)
    }

    /// Wires the stores over an existing key-value store.
    pub async fn with_store(config: Arc<Config>, kv: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let users = Arc::new(MockUserRepository::new(config.login_delay)?);
        let source = Arc::new(SeedDataSource::new(config.fetch_delay));

        Ok(Self {
            sessions: Arc::new(SessionStore::restore(kv.clone(), users).await),
            cache: Arc::new(CacheStore::new(kv.clone(), source)),
            progress: Arc::new(ProgressStore::new(kv)),
            study_lock: Arc::new(Mutex::new(())),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_STORAGE_QUOTA_BYTES;
    use nebulearn_core::CalendarWindow;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_with_storage(storage_path: Option<PathBuf>) -> Arc<Config> {
        Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            log_level: tracing::Level::INFO,
            storage_path,
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            login_delay: Duration::ZERO,
            fetch_delay: Duration::ZERO,
            calendar: CalendarWindow::default(),
        })
    }

    #[tokio::test]
    async fn unopenable_storage_names_the_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let path = blocker.join("storage.json");

        let err = AppState::from_config(config_with_storage(Some(path.clone())))
            .await
            .err()
            .unwrap();
        match err {
            ApiError::StorageOpen { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected StorageOpen, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn file_storage_keeps_the_session_across_restarts() {
        let dir = TempDir::new().unwrap();
        let config = config_with_storage(Some(dir.path().join("storage.json")));

        let state = AppState::from_config(config.clone()).await.unwrap();
        state.sessions.login("demo_user", "demo123").await.unwrap();
        drop(state);

        let restarted = AppState::from_config(config).await.unwrap();
        assert_eq!(
            restarted.sessions.current_user().await.map(|u| u.username),
            Some("demo_user".to_string())
        );
    }
}
