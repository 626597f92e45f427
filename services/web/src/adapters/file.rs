//! services/web/src/adapters/file.rs
//!
//! A `KeyValueStore` persisted as a single JSON object on disk, the way a browser
//! keeps local storage for one origin. Every write rewrites the whole file.

use async_trait::async_trait;
use nebulearn_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct FileStore {
    path: PathBuf,
    quota_bytes: usize,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing items.
    ///
    /// A missing file starts empty. An unreadable or malformed file also starts empty;
    /// it is left on disk until the next successful write replaces it.
    pub async fn open(path: impl Into<PathBuf>, quota_bytes: usize) -> PortResult<Self> {
        let path = path.into();
        let items = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, String>>(&text) {
                Ok(items) => {
                    info!("Loaded {} stored items from {}", items.len(), path.display());
                    items
                }
                Err(e) => {
                    warn!("Ignoring malformed storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PortError::Storage(e.to_string())),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Storage(e.to_string()))?;
        }

        Ok(Self {
            path,
            quota_bytes,
            items: Mutex::new(items),
        })
    }

    /// Applies `change` to a copy of the items and commits it only once it is on disk.
    async fn write_with<F>(&self, change: F) -> PortResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut items = self.items.lock().await;
        let mut next = items.clone();
        change(&mut next);

        let text = serde_json::to_string(&next).map_err(|e| PortError::Storage(e.to_string()))?;
        if text.len() > self.quota_bytes {
            return Err(PortError::QuotaExceeded {
                needed: text.len(),
                quota: self.quota_bytes,
            });
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text.as_bytes())
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;

        *items = next;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        self.write_with(|items| {
            items.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> PortResult<()> {
        if !self.items.lock().await.contains_key(key) {
            return Ok(());
        }
        self.write_with(|items| {
            items.remove(key);
        })
        .await
    }
}
