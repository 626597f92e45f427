//! services/web/src/stores/mod.rs
//!
//! Stores layered over the `KeyValueStore` port. Persistence failures never escape a
//! store: they are logged and read as "no data".

pub mod cache_store;
pub mod progress_store;
pub mod session_store;

pub use cache_store::CacheStore;
pub use progress_store::ProgressStore;
pub use session_store::{SessionCheck, SessionStore};

use nebulearn_core::ports::{KeyValueStore, PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

//=========================================================================================
// Storage Keys
//=========================================================================================

pub const SESSION_KEY: &str = "nebulearn_session";
pub const LAST_PAGE_KEY: &str = "nebulearn_last_page";
pub const STUDY_SESSIONS_KEY: &str = "nebulearn_study_sessions";
const CACHE_KEY_PREFIX: &str = "nebulearn_cache_";
const DECK_STATUSES_KEY_PREFIX: &str = "nebulearn_deck_statuses_";

pub fn cache_key(user_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, user_id)
}

pub fn deck_statuses_key(user_id: &str) -> String {
    format!("{}{}", DECK_STATUSES_KEY_PREFIX, user_id)
}

//=========================================================================================
// JSON Helpers
//=========================================================================================

/// Reads and parses the value under `key`.
///
/// `Ok(None)` when the key is absent; `Corrupted` when the stored text does not parse.
pub(crate) async fn read_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> PortResult<Option<T>> {
    let Some(text) = kv.get_item(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| PortError::Corrupted {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> PortResult<()> {
    let text = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
    kv.set_item(key, &text).await
}

/// Converts loosely-typed JSON records into `T`, dropping (and logging) any that do
/// not fit the expected shape.
pub(crate) fn parse_records<T: DeserializeOwned>(values: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    let total = values.len();
    let parsed: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if parsed.len() < total {
        warn!("Dropped {} malformed {} record(s)", total - parsed.len(), what);
    }
    parsed
}

/// Removes `key`, logging instead of failing.
pub(crate) async fn remove_logged(kv: &dyn KeyValueStore, key: &str) {
    if let Err(e) = kv.remove_item(key).await {
        error!("Failed to remove '{}' from storage: {}", key, e);
    }
}
