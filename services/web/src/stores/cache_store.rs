//! services/web/src/stores/cache_store.rs
//!
//! Per-user snapshot cache, last-visited page marker and persisted deck statuses.
//!
//! A snapshot older than [`CACHE_TIMEOUT_HOURS`] is discarded, and the next load goes
//! to the `StudyDataSource` instead.

use chrono::{DateTime, Duration, Utc};
use nebulearn_core::calendar::dedupe_cells;
use nebulearn_core::domain::{CachedData, Deck, DeckStatus, Page, StudySession, UserSnapshot};
use nebulearn_core::ports::{KeyValueStore, PortResult, StudyDataSource};
use nebulearn_core::status::derive_deck_statuses;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    cache_key, deck_statuses_key, parse_records, read_json, remove_logged, write_json,
    LAST_PAGE_KEY, SESSION_KEY,
};

/// Snapshots are served from cache for this long after they were written.
pub const CACHE_TIMEOUT_HOURS: i64 = 24;

//=========================================================================================
// Stored Record Shapes
//=========================================================================================

/// The snapshot as stored. Decks and sessions are kept loose so one bad entry does
/// not invalidate the rest.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedDataRecord {
    #[serde(default)]
    decks: Vec<serde_json::Value>,
    #[serde(default)]
    study_sessions: Vec<serde_json::Value>,
    #[serde(default)]
    last_page: Option<String>,
    cache_timestamp: DateTime<Utc>,
}

impl CachedDataRecord {
    fn to_domain(self) -> CachedData {
        let decks: Vec<Deck> = parse_records(self.decks, "deck");
        let mut study_sessions: Vec<StudySession> = parse_records(self.study_sessions, "study session");
        let duplicates = dedupe_cells(&mut study_sessions);
        if duplicates > 0 {
            warn!("Dropped {} duplicate study session(s) from cache", duplicates);
        }
        CachedData {
            decks,
            study_sessions,
            last_page: self
                .last_page
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            cache_timestamp: self.cache_timestamp,
        }
    }
}

//=========================================================================================
// CacheStore
//=========================================================================================

pub struct CacheStore {
    kv: Arc<dyn KeyValueStore>,
    source: Arc<dyn StudyDataSource>,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, source: Arc<dyn StudyDataSource>) -> Self {
        Self { kv, source }
    }

    /// Stamps the snapshot with the current time and persists it.
    pub async fn cache_user_data(&self, user_id: &str, snapshot: UserSnapshot) -> CachedData {
        let cached = CachedData::stamp(snapshot, Utc::now());
        match write_json(self.kv.as_ref(), &cache_key(user_id), &cached).await {
            Ok(()) => info!("Cache saved for user {}", user_id),
            Err(e) => error!("Failed to save cache for user {}: {}", user_id, e),
        }
        cached
    }

    pub async fn get_cached_data(&self, user_id: &str) -> Option<CachedData> {
        self.get_cached_data_at(user_id, Utc::now()).await
    }

    /// Returns the cached snapshot if it is no older than the cache window at `now`.
    /// Stale or unreadable snapshots are removed.
    pub async fn get_cached_data_at(&self, user_id: &str, now: DateTime<Utc>) -> Option<CachedData> {
        let key = cache_key(user_id);
        let record = match read_json::<CachedDataRecord>(self.kv.as_ref(), &key).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to load cache for user {}: {}", user_id, e);
                remove_logged(self.kv.as_ref(), &key).await;
                return None;
            }
        };

        if now - record.cache_timestamp > Duration::hours(CACHE_TIMEOUT_HOURS) {
            info!("Cache for user {} expired", user_id);
            remove_logged(self.kv.as_ref(), &key).await;
            return None;
        }
        Some(record.to_domain())
    }

    /// Serves the snapshot from cache when possible, otherwise fetches it from the data
    /// source and caches it.
    pub async fn load_user_data(&self, user_id: &str) -> PortResult<CachedData> {
        if let Some(mut cached) = self.get_cached_data(user_id).await {
            info!("Loading study data for user {} from cache", user_id);
            if let Some(last_page) = self.get_last_page().await {
                cached.last_page = last_page;
            }
            return Ok(cached);
        }

        let snapshot = self.source.fetch_user_data(user_id).await?;
        Ok(self.cache_user_data(user_id, snapshot).await)
    }

    //=====================================================================================
    // Last Page
    //=====================================================================================

    pub async fn save_last_page(&self, page: Page) {
        if let Err(e) = self.kv.set_item(LAST_PAGE_KEY, page.as_str()).await {
            warn!("Failed to save last page: {}", e);
        }
    }

    pub async fn get_last_page(&self) -> Option<Page> {
        match self.kv.get_item(LAST_PAGE_KEY).await {
            Ok(Some(raw)) => raw.parse().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load last page: {}", e);
                None
            }
        }
    }

    //=====================================================================================
    // Deck Statuses
    //=====================================================================================

    /// Recomputes every deck's status and replaces whatever was stored for the user.
    pub async fn update_deck_statuses(
        &self,
        user_id: &str,
        decks: &[Deck],
        sessions: &[StudySession],
        now: DateTime<Utc>,
    ) -> Vec<DeckStatus> {
        let statuses = derive_deck_statuses(decks, sessions, now);
        match write_json(self.kv.as_ref(), &deck_statuses_key(user_id), &statuses).await {
            Ok(()) => info!("Deck statuses saved for user {}", user_id),
            Err(e) => error!("Failed to save deck statuses for user {}: {}", user_id, e),
        }
        statuses
    }

    /// The statuses from the last recompute; empty when none are stored.
    pub async fn get_deck_statuses(&self, user_id: &str) -> Vec<DeckStatus> {
        match read_json::<Vec<serde_json::Value>>(self.kv.as_ref(), &deck_statuses_key(user_id)).await {
            Ok(Some(values)) => parse_records(values, "deck status"),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Failed to load deck statuses for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    //=====================================================================================
    // Reset
    //=====================================================================================

    /// Removes the stored session, snapshot, deck statuses and last-page marker.
    ///
    /// Only storage is touched; callers holding a `SessionStore` should also log out.
    pub async fn clear_all_user_data(&self, user_id: &str) {
        let kv = self.kv.as_ref();
        remove_logged(kv, SESSION_KEY).await;
        remove_logged(kv, &cache_key(user_id)).await;
        remove_logged(kv, &deck_statuses_key(user_id)).await;
        remove_logged(kv, LAST_PAGE_KEY).await;
        info!("Cleared all stored data for user {}", user_id);
    }
}
