//! services/web/src/web/study.rs
//!
//! Study-data operations shared by the HTML pages and the JSON API.

use chrono::{NaiveDate, Utc};
use nebulearn_core::calendar::{average_success_rate, toggle_cell, CellChange};
use nebulearn_core::domain::{CachedData, DeckStatus, Page, User, UserSnapshot};
use nebulearn_core::ports::{PortError, PortResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use crate::web::state::AppState;

/// The user's snapshot, or an empty one when nothing can be loaded.
pub async fn load_or_empty(state: &AppState, user: &User) -> CachedData {
    match state.cache.load_user_data(&user.id).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to load study data for user {}: {}", user.id, e);
            CachedData::stamp(UserSnapshot::default(), Utc::now())
        }
    }
}

/// Result of activating one calendar cell.
pub struct ToggleOutcome {
    pub change: CellChange,
    pub data: CachedData,
    pub average_success_rate: u32,
}

/// Advances one calendar cell and persists the full session list.
///
/// Days outside the configured calendar window are rejected.
pub async fn toggle_study_cell(
    state: &AppState,
    user: &User,
    deck_id: &str,
    date: NaiveDate,
) -> PortResult<ToggleOutcome> {
    if !state.config.calendar.contains(date) {
        return Err(PortError::InvalidInput(format!(
            "{} is outside the study calendar",
            date
        )));
    }
    let _guard = state.study_lock.lock().await;

    let data = state.cache.load_user_data(&user.id).await?;
    let mut snapshot = data.into_snapshot();

    let change = {
        let mut rng = StdRng::from_entropy();
        toggle_cell(&mut snapshot.study_sessions, &snapshot.decks, deck_id, date, &mut rng)?
    };
    info!("Calendar cell {} / {} for user {}: {:?}", deck_id, date, user.id, change);

    snapshot.last_page = Page::Progress;
    let average = average_success_rate(&snapshot.study_sessions);
    let data = state.cache.cache_user_data(&user.id, snapshot).await;
    state.progress.save(&data.study_sessions).await;

    Ok(ToggleOutcome {
        change,
        data,
        average_success_rate: average,
    })
}

/// Recomputes and stores the statuses for the user's current decks and sessions.
pub async fn recompute_statuses(state: &AppState, user: &User) -> Vec<DeckStatus> {
    let data = load_or_empty(state, user).await;
    state
        .cache
        .update_deck_statuses(&user.id, &data.decks, &data.study_sessions, Utc::now())
        .await
}
