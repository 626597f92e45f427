//! crates/nebulearn_core/src/status.rs
//!
//! Derives a green/orange/red health indicator for each deck from its study history.

use chrono::{DateTime, Utc};
use crate::domain::{Deck, DeckStatus, StatusLevel, StudySession};

const GREEN_MIN_RATE: f64 = 80.0;
const GREEN_MAX_DAYS: f64 = 7.0;
const ORANGE_MIN_RATE: f64 = 60.0;
const ORANGE_MAX_DAYS: f64 = 14.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Computes one status per deck, in deck order.
///
/// `now` is taken as an argument so the result depends only on the inputs.
pub fn derive_deck_statuses(
    decks: &[Deck],
    sessions: &[StudySession],
    now: DateTime<Utc>,
) -> Vec<DeckStatus> {
    decks
        .iter()
        .map(|deck| derive_one(deck, sessions, now))
        .collect()
}

fn derive_one(deck: &Deck, sessions: &[StudySession], now: DateTime<Utc>) -> DeckStatus {
    let deck_sessions: Vec<&StudySession> =
        sessions.iter().filter(|s| s.deck_id == deck.id).collect();

    let Some(latest) = deck_sessions.iter().map(|s| s.date).max() else {
        return DeckStatus {
            deck_id: deck.id.clone(),
            status: StatusLevel::Red,
            last_studied: None,
            success_rate: 0.0,
        };
    };

    let total: u64 = deck_sessions.iter().map(|s| u64::from(s.success_rate)).sum();
    let average = total as f64 / deck_sessions.len() as f64;

    // Dates are calendar days; anchor them at midnight UTC.
    let last_studied = latest.and_time(chrono::NaiveTime::MIN).and_utc();
    let days_since = (now - last_studied).num_seconds() as f64 / SECONDS_PER_DAY;

    DeckStatus {
        deck_id: deck.id.clone(),
        status: classify(average, days_since),
        last_studied: Some(last_studied),
        success_rate: average,
    }
}

/// Thresholds are checked in order: green first, then orange, otherwise red.
pub fn classify(average_rate: f64, days_since: f64) -> StatusLevel {
    if average_rate >= GREEN_MIN_RATE && days_since <= GREEN_MAX_DAYS {
        StatusLevel::Green
    } else if average_rate >= ORANGE_MIN_RATE && days_since <= ORANGE_MAX_DAYS {
        StatusLevel::Orange
    } else {
        StatusLevel::Red
    }
}
