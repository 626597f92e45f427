//! crates/nebulearn_core/src/calendar.rs
//!
//! The progress calendar: one cell per (deck, day), each cycling through
//! `absent -> hard -> medium -> easy -> absent` as it is activated.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use std::collections::HashSet;
use std::ops::Range;

use crate::domain::{Deck, Difficulty, StudySession};
use crate::ports::{PortError, PortResult};

/// Range for `cards_studied` on a newly created session.
pub const NEW_CARDS_STUDIED: Range<u32> = 5..25;
/// Range for `success_rate` on a newly created session.
pub const NEW_SUCCESS_RATE: Range<u32> = 60..100;

impl Difficulty {
    /// The difficulty a cell moves to when activated. `None` means no session.
    pub fn next_in_cycle(current: Option<Difficulty>) -> Option<Difficulty> {
        match current {
            None => Some(Difficulty::Hard),
            Some(Difficulty::Hard) => Some(Difficulty::Medium),
            Some(Difficulty::Medium) => Some(Difficulty::Easy),
            Some(Difficulty::Easy) => None,
        }
    }
}

/// What a single activation did to the session list.
#[derive(Debug, Clone, PartialEq)]
pub enum CellChange {
    Created(StudySession),
    Updated(StudySession),
    Removed(StudySession),
}

impl CellChange {
    /// The session now occupying the cell, if any.
    pub fn current(&self) -> Option<&StudySession> {
        match self {
            CellChange::Created(s) | CellChange::Updated(s) => Some(s),
            CellChange::Removed(_) => None,
        }
    }
}

pub fn session_for<'a>(
    sessions: &'a [StudySession],
    deck_id: &str,
    date: NaiveDate,
) -> Option<&'a StudySession> {
    sessions.iter().find(|s| s.is_cell(deck_id, date))
}

/// Advances the cell for `(deck_id, date)` one step through the cycle.
///
/// A new session gets random `cards_studied` and `success_rate`; later steps only
/// change its difficulty. Fails with `NotFound` if `deck_id` names no deck.
pub fn toggle_cell<R: Rng + ?Sized>(
    sessions: &mut Vec<StudySession>,
    decks: &[Deck],
    deck_id: &str,
    date: NaiveDate,
    rng: &mut R,
) -> PortResult<CellChange> {
    let deck = decks
        .iter()
        .find(|d| d.id == deck_id)
        .ok_or_else(|| PortError::NotFound(format!("Deck {} not found", deck_id)))?;

    let position = sessions.iter().position(|s| s.is_cell(deck_id, date));
    let current = position.map(|i| sessions[i].difficulty);

    let change = match (position, Difficulty::next_in_cycle(current)) {
        (Some(i), None) => CellChange::Removed(sessions.remove(i)),
        (Some(i), Some(next)) => {
            sessions[i].difficulty = next;
            CellChange::Updated(sessions[i].clone())
        }
        (None, next) => {
            let session = StudySession {
                deck_id: deck.id.clone(),
                deck_name: deck.name.clone(),
                date,
                difficulty: next.unwrap_or(Difficulty::Hard),
                cards_studied: rng.gen_range(NEW_CARDS_STUDIED),
                success_rate: rng.gen_range(NEW_SUCCESS_RATE),
            };
            sessions.push(session.clone());
            CellChange::Created(session)
        }
    };
    Ok(change)
}

/// Mean success rate over all sessions, rounded to the nearest integer; 0 when empty.
pub fn average_success_rate(sessions: &[StudySession]) -> u32 {
    if sessions.is_empty() {
        return 0;
    }
    let total: u64 = sessions.iter().map(|s| u64::from(s.success_rate)).sum();
    (total as f64 / sessions.len() as f64).round() as u32
}

/// Keeps the first session for each (deck, day) and drops the rest.
/// Returns the number of sessions dropped.
pub fn dedupe_cells(sessions: &mut Vec<StudySession>) -> usize {
    let before = sessions.len();
    let mut seen = HashSet::new();
    sessions.retain(|s| seen.insert((s.deck_id.clone(), s.date)));
    before - sessions.len()
}

//=========================================================================================
// Summary Panel and Calendar Window
//=========================================================================================

/// Figures shown under the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_sessions: usize,
    pub active_decks: usize,
    pub average_success_rate: u32,
    pub total_cards: u32,
}

impl ProgressSummary {
    pub fn compute(decks: &[Deck], sessions: &[StudySession]) -> Self {
        Self {
            total_sessions: sessions.len(),
            active_decks: decks.len(),
            average_success_rate: average_success_rate(sessions),
            total_cards: decks.iter().map(|d| d.total_cards).sum(),
        }
    }
}

/// A run of consecutive days rendered as calendar columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl CalendarWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.days)
            .map(|offset| self.start + Duration::days(i64::from(offset)))
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let offset = (date - self.start).num_days();
        offset >= 0 && offset < i64::from(self.days)
    }

    /// Column header such as `Jun 1`.
    pub fn label(date: NaiveDate) -> String {
        date.format("%b %-d").to_string()
    }
}

impl Default for CalendarWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
            days: 15,
        }
    }
}
