//! crates/nebulearn_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//!
//! Every struct here is also a persisted shape: field names are camelCase and dates
//! are ISO-8601 strings, so the JSON written to the key-value store stays readable
//! by anything that understands the original storage layout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// A user of the tracker, looked up by username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub last_login_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains the password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// The login session held for the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user: User,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl UserSession {
    /// A session is expired once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

//=========================================================================================
// Decks and Cards
//=========================================================================================

/// Difficulty tier of a deck, and the difficulty recorded for a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Capitalized label used on deck badges ("Easy", "Medium", "Hard").
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single flashcard. Review fields are carried but never scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    pub deck_id: String,
    /// How well the card is retained.
    pub difficulty: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A named collection of study cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub cards: Vec<Card>,
    pub total_cards: u32,
    pub due_cards: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<DateTime<Utc>>,
}

//=========================================================================================
// Study Sessions and Snapshots
//=========================================================================================

/// One day's recorded practice outcome for one deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub deck_id: String,
    pub deck_name: String,
    /// Calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub difficulty: Difficulty,
    pub cards_studied: u32,
    pub success_rate: u32,
}

impl StudySession {
    pub fn is_cell(&self, deck_id: &str, date: NaiveDate) -> bool {
        self.deck_id == deck_id && self.date == date
    }
}

/// The screens a user can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Decks,
    Progress,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Decks => "decks",
            Page::Progress => "progress",
        }
    }

    /// The route serving this screen.
    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Decks => "/decks",
            Page::Progress => "/progress",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Page::Home),
            "decks" => Ok(Page::Decks),
            "progress" => Ok(Page::Progress),
            other => Err(format!("unknown page '{}'", other)),
        }
    }
}

/// A user's decks and study history, without cache bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserSnapshot {
    pub decks: Vec<Deck>,
    pub study_sessions: Vec<StudySession>,
    pub last_page: Page,
}

/// A denormalized, time-stamped copy of a user's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CachedData {
    pub decks: Vec<Deck>,
    pub study_sessions: Vec<StudySession>,
    pub last_page: Page,
    pub cache_timestamp: DateTime<Utc>,
}

impl CachedData {
    pub fn stamp(snapshot: UserSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            decks: snapshot.decks,
            study_sessions: snapshot.study_sessions,
            last_page: snapshot.last_page,
            cache_timestamp: now,
        }
    }

    pub fn into_snapshot(self) -> UserSnapshot {
        UserSnapshot {
            decks: self.decks,
            study_sessions: self.study_sessions,
            last_page: self.last_page,
        }
    }
}

//=========================================================================================
// Deck Status
//=========================================================================================

/// Three-level health indicator for a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Green,
    Orange,
    Red,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Green => "green",
            StatusLevel::Orange => "orange",
            StatusLevel::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DeckStatus {
    pub deck_id: String,
    pub status: StatusLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<DateTime<Utc>>,
    /// Mean success rate over the deck's sessions, unrounded.
    pub success_rate: f64,
}
