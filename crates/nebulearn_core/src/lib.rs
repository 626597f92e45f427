pub mod calendar;
pub mod domain;
pub mod ports;
pub mod status;

pub use calendar::{average_success_rate, toggle_cell, CalendarWindow, CellChange, ProgressSummary};
pub use domain::{
    CachedData, Card, Deck, DeckStatus, Difficulty, Page, StatusLevel, StudySession, User,
    UserCredentials, UserSession, UserSnapshot,
};
pub use ports::{KeyValueStore, PortError, PortResult, StudyDataSource, UserRepository};
pub use status::derive_deck_statuses;
