//! crates/nebulearn_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where data is actually kept (a browser-style key-value
//! store, a file, a mock user table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::{User, UserCredentials, UserSnapshot};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid username or password")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("Corrupted record under '{key}': {reason}")]
    Corrupted { key: String, reason: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// String-keyed persistence with the semantics of browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key is absent.
    async fn get_item(&self, key: &str) -> PortResult<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> PortResult<()>;
}

/// Lookup of login identities.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    /// Stamps `last_login_at` and returns the updated user.
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> PortResult<User>;
}

/// The backing "database" consulted when a user's cached snapshot is missing.
#[async_trait]
pub trait StudyDataSource: Send + Sync {
    async fn fetch_user_data(&self, user_id: &str) -> PortResult<UserSnapshot>;
}
