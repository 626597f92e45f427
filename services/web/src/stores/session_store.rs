//! services/web/src/stores/session_store.rs
//!
//! Holds the current login session and mirrors it to the key-value store so it
//! survives a restart.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use nebulearn_core::domain::{User, UserSession};
use nebulearn_core::ports::{KeyValueStore, PortError, PortResult, UserRepository};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{read_json, remove_logged, write_json, SESSION_KEY};

/// Sessions expire this long after login.
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

/// Outcome of the side-effect-free session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    Missing,
    Expired,
    Active,
}

pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    users: Arc<dyn UserRepository>,
    current: RwLock<Option<UserSession>>,
}

impl SessionStore {
    /// Creates the store, picking up a previously persisted session if it is still valid.
    ///
    /// An expired or unreadable session is removed and the store starts logged out.
    pub async fn restore(kv: Arc<dyn KeyValueStore>, users: Arc<dyn UserRepository>) -> Self {
        let restored = match read_json::<UserSession>(kv.as_ref(), SESSION_KEY).await {
            Ok(Some(session)) if !session.is_expired_at(Utc::now()) => {
                info!("Session restored for user {}", session.user.username);
                Some(session)
            }
            Ok(Some(_)) => {
                info!("Expired session removed from storage");
                remove_logged(kv.as_ref(), SESSION_KEY).await;
                None
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to restore session: {}", e);
                remove_logged(kv.as_ref(), SESSION_KEY).await;
                None
            }
        };

        Self {
            kv,
            users,
            current: RwLock::new(restored),
        }
    }

    /// Verifies the credentials and starts a new session.
    ///
    /// Unknown usernames and wrong passwords both fail with `PortError::Unauthorized`.
    pub async fn login(&self, username: &str, password: &str) -> PortResult<UserSession> {
        let credentials = self
            .users
            .find_by_username(username)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => {
                    warn!("Login attempt for unknown user '{}'", username);
                    PortError::Unauthorized
                }
                other => other,
            })?;

        let parsed_hash = PasswordHash::new(&credentials.hashed_password)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {}", e)))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            warn!("Wrong password for user '{}'", username);
            return Err(PortError::Unauthorized);
        }

        let now = Utc::now();
        let user = self.users.record_login(username, now).await?;
        let session = UserSession {
            user,
            session_id: format!("session_{}", Uuid::new_v4().simple()),
            expires_at: now + Duration::minutes(SESSION_TIMEOUT_MINUTES),
            last_activity: now,
        };

        self.persist(&session).await;
        *self.current.write().await = Some(session.clone());
        info!("User '{}' logged in", username);
        Ok(session)
    }

    /// Classifies the held session against `now` without changing anything.
    pub async fn check(&self, now: DateTime<Utc>) -> SessionCheck {
        match self.current.read().await.as_ref() {
            None => SessionCheck::Missing,
            Some(session) if session.is_expired_at(now) => SessionCheck::Expired,
            Some(_) => SessionCheck::Active,
        }
    }

    /// Stamps `last_activity` on the held session and persists it.
    /// Returns the updated session, or `None` when no session is held.
    pub async fn touch_activity(&self, now: DateTime<Utc>) -> Option<UserSession> {
        let touched = {
            let mut current = self.current.write().await;
            let session = current.as_mut()?;
            session.last_activity = now;
            session.clone()
        };
        self.persist(&touched).await;
        Some(touched)
    }

    /// True when a live session is held. Logs out an expired session and refreshes
    /// the activity stamp of a live one.
    pub async fn is_authenticated(&self) -> bool {
        let now = Utc::now();
        match self.check(now).await {
            SessionCheck::Missing => false,
            SessionCheck::Expired => {
                info!("Session expired");
                self.logout().await;
                false
            }
            SessionCheck::Active => self.touch_activity(now).await.is_some(),
        }
    }

    pub async fn logout(&self) {
        *self.current.write().await = None;
        remove_logged(self.kv.as_ref(), SESSION_KEY).await;
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn current_session(&self) -> Option<UserSession> {
        self.current.read().await.clone()
    }

    async fn persist(&self, session: &UserSession) {
        if let Err(e) = write_json(self.kv.as_ref(), SESSION_KEY, session).await {
            error!("Failed to save session to storage: {}", e);
        }
    }
}
