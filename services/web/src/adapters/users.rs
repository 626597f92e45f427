//! services/web/src/adapters/users.rs
//!
//! The mock user "database": a fixed table of users keyed by username, all sharing the
//! demo password. Implements the `UserRepository` port so a real backing store can
//! replace it without touching the session store.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nebulearn_core::domain::{User, UserCredentials};
use nebulearn_core::ports::{PortError, PortResult, UserRepository};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// The one password every mock user accepts.
pub const DEMO_PASSWORD: &str = "demo123";

pub struct MockUserRepository {
    users: RwLock<HashMap<String, UserCredentials>>,
    latency: Duration,
}

impl MockUserRepository {
    /// Builds the seeded table. `latency` is slept on every lookup to stand in for a
    /// network round trip.
    pub fn new(latency: Duration) -> PortResult<Self> {
        let hashed_password = hash_password(DEMO_PASSWORD)?;
        let now = Utc::now();

        let seeded = [
            ("user1", "demo_user", "demo@nebulearn.com", seed_date(2025, 1, 1)),
            ("user2", "student1", "student@nebulearn.com", seed_date(2025, 2, 1)),
        ];

        let users = seeded
            .into_iter()
            .map(|(id, username, email, created_at)| {
                let credentials = UserCredentials {
                    user: User {
                        id: id.to_string(),
                        username: username.to_string(),
                        email: email.to_string(),
                        last_login_at: now,
                        created_at,
                    },
                    hashed_password: hashed_password.clone(),
                };
                (username.to_string(), credentials)
            })
            .collect();

        Ok(Self {
            users: RwLock::new(users),
            latency,
        })
    }
}

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> PortResult<User> {
        let mut users = self.users.write().await;
        let credentials = users
            .get_mut(username)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))?;
        credentials.user.last_login_at = at;
        Ok(credentials.user.clone())
    }
}
