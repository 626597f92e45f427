//! services/web/src/adapters/seed.rs
//!
//! The stand-in "database" for study data. Every user gets the same two decks and
//! three study sessions after a simulated fetch delay.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use nebulearn_core::domain::{Deck, Difficulty, Page, StudySession, UserSnapshot};
use nebulearn_core::ports::{PortResult, StudyDataSource};
use std::time::Duration;
use tracing::info;

pub struct SeedDataSource {
    latency: Duration,
}

impl SeedDataSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl StudyDataSource for SeedDataSource {
    async fn fetch_user_data(&self, user_id: &str) -> PortResult<UserSnapshot> {
        info!("Loading study data from the database for user {}", user_id);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(seed_snapshot())
    }
}

/// The seeded decks and study history.
pub fn seed_snapshot() -> UserSnapshot {
    let now = Utc::now();
    let decks = vec![
        Deck {
            id: "deck_1".to_string(),
            name: "TypeScript Basics".to_string(),
            description: "Fundamental concepts of TypeScript including types, interfaces, and basic syntax.".to_string(),
            difficulty: Difficulty::Easy,
            cards: Vec::new(),
            total_cards: 156,
            due_cards: 23,
            created_at: now,
            last_studied: None,
        },
        Deck {
            id: "deck2".to_string(),
            name: "React Hooks".to_string(),
            description: "Advanced React patterns with hooks, context, and state management.".to_string(),
            difficulty: Difficulty::Medium,
            cards: Vec::new(),
            total_cards: 89,
            due_cards: 12,
            created_at: now,
            last_studied: None,
        },
    ];

    let study_sessions = [
        (1, Difficulty::Hard, 10, 60),
        (3, Difficulty::Hard, 15, 65),
        (5, Difficulty::Medium, 12, 75),
    ]
    .into_iter()
    .filter_map(|(day, difficulty, cards_studied, success_rate)| {
        Some(StudySession {
            deck_id: "deck_1".to_string(),
            deck_name: "TypeScript Basics".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, day)?,
            difficulty,
            cards_studied,
            success_rate,
        })
    })
    .collect();

    UserSnapshot {
        decks,
        study_sessions,
        last_page: Page::Home,
    }
}
