use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::matchmaking::DEFAULT_RATING;

/// A player as seen by a room: a snapshot of the authenticated identity
/// plus per-room bookkeeping. Owned by exactly one session; rooms hold
/// clones appended in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub connection_id: String,
    pub rating: i32,
    pub score: u32,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: &str, username: &str, connection_id: &str) -> Self {
        Self::with_rating(id, username, connection_id, DEFAULT_RATING)
    }

    pub fn with_rating(id: &str, username: &str, connection_id: &str, rating: i32) -> Self {
        Player {
            id: id.to_string(),
            username: username.to_string(),
            connection_id: connection_id.to_string(),
            rating,
            score: 0,
            joined_at: Utc::now(),
        }
    }
}
