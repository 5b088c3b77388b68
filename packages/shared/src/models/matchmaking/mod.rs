use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating assumed for players who never supplied one.
pub const DEFAULT_RATING: i32 = 1000;

/// Maximum rating difference between two players for a pairing to form.
pub const DEFAULT_RATING_THRESHOLD: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    Casual,
    Ranked,
}

impl QueueMode {
    pub const ALL: [QueueMode; 2] = [QueueMode::Casual, QueueMode::Ranked];
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueMode::Casual => write!(f, "casual"),
            QueueMode::Ranked => write!(f, "ranked"),
        }
    }
}

/// A player's pending request to be matched, tagged with rating and
/// queue time. Lives in exactly one mode's queue until matched or
/// withdrawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player_id: String,
    pub username: String,
    pub rating: i32,
    pub queued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(player_id: &str, username: &str, rating: i32) -> Self {
        QueueEntry {
            player_id: player_id.to_string(),
            username: username.to_string(),
            rating,
            queued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Active,
    Completed,
}

/// A formed pairing. Completed is terminal; a match is never revived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: String,
    pub mode: QueueMode,
    pub players: Vec<QueueEntry>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub results: Option<serde_json::Value>,
}

impl GameMatch {
    pub fn new(mode: QueueMode, player1: QueueEntry, player2: QueueEntry) -> Self {
        GameMatch {
            id: Uuid::new_v4().to_string(),
            mode,
            players: vec![player1, player2],
            start_time: Utc::now(),
            end_time: None,
            status: MatchStatus::Active,
            results: None,
        }
    }
}

/// Operational snapshot of one queue; monitoring only, never consulted
/// for pairing decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub mode: QueueMode,
    pub queue_size: usize,
    pub avg_wait_ms: i64,
    pub top_ratings: Vec<i32>,
}
