use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::player::Player;

/// Domain default room capacity (two-player turn games).
pub const DEFAULT_MAX_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Active,
    Completed,
}

/// A move as submitted by a client. The `type` field is the only
/// structural requirement; everything else is passed through to the
/// move log untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveData {
    #[serde(rename = "type")]
    pub move_type: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl MoveData {
    pub fn new(move_type: &str) -> Self {
        MoveData {
            move_type: move_type.to_string(),
            data: serde_json::Map::new(),
        }
    }
}

/// A move that was accepted into a room's log, stamped with the acting
/// player's identity and acceptance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedMove {
    pub user_id: String,
    pub username: String,
    #[serde(flatten)]
    pub data: MoveData,
    pub timestamp: DateTime<Utc>,
}

/// The authoritative, append-only move log and turn pointer for a room.
/// Mutated only through `RoomService::record_move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub moves: Vec<AppliedMove>,
    pub current_player_index: usize,
    pub started: bool,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            moves: Vec::new(),
            current_player_index: 0,
            started: true,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// A bounded group of players sharing one game session.
///
/// Invariants, enforced by `RoomService`:
/// - `players.len() <= max_players`
/// - `status == Active` only while `players.len() == max_players`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    pub game_state: Option<GameState>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub max_players: usize,
}

impl Room {
    pub fn new(id: &str, max_players: usize) -> Self {
        Room {
            id: id.to_string(),
            players: Vec::new(),
            game_state: None,
            status: RoomStatus::Waiting,
            created_at: Utc::now(),
            max_players,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Join-order index of the given player, which is also their turn
    /// position.
    pub fn player_index(&self, user_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == user_id)
    }
}
