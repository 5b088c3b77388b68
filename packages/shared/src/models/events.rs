use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::matchmaking::{GameMatch, QueueMode, QueueStats, DEFAULT_RATING};
use crate::models::player::Player;
use crate::models::room::{AppliedMove, GameState, MoveData, Room};

fn default_rating() -> i32 {
    DEFAULT_RATING
}

/// Everything a client can ask of the server, as one tagged union so the
/// dispatch match is exhaustive. Wire shape: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
    },
    PlayerMove(MoveData),
    GetRoomInfo {
        room_id: String,
    },
    JoinQueue {
        mode: QueueMode,
        #[serde(default = "default_rating")]
        rating: i32,
    },
    LeaveQueue {
        mode: QueueMode,
    },
    QueueStats {
        mode: QueueMode,
    },
    Ping,
}

/// Server-to-client notifications. Room-scoped events go to every member;
/// rejections go to the acting connection only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Welcome {
        connection_id: String,
        message: String,
    },
    PlayerJoined {
        players: Vec<Player>,
        count: usize,
        message: String,
    },
    GameStarted {
        game_state: GameState,
    },
    GameUpdate {
        game_state: GameState,
        last_move: AppliedMove,
        player: String,
    },
    PlayerLeft {
        players: Vec<Player>,
        message: String,
    },
    RoomFull {
        message: String,
    },
    InvalidMove {
        message: String,
    },
    RoomInfo {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<Room>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    MatchFound {
        game_match: GameMatch,
    },
    QueueJoined {
        mode: QueueMode,
        position: usize,
    },
    QueueLeft {
        mode: QueueMode,
        removed: bool,
    },
    QueueStats(QueueStats),
    Pong {
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}
