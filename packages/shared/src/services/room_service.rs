use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::info;

use crate::models::player::Player;
use crate::models::room::{AppliedMove, GameState, Room, RoomStatus};
use crate::services::errors::room_service_errors::RoomServiceError;

/// Result of a successful join: a snapshot of the room after the append,
/// and whether this join filled the room and started the game.
#[derive(Debug, Clone)]
pub struct RoomJoin {
    pub room: Room,
    pub started: bool,
}

/// Owner of the room table. Rooms are created on first join, filled in
/// join order, and reaped as soon as the last player leaves; no zombie
/// rooms persist. All game-state mutation funnels through `record_move`.
pub struct RoomService {
    rooms: Mutex<HashMap<String, Room>>,
    max_players: usize,
}

impl RoomService {
    pub fn new(max_players: usize) -> Self {
        RoomService {
            rooms: Mutex::new(HashMap::new()),
            max_players,
        }
    }

    /// Appends the player, creating the room if needed. Filling the room
    /// atomically activates it and initializes the game state. A full
    /// room rejects the join without mutating anything.
    pub async fn join_room(
        &self,
        room_id: &str,
        player: Player,
    ) -> Result<RoomJoin, RoomServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id, self.max_players));

        if room.is_full() {
            return Err(RoomServiceError::RoomFull);
        }

        let username = player.username.clone();
        room.players.push(player);

        let started = room.players.len() == room.max_players;
        if started {
            room.status = RoomStatus::Active;
            room.game_state = Some(GameState::new());
        }

        info!(
            room_id,
            username = %username,
            count = room.players.len(),
            capacity = room.max_players,
            "player joined room"
        );

        Ok(RoomJoin {
            room: room.clone(),
            started,
        })
    }

    /// Removes the player. An emptied room is deleted and `None` is
    /// returned; otherwise the remaining-room snapshot is returned so the
    /// caller can notify the members left behind. A departure from an
    /// active room completes it: the game cannot continue short-handed.
    pub async fn leave_room(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<Room>, RoomServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or(RoomServiceError::RoomNotFound)?;

        let before = room.players.len();
        room.players.retain(|p| p.id != player_id);
        let removed = room.players.len() < before;

        if room.players.is_empty() {
            rooms.remove(room_id);
            info!(room_id, "room deleted (empty)");
            return Ok(None);
        }

        if removed && room.status == RoomStatus::Active {
            room.status = RoomStatus::Completed;
        }

        Ok(Some(room.clone()))
    }

    pub async fn get_room_info(&self, room_id: &str) -> Result<Room, RoomServiceError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or(RoomServiceError::RoomNotFound)
    }

    /// The single mutation path for game state: appends the accepted move
    /// and advances the turn pointer. Re-checks room existence so callers
    /// that validated against a snapshot and then suspended get a clean
    /// not-found instead of resurrecting a reaped room.
    pub async fn record_move(
        &self,
        room_id: &str,
        applied: AppliedMove,
    ) -> Result<GameState, RoomServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or(RoomServiceError::RoomNotFound)?;

        let player_count = room.players.len().max(1);
        let state = room
            .game_state
            .as_mut()
            .ok_or(RoomServiceError::GameNotStarted)?;

        state.moves.push(applied);
        state.current_player_index = (state.current_player_index + 1) % player_count;

        Ok(state.clone())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}
