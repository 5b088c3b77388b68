use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::models::room::{AppliedMove, GameState, MoveData, RoomStatus};
use crate::services::errors::game_service_errors::GameServiceError;
use crate::services::room_service::RoomService;

/// Whether out-of-turn moves are rejected. Relaxed accepts any structurally
/// valid move from a room member (simultaneous-move games); Enforced
/// requires the actor to hold the turn pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPolicy {
    #[default]
    Relaxed,
    Enforced,
}

/// An accepted move: the state after application plus the applied move,
/// ready for fan-out to the room.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub game_state: GameState,
    pub last_move: AppliedMove,
}

/// Validates moves against room state and applies them through the room
/// table's single mutation path. Rejections are local to the acting
/// player; only accepted moves produce state for broadcast.
pub struct GameService {
    rooms: Arc<RoomService>,
    turn_policy: TurnPolicy,
}

impl GameService {
    pub fn new(rooms: Arc<RoomService>, turn_policy: TurnPolicy) -> Self {
        GameService { rooms, turn_policy }
    }

    pub fn turn_policy(&self) -> TurnPolicy {
        self.turn_policy
    }

    pub async fn apply_move(
        &self,
        room_id: &str,
        user_id: &str,
        username: &str,
        move_data: MoveData,
    ) -> Result<MoveOutcome, GameServiceError> {
        let room = self.rooms.get_room_info(room_id).await?;

        if room.status != RoomStatus::Active {
            return Err(GameServiceError::RoomNotActive);
        }
        if move_data.move_type.trim().is_empty() {
            return Err(GameServiceError::MalformedMove(
                "move is missing a type".to_string(),
            ));
        }

        let player_index = room
            .player_index(user_id)
            .ok_or(GameServiceError::PlayerNotInRoom)?;

        if self.turn_policy == TurnPolicy::Enforced {
            let state = room
                .game_state
                .as_ref()
                .ok_or(GameServiceError::RoomNotActive)?;
            if state.current_player_index != player_index {
                debug!(room_id, user_id, "out-of-turn move rejected");
                return Err(GameServiceError::OutOfTurn);
            }
        }

        let applied = AppliedMove {
            user_id: user_id.to_string(),
            username: username.to_string(),
            data: move_data,
            timestamp: Utc::now(),
        };

        // record_move re-checks existence under the room lock; if the room
        // was reaped between the snapshot above and here, the caller gets
        // a not-found instead of a write to a dead room.
        let game_state = self.rooms.record_move(room_id, applied.clone()).await?;

        Ok(MoveOutcome {
            game_state,
            last_move: applied,
        })
    }
}
