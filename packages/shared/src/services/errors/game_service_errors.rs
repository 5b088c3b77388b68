use crate::services::errors::room_service_errors::RoomServiceError;

#[derive(Debug, PartialEq)]
pub enum GameServiceError {
    RoomNotActive,
    MalformedMove(String),
    OutOfTurn,
    PlayerNotInRoom,
    RoomError(RoomServiceError),
}

impl std::fmt::Display for GameServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameServiceError::RoomNotActive => write!(f, "Room is not active"),
            GameServiceError::MalformedMove(msg) => write!(f, "Malformed move: {}", msg),
            GameServiceError::OutOfTurn => write!(f, "Move not allowed: not your turn"),
            GameServiceError::PlayerNotInRoom => write!(f, "Player is not in this room"),
            GameServiceError::RoomError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GameServiceError {}

impl From<RoomServiceError> for GameServiceError {
    fn from(err: RoomServiceError) -> Self {
        GameServiceError::RoomError(err)
    }
}
