#[derive(Debug, PartialEq)]
pub enum RoomServiceError {
    RoomNotFound,
    RoomFull,
    GameNotStarted,
}

impl std::fmt::Display for RoomServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomServiceError::RoomNotFound => write!(f, "Room not found"),
            RoomServiceError::RoomFull => write!(f, "Room is full"),
            RoomServiceError::GameNotStarted => write!(f, "Game has not started"),
        }
    }
}

impl std::error::Error for RoomServiceError {}
