pub mod auth_service;
pub mod errors;
pub mod game_service;
pub mod matchmaking_service;
pub mod room_service;
pub mod session_registry;
