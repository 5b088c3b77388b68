pub mod events;
pub mod matchmaking;
pub mod player;
pub mod room;
pub mod session;
