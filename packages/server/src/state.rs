use std::sync::Arc;
use std::time::Duration;

use shared::repositories::session_store::SessionStore;
use shared::services::auth_service::TokenVerifier;
use shared::services::game_service::GameService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::room_service::RoomService;
use shared::services::session_registry::SessionRegistry;

/// Everything a handler needs, injected rather than reached for through
/// globals. Each table (sessions, rooms, queues) has exactly one owner
/// in here.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub rooms: Arc<RoomService>,
    pub games: Arc<GameService>,
    pub matchmaking: Arc<MatchmakingService>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub session_store: Arc<dyn SessionStore>,
    pub session_ttl: Duration,
}
