use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use server::config::Config;
use server::{gateway, routes, state};
use shared::models::session::Session;
use shared::repositories::session_store::InMemorySessionStore;
use shared::services::auth_service::JwtTokenVerifier;
use shared::services::game_service::GameService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::room_service::RoomService;
use shared::services::session_registry::{SessionListener, SessionRegistry};

/// Logs session lifecycle transitions; the hook other observers
/// (metrics etc.) would also register on.
struct SessionLogger;

impl SessionListener for SessionLogger {
    fn on_session_created(&self, session: &Session) {
        info!(
            connection_id = %session.connection_id,
            username = %session.username,
            "session opened"
        );
    }

    fn on_session_closed(&self, session: &Session) {
        info!(
            connection_id = %session.connection_id,
            username = %session.username,
            "session closed"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::from_env();

    // Set up services
    let sessions = Arc::new(SessionRegistry::new());
    sessions.add_listener(Arc::new(SessionLogger));

    let rooms = Arc::new(RoomService::new(config.max_players));
    let games = Arc::new(GameService::new(rooms.clone(), config.turn_policy));
    let matchmaking = Arc::new(MatchmakingService::new(config.rating_threshold));
    let token_verifier = Arc::new(JwtTokenVerifier::new(config.jwt_secret.clone()));
    let session_store = Arc::new(InMemorySessionStore::new());

    let app_state = state::AppState {
        sessions,
        rooms,
        games,
        matchmaking,
        token_verifier,
        session_store,
        session_ttl: config.session_ttl,
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/ws", get(gateway::ws_handler))
        .layer(cors)
        .with_state(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        turn_policy = ?config.turn_policy,
        "game server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
