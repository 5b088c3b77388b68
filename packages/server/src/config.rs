use std::str::FromStr;
use std::time::Duration;

use shared::models::matchmaking::DEFAULT_RATING_THRESHOLD;
use shared::models::room::DEFAULT_MAX_PLAYERS;
use shared::services::game_service::TurnPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub max_players: usize,
    pub rating_threshold: i32,
    pub turn_policy: TurnPolicy,
    pub session_ttl: Duration,
}

impl Config {
    /// Reads configuration from the environment. Only `JWT_SECRET` is
    /// mandatory; everything else has a domain default.
    pub fn from_env() -> Self {
        let jwt_secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET environment variable must be set");

        let turn_policy = match std::env::var("ENFORCE_TURN_ORDER").as_deref() {
            Ok("1") | Ok("true") => TurnPolicy::Enforced,
            _ => TurnPolicy::Relaxed,
        };

        Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3000),
            jwt_secret,
            max_players: env_parse("MAX_PLAYERS", DEFAULT_MAX_PLAYERS),
            rating_threshold: env_parse("RATING_THRESHOLD", DEFAULT_RATING_THRESHOLD),
            turn_policy,
            session_ttl: Duration::from_secs(env_parse("SESSION_TTL_SECS", 86_400)),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
