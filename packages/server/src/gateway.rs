use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::models::events::{ClientEvent, ServerEvent};
use shared::models::session::Session;
use shared::services::auth_service::{authenticate_connection, TokenClaims};

use crate::dispatch;
use crate::state::AppState;

/// WebSocket entry point. Authentication happens before the upgrade:
/// a missing or invalid token refuses the connection and no session is
/// ever created.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let token = extract_token(&params, &headers);

    let claims = match authenticate_connection(state.token_verifier.as_ref(), token.as_deref()) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(%err, "connection rejected");
            return (StatusCode::UNAUTHORIZED, err.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, claims))
}

/// Token from `?token=` query parameter, falling back to an
/// `Authorization: Bearer` header.
fn extract_token(params: &HashMap<String, String>, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = params.get("token") {
        return Some(token.clone());
    }

    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn handle_socket(mut socket: WebSocket, state: AppState, claims: TokenClaims) {
    let connection_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let session = Session::new(&connection_id, &claims.sub, &claims.username, tx);

    info!(
        user_id = %claims.sub,
        username = %claims.username,
        connection_id = %connection_id,
        "user connected"
    );

    state.sessions.register(session.clone()).await;
    persist_session(&state, &session).await;

    session.send(ServerEvent::Welcome {
        connection_id: connection_id.clone(),
        message: "Connected to game server".to_string(),
    });

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(event) => {
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(err) => {
                                warn!(%err, "dropping unserializable event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // All senders gone: the session was torn down elsewhere.
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => dispatch::dispatch(&state, &connection_id, event).await,
                            Err(err) => {
                                debug!(%err, connection_id = %connection_id, "unparseable frame");
                                session.send(ServerEvent::Error {
                                    message: "Invalid message format".to_string(),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary frames are not part of the protocol;
                    // ping/pong is handled by the transport.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(%err, connection_id = %connection_id, "socket error");
                        break;
                    }
                }
            }
        }
    }

    dispatch::handle_disconnect(&state, &connection_id).await;
}

/// Best-effort write of the session record to the pluggable store; the
/// in-memory registry stays authoritative either way.
async fn persist_session(state: &AppState, session: &Session) {
    let record = session.record();
    let payload = match serde_json::to_string(&record) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "session record serialization failed");
            return;
        }
    };

    if let Err(err) = state
        .session_store
        .set(
            &dispatch::session_key(&session.connection_id),
            &payload,
            Some(state.session_ttl),
        )
        .await
    {
        warn!(%err, "session store write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_from_query() {
        let mut params = HashMap::new();
        params.insert("token".to_string(), "abc123".to_string());

        let token = extract_token(&params, &HeaderMap::new());
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer xyz789"));

        let token = extract_token(&HashMap::new(), &headers);
        assert_eq!(token.as_deref(), Some("xyz789"));
    }

    #[test]
    fn test_query_token_wins_over_header() {
        let mut params = HashMap::new();
        params.insert("token".to_string(), "from-query".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));

        let token = extract_token(&params, &headers);
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_no_token_anywhere() {
        assert!(extract_token(&HashMap::new(), &HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_token(&HashMap::new(), &headers).is_none());
    }
}
