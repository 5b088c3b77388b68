use chrono::Utc;
use tracing::{debug, info, warn};

use shared::models::events::{ClientEvent, ServerEvent};
use shared::models::matchmaking::{GameMatch, QueueEntry, QueueMode};
use shared::models::player::Player;
use shared::models::room::Room;
use shared::models::session::Session;
use shared::services::errors::room_service_errors::RoomServiceError;

use crate::state::AppState;

pub fn session_key(connection_id: &str) -> String {
    format!("session:{}", connection_id)
}

/// Routes one client event to the owning component. The match is
/// exhaustive: adding a `ClientEvent` variant without a handler is a
/// compile error. Every failure path ends as a rejection event on the
/// acting connection; nothing here propagates.
pub async fn dispatch(state: &AppState, connection_id: &str, event: ClientEvent) {
    let Some(session) = state.sessions.lookup(connection_id).await else {
        debug!(connection_id, "event from unknown connection dropped");
        return;
    };

    match event {
        ClientEvent::JoinRoom { room_id } => handle_join_room(state, &session, &room_id).await,
        ClientEvent::PlayerMove(move_data) => {
            handle_player_move(state, &session, move_data).await
        }
        ClientEvent::GetRoomInfo { room_id } => {
            handle_get_room_info(state, &session, &room_id).await
        }
        ClientEvent::JoinQueue { mode, rating } => {
            handle_join_queue(state, &session, mode, rating).await
        }
        ClientEvent::LeaveQueue { mode } => {
            let removed = state.matchmaking.dequeue(&session.user_id, mode).await;
            session.send(ServerEvent::QueueLeft { mode, removed });
        }
        ClientEvent::QueueStats { mode } => {
            let stats = state.matchmaking.queue_stats(mode).await;
            session.send(ServerEvent::QueueStats(stats));
        }
        ClientEvent::Ping => session.send(ServerEvent::Pong {
            timestamp: Utc::now(),
        }),
    }
}

async fn handle_join_room(state: &AppState, session: &Session, room_id: &str) {
    // A session sits in at most one room; switching rooms leaves the old
    // one first so it can be reaped if emptied.
    if let Some(previous) = session.room_id.clone() {
        if previous == room_id {
            session.send(ServerEvent::Error {
                message: "Already in this room".to_string(),
            });
            return;
        }
        leave_current_room(state, session, &previous).await;
    }

    let player = Player::new(&session.user_id, &session.username, &session.connection_id);
    seat_in_room(state, session, room_id, player).await;
}

/// Appends the player to the room and fans out the join notifications.
/// Shared between direct `join_room` requests and matchmaker seating.
async fn seat_in_room(state: &AppState, session: &Session, room_id: &str, player: Player) {
    match state.rooms.join_room(room_id, player).await {
        Ok(join) => {
            state
                .sessions
                .set_room(&session.connection_id, Some(room_id.to_string()))
                .await;

            let members = member_connections(&join.room);
            state
                .sessions
                .broadcast_to(
                    &members,
                    &ServerEvent::PlayerJoined {
                        players: join.room.players.clone(),
                        count: join.room.players.len(),
                        message: format!("{} joined the game", session.username),
                    },
                )
                .await;

            if join.started {
                if let Some(game_state) = join.room.game_state {
                    state
                        .sessions
                        .broadcast_to(&members, &ServerEvent::GameStarted { game_state })
                        .await;
                }
            }
        }
        Err(RoomServiceError::RoomFull) => {
            debug!(room_id, user_id = %session.user_id, "join rejected: room full");
            session.send(ServerEvent::RoomFull {
                message: "Room is full".to_string(),
            });
        }
        Err(err) => session.send(ServerEvent::Error {
            message: err.to_string(),
        }),
    }
}

async fn handle_player_move(
    state: &AppState,
    session: &Session,
    move_data: shared::models::room::MoveData,
) {
    let Some(room_id) = session.room_id.clone() else {
        session.send(ServerEvent::InvalidMove {
            message: "Player is not in a room".to_string(),
        });
        return;
    };

    match state
        .games
        .apply_move(&room_id, &session.user_id, &session.username, move_data)
        .await
    {
        Ok(outcome) => {
            info!(
                room_id,
                username = %session.username,
                move_type = %outcome.last_move.data.move_type,
                "move accepted"
            );
            // The update carries the full move log, so receivers converge
            // on the authoritative order even if two updates race on the
            // wire.
            match state.rooms.get_room_info(&room_id).await {
                Ok(room) => {
                    state
                        .sessions
                        .broadcast_to(
                            &member_connections(&room),
                            &ServerEvent::GameUpdate {
                                game_state: outcome.game_state,
                                last_move: outcome.last_move,
                                player: session.username.clone(),
                            },
                        )
                        .await;
                }
                Err(_) => debug!(room_id, "room gone before update fan-out"),
            }
        }
        // Any rejection during move handling, expected or not, surfaces
        // to the actor only.
        Err(err) => session.send(ServerEvent::InvalidMove {
            message: err.to_string(),
        }),
    }
}

async fn handle_get_room_info(state: &AppState, session: &Session, room_id: &str) {
    match state.rooms.get_room_info(room_id).await {
        Ok(room) => session.send(ServerEvent::RoomInfo {
            success: true,
            room: Some(room),
            error: None,
        }),
        Err(err) => session.send(ServerEvent::RoomInfo {
            success: false,
            room: None,
            error: Some(err.to_string()),
        }),
    }
}

async fn handle_join_queue(state: &AppState, session: &Session, mode: QueueMode, rating: i32) {
    let entry = QueueEntry::new(&session.user_id, &session.username, rating);

    match state.matchmaking.enqueue(entry, mode).await {
        Some(game_match) => seat_matched_players(state, &game_match).await,
        None => {
            let stats = state.matchmaking.queue_stats(mode).await;
            session.send(ServerEvent::QueueJoined {
                mode,
                position: stats.queue_size,
            });
        }
    }
}

/// A formed match becomes a room keyed by the match id; both players are
/// seated through the ordinary join path, which also emits game_started
/// once the second seat fills. Players whose session vanished between
/// queueing and pairing are skipped; the survivor waits in the room.
async fn seat_matched_players(state: &AppState, game_match: &GameMatch) {
    for queued in &game_match.players {
        let Some(peer) = state.sessions.lookup_by_user(&queued.player_id).await else {
            warn!(
                player_id = %queued.player_id,
                match_id = %game_match.id,
                "matched player no longer connected"
            );
            continue;
        };

        peer.send(ServerEvent::MatchFound {
            game_match: game_match.clone(),
        });

        if let Some(previous) = peer.room_id.clone() {
            leave_current_room(state, &peer, &previous).await;
        }

        let player = Player::with_rating(
            &peer.user_id,
            &peer.username,
            &peer.connection_id,
            queued.rating,
        );
        seat_in_room(state, &peer, &game_match.id, player).await;
    }
}

async fn leave_current_room(state: &AppState, session: &Session, room_id: &str) {
    match state.rooms.leave_room(room_id, &session.user_id).await {
        Ok(Some(room)) => {
            state
                .sessions
                .broadcast_to(
                    &member_connections(&room),
                    &ServerEvent::PlayerLeft {
                        players: room.players.clone(),
                        message: "A player left the game".to_string(),
                    },
                )
                .await;
        }
        Ok(None) => {}
        Err(err) => debug!(room_id, %err, "leave_room during switch failed"),
    }
    state
        .sessions
        .set_room(&session.connection_id, None)
        .await;
}

/// Disconnect cleanup. Safe to call more than once for the same
/// connection: the registry remove is idempotent and a second call finds
/// nothing to do.
pub async fn handle_disconnect(state: &AppState, connection_id: &str) {
    let Some(session) = state.sessions.remove(connection_id).await else {
        return;
    };

    for mode in QueueMode::ALL {
        state.matchmaking.dequeue(&session.user_id, mode).await;
    }

    if let Some(room_id) = &session.room_id {
        match state.rooms.leave_room(room_id, &session.user_id).await {
            Ok(Some(room)) => {
                state
                    .sessions
                    .broadcast_to(
                        &member_connections(&room),
                        &ServerEvent::PlayerLeft {
                            players: room.players.clone(),
                            message: "A player left the game".to_string(),
                        },
                    )
                    .await;
            }
            Ok(None) => {}
            Err(err) => debug!(room_id, %err, "leave_room on disconnect failed"),
        }
    }

    if let Err(err) = state.session_store.remove(&session_key(connection_id)).await {
        warn!(connection_id, %err, "session store cleanup failed");
    }

    info!(user_id = %session.user_id, connection_id, "user disconnected");
}

fn member_connections(room: &Room) -> Vec<String> {
    room.players.iter().map(|p| p.connection_id.clone()).collect()
}
