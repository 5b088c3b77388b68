//! End-to-end dispatch tests: client events in, server events out over
//! each connection's channel, no live socket required.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use server::dispatch::{dispatch, handle_disconnect};
use server::state::AppState;
use shared::models::events::{ClientEvent, ServerEvent};
use shared::models::matchmaking::QueueMode;
use shared::models::room::RoomStatus;
use shared::models::session::Session;
use shared::repositories::session_store::InMemorySessionStore;
use shared::services::auth_service::JwtTokenVerifier;
use shared::services::game_service::{GameService, TurnPolicy};
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::room_service::RoomService;
use shared::services::session_registry::SessionRegistry;

fn test_state() -> AppState {
    let rooms = Arc::new(RoomService::new(2));
    AppState {
        sessions: Arc::new(SessionRegistry::new()),
        games: Arc::new(GameService::new(rooms.clone(), TurnPolicy::Relaxed)),
        rooms,
        matchmaking: Arc::new(MatchmakingService::new(200)),
        token_verifier: Arc::new(JwtTokenVerifier::new("test-secret".to_string())),
        session_store: Arc::new(InMemorySessionStore::new()),
        session_ttl: Duration::from_secs(60),
    }
}

async fn connect(
    state: &AppState,
    connection_id: &str,
    user_id: &str,
    username: &str,
) -> (Session, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(connection_id, user_id, username, tx);
    state.sessions.register(session.clone()).await;
    (session, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn join_room(room_id: &str) -> ClientEvent {
    ClientEvent::JoinRoom {
        room_id: room_id.to_string(),
    }
}

fn place_move() -> ClientEvent {
    ClientEvent::PlayerMove(
        serde_json::from_str(r#"{"type":"place","position":4}"#).unwrap(),
    )
}

#[tokio::test]
async fn join_room_fills_and_starts_game() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;

    dispatch(&state, "c1", join_room("r1")).await;

    let room = state.rooms.get_room_info("r1").await.unwrap();
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.players.len(), 1);

    let events = drain(&mut rx1);
    assert!(matches!(events[0], ServerEvent::PlayerJoined { count: 1, .. }));

    dispatch(&state, "c2", join_room("r1")).await;

    let room = state.rooms.get_room_info("r1").await.unwrap();
    assert_eq!(room.status, RoomStatus::Active);
    assert_eq!(room.players.len(), 2);
    assert!(room.game_state.as_ref().unwrap().started);

    // Both members see the join and the start.
    for events in [drain(&mut rx1), drain(&mut rx2)] {
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::PlayerJoined { count: 2, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::GameStarted { .. })));
    }
}

#[tokio::test]
async fn accepted_move_broadcasts_identical_state() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;
    drain(&mut rx1);
    drain(&mut rx2);

    dispatch(&state, "c1", place_move()).await;

    let update1 = drain(&mut rx1);
    let update2 = drain(&mut rx2);
    assert_eq!(update1.len(), 1);
    assert_eq!(update2.len(), 1);

    match (&update1[0], &update2[0]) {
        (
            ServerEvent::GameUpdate {
                game_state: s1,
                last_move: m1,
                player: who1,
            },
            ServerEvent::GameUpdate {
                game_state: s2, ..
            },
        ) => {
            assert_eq!(who1, "alice");
            assert_eq!(s1.current_player_index, 1);
            assert_eq!(s1.moves.len(), 1);
            assert_eq!(m1.data.move_type, "place");
            // Both members observe the same authoritative state.
            assert_eq!(
                serde_json::to_value(s1).unwrap(),
                serde_json::to_value(s2).unwrap()
            );
        }
        other => panic!("expected game updates, got {:?}", other),
    }
}

#[tokio::test]
async fn third_join_gets_room_full_and_room_is_untouched() {
    let state = test_state();
    let (_p1, _rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, _rx2) = connect(&state, "c2", "p2", "bob").await;
    let (_p3, mut rx3) = connect(&state, "c3", "p3", "carol").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;

    dispatch(&state, "c3", join_room("r1")).await;

    let events = drain(&mut rx3);
    assert!(matches!(events[0], ServerEvent::RoomFull { .. }));

    let room = state.rooms.get_room_info("r1").await.unwrap();
    assert_eq!(room.players.len(), 2);
    assert!(room.player_index("p3").is_none());
    // The rejected session is not bound to the room either.
    let p3 = state.sessions.lookup("c3").await.unwrap();
    assert!(p3.room_id.is_none());
}

#[tokio::test]
async fn invalid_move_goes_to_actor_only() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;
    drain(&mut rx1);
    drain(&mut rx2);

    // Move with an empty type is structurally invalid.
    dispatch(
        &state,
        "c1",
        ClientEvent::PlayerMove(serde_json::from_str(r#"{"type":""}"#).unwrap()),
    )
    .await;

    let events1 = drain(&mut rx1);
    assert_eq!(events1.len(), 1);
    assert!(matches!(events1[0], ServerEvent::InvalidMove { .. }));
    assert!(drain(&mut rx2).is_empty());

    // And a move from a player in no room at all.
    let (_p3, mut rx3) = connect(&state, "c3", "p3", "carol").await;
    dispatch(&state, "c3", place_move()).await;
    let events3 = drain(&mut rx3);
    assert!(matches!(events3[0], ServerEvent::InvalidMove { .. }));
}

#[tokio::test]
async fn get_room_info_query() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    dispatch(&state, "c1", join_room("r1")).await;
    drain(&mut rx1);

    dispatch(
        &state,
        "c1",
        ClientEvent::GetRoomInfo {
            room_id: "r1".to_string(),
        },
    )
    .await;
    match drain(&mut rx1).pop().unwrap() {
        ServerEvent::RoomInfo { success, room, .. } => {
            assert!(success);
            assert_eq!(room.unwrap().id, "r1");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    dispatch(
        &state,
        "c1",
        ClientEvent::GetRoomInfo {
            room_id: "missing".to_string(),
        },
    )
    .await;
    match drain(&mut rx1).pop().unwrap() {
        ServerEvent::RoomInfo { success, error, .. } => {
            assert!(!success);
            assert_eq!(error.as_deref(), Some("Room not found"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn matchmaking_pairs_and_seats_players() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;

    dispatch(
        &state,
        "c1",
        ClientEvent::JoinQueue {
            mode: QueueMode::Casual,
            rating: 1000,
        },
    )
    .await;
    let events = drain(&mut rx1);
    assert!(matches!(
        events[0],
        ServerEvent::QueueJoined {
            mode: QueueMode::Casual,
            position: 1
        }
    ));

    dispatch(
        &state,
        "c2",
        ClientEvent::JoinQueue {
            mode: QueueMode::Casual,
            rating: 1150,
        },
    )
    .await;

    let events1 = drain(&mut rx1);
    let events2 = drain(&mut rx2);

    let match_id = match events1
        .iter()
        .find_map(|e| match e {
            ServerEvent::MatchFound { game_match } => Some(game_match.clone()),
            _ => None,
        }) {
        Some(game_match) => {
            let diff = (game_match.players[0].rating - game_match.players[1].rating).abs();
            assert!(diff <= 200);
            game_match.id
        }
        None => panic!("no match_found for p1: {:?}", events1),
    };
    assert!(events2
        .iter()
        .any(|e| matches!(e, ServerEvent::MatchFound { .. })));

    // Both were seated into the match room and the game started.
    for events in [&events1, &events2] {
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::GameStarted { .. })));
    }
    let room = state.rooms.get_room_info(&match_id).await.unwrap();
    assert_eq!(room.status, RoomStatus::Active);
    assert_eq!(room.players.len(), 2);

    // Queue drained back to empty.
    let stats = state.matchmaking.queue_stats(QueueMode::Casual).await;
    assert_eq!(stats.queue_size, 0);
}

#[tokio::test]
async fn disconnect_is_idempotent_and_cleans_up() {
    let state = test_state();
    let (_p1, _rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;
    drain(&mut rx2);

    handle_disconnect(&state, "c1").await;

    let events = drain(&mut rx2);
    assert!(matches!(events[0], ServerEvent::PlayerLeft { .. }));
    let room = state.rooms.get_room_info("r1").await.unwrap();
    assert_eq!(room.players.len(), 1);

    // Second disconnect for the same connection: no panic, no
    // double-remove, no extra notifications.
    handle_disconnect(&state, "c1").await;
    assert!(drain(&mut rx2).is_empty());
    assert_eq!(
        state.rooms.get_room_info("r1").await.unwrap().players.len(),
        1
    );

    // Last player out reaps the room.
    handle_disconnect(&state, "c2").await;
    assert!(state.rooms.get_room_info("r1").await.is_err());
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn disconnect_removes_player_from_queue() {
    let state = test_state();
    let (_p1, _rx1) = connect(&state, "c1", "p1", "alice").await;
    dispatch(
        &state,
        "c1",
        ClientEvent::JoinQueue {
            mode: QueueMode::Ranked,
            rating: 1200,
        },
    )
    .await;
    assert_eq!(
        state.matchmaking.queue_stats(QueueMode::Ranked).await.queue_size,
        1
    );

    handle_disconnect(&state, "c1").await;
    assert_eq!(
        state.matchmaking.queue_stats(QueueMode::Ranked).await.queue_size,
        0
    );
}

#[tokio::test]
async fn ping_and_queue_stats_events() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;

    dispatch(&state, "c1", ClientEvent::Ping).await;
    assert!(matches!(
        drain(&mut rx1).pop().unwrap(),
        ServerEvent::Pong { .. }
    ));

    dispatch(
        &state,
        "c1",
        ClientEvent::QueueStats {
            mode: QueueMode::Casual,
        },
    )
    .await;
    match drain(&mut rx1).pop().unwrap() {
        ServerEvent::QueueStats(stats) => {
            assert_eq!(stats.mode, QueueMode::Casual);
            assert_eq!(stats.queue_size, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn switching_rooms_leaves_the_old_room() {
    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;
    drain(&mut rx1);
    drain(&mut rx2);

    dispatch(&state, "c1", join_room("r2")).await;

    // The member left behind hears the departure.
    let events2 = drain(&mut rx2);
    match &events2[0] {
        ServerEvent::PlayerLeft { players, .. } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].id, "p2");
        }
        other => panic!("expected player_left, got {:?}", other),
    }
    assert_eq!(state.rooms.get_room_info("r1").await.unwrap().status, RoomStatus::Completed);

    // The switcher is rebound to the new room.
    let p1 = state.sessions.lookup("c1").await.unwrap();
    assert_eq!(p1.room_id.as_deref(), Some("r2"));
    let r2 = state.rooms.get_room_info("r2").await.unwrap();
    assert_eq!(r2.players.len(), 1);
    assert_eq!(r2.status, RoomStatus::Waiting);

    // Re-joining the room you are already in is rejected, not duplicated.
    drain(&mut rx1);
    dispatch(&state, "c1", join_room("r2")).await;
    let events1 = drain(&mut rx1);
    assert!(matches!(events1[0], ServerEvent::Error { .. }));
    assert_eq!(state.rooms.get_room_info("r2").await.unwrap().players.len(), 1);
}

#[tokio::test]
async fn switching_out_of_a_solo_room_reaps_it() {
    let state = test_state();
    let (_p1, _rx1) = connect(&state, "c1", "p1", "alice").await;
    dispatch(&state, "c1", join_room("r1")).await;

    dispatch(&state, "c1", join_room("r2")).await;

    assert!(state.rooms.get_room_info("r1").await.is_err());
    assert_eq!(state.rooms.get_room_info("r2").await.unwrap().players.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_moves_converge_on_single_order() {
    const MOVES_PER_PLAYER: usize = 50;

    let state = test_state();
    let (_p1, mut rx1) = connect(&state, "c1", "p1", "alice").await;
    let (_p2, mut rx2) = connect(&state, "c2", "p2", "bob").await;
    dispatch(&state, "c1", join_room("r1")).await;
    dispatch(&state, "c2", join_room("r1")).await;
    drain(&mut rx1);
    drain(&mut rx2);

    // Two movers racing from separate tasks; relaxed policy accepts both.
    let mover = |connection_id: &'static str| {
        let state = state.clone();
        tokio::spawn(async move {
            for _ in 0..MOVES_PER_PLAYER {
                dispatch(&state, connection_id, place_move()).await;
            }
        })
    };
    let (a, b) = tokio::join!(mover("c1"), mover("c2"));
    a.unwrap();
    b.unwrap();

    // Every member saw every accepted move, and each update's log is a
    // prefix of the authoritative log, so all receivers converge on the
    // same single order per room no matter how the fan-outs interleaved.
    let authoritative = serde_json::to_value(
        &state
            .rooms
            .get_room_info("r1")
            .await
            .unwrap()
            .game_state
            .unwrap()
            .moves,
    )
    .unwrap();
    let authoritative = authoritative.as_array().unwrap().clone();
    assert_eq!(authoritative.len(), 2 * MOVES_PER_PLAYER);

    for mut rx in [rx1, rx2] {
        let mut updates = 0;
        while let Ok(event) = rx.try_recv() {
            let ServerEvent::GameUpdate { game_state, .. } = event else {
                panic!("unexpected event during move storm");
            };
            let observed = serde_json::to_value(&game_state.moves).unwrap();
            let observed = observed.as_array().unwrap();
            assert_eq!(observed.as_slice(), &authoritative[..observed.len()]);
            updates += 1;
        }
        assert_eq!(updates, 2 * MOVES_PER_PLAYER);
    }
}

#[tokio::test]
async fn event_from_unknown_connection_is_dropped() {
    let state = test_state();
    // No session registered; must not panic or create state.
    dispatch(&state, "ghost", join_room("r1")).await;
    assert!(state.rooms.get_room_info("r1").await.is_err());
}
