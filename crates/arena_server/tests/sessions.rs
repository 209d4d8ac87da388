//! Session and lobby behavior on a paused tokio clock.

use arena_core::components::SideId;
use arena_core::error::GameError;
use arena_core::facade::{CommandSink, DeployCommand};
use arena_core::math::{Fixed, Vec2Fixed};
use arena_server::lobby::Lobby;
use arena_server::session::{spawn_session, SessionEvent, SessionHandle};
use arena_server::{ServerConfig, SessionError};
use arena_test_utils::fixtures::{standard_deck, test_catalog};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;

fn short_match(seconds: i32) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.match_config.time_limit = Some(Fixed::from_num(seconds));
    config
}

/// Wait for the first snapshot satisfying `check`, skipping lag.
async fn snapshot_where(
    events: &mut Receiver<SessionEvent>,
    check: impl Fn(&arena_core::snapshot::MatchSnapshot) -> bool,
) -> bool {
    for _ in 0..100 {
        match events.recv().await {
            Ok(SessionEvent::Snapshot(snapshot)) if check(&snapshot) => return true,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return false,
        }
    }
    false
}

/// Drain events until the game-over event, counting how many arrive.
async fn run_to_game_over(events: &mut Receiver<SessionEvent>) -> usize {
    let mut game_overs = 0;
    loop {
        match events.recv().await {
            Ok(SessionEvent::GameOver(_)) => {
                game_overs += 1;
                break;
            }
            Ok(SessionEvent::Snapshot(_)) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
    game_overs
}

async fn two_player_session() -> SessionHandle {
    let handle = spawn_session(test_catalog(), &ServerConfig::default(), 0);
    assert_eq!(handle.join(standard_deck()).await.unwrap(), SideId::P1);
    assert_eq!(handle.join(standard_deck()).await.unwrap(), SideId::P2);
    handle
}

// =========================================================================
// Sessions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_third_join_is_room_full() {
    let handle = two_player_session().await;

    let err = handle.join(standard_deck()).await.unwrap_err();
    assert!(matches!(err, SessionError::Game(GameError::RoomFull)));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_deploy_shows_up_in_snapshots() {
    let handle = two_player_session().await;
    let mut events = handle.subscribe();

    let command = DeployCommand::new(SideId::P1, "knight", Vec2Fixed::from_ints(9, 8));
    handle.deploy(command).await.unwrap();

    let seen = snapshot_where(&mut events, |s| s.units_of(SideId::P1).count() == 1).await;
    assert!(seen);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_handle_is_a_command_sink() {
    let handle = two_player_session().await;
    let mut events = handle.subscribe();

    let mut sink = handle.clone();
    CommandSink::deploy(
        &mut sink,
        &DeployCommand::new(SideId::P2, "archers", Vec2Fixed::from_ints(9, 24)),
    );

    let seen = snapshot_where(&mut events, |s| s.units_of(SideId::P2).count() == 2).await;
    assert!(seen);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_advance_with_measured_time() {
    let handle = two_player_session().await;
    let mut events = handle.subscribe();

    let seen = snapshot_where(&mut events, |s| s.elapsed >= Fixed::from_num(1)).await;
    assert!(seen);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_bot_match_reports_game_over_once() {
    let handle = spawn_session(test_catalog(), &short_match(3), 2);
    let mut events = handle.subscribe();

    assert_eq!(run_to_game_over(&mut events).await, 1);

    handle.closed().await;
    assert!(handle.is_closed());
    assert!(matches!(
        events.try_recv(),
        Err(TryRecvError::Empty)
    ));
    assert!(matches!(
        handle.join(standard_deck()).await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let handle = two_player_session().await;

    handle.stop().await;
    handle.closed().await;
    handle.stop().await;

    assert!(handle.is_closed());
    let command = DeployCommand::new(SideId::P1, "knight", Vec2Fixed::from_ints(9, 8));
    assert!(matches!(
        handle.deploy(command).await,
        Err(SessionError::Closed)
    ));
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_lobby_caps_rooms() {
    let config = ServerConfig {
        max_rooms: 2,
        ..ServerConfig::default()
    };
    let mut lobby = Lobby::new(test_catalog(), config);

    let first = lobby.create_room(0).unwrap();
    let second = lobby.create_room(1).unwrap();
    assert_ne!(first, second);
    assert!(matches!(lobby.create_room(0), Err(GameError::RoomFull)));

    lobby.close(first).await;
    lobby.close(first).await;
    assert_eq!(lobby.room_count(), 1);
    assert!(lobby.create_room(0).is_ok());

    lobby.close_all().await;
    assert_eq!(lobby.room_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_lobby_routes_to_rooms() {
    let mut lobby = Lobby::new(test_catalog(), ServerConfig::default());
    let room = lobby.create_room(1).unwrap();

    assert_eq!(lobby.join(room, standard_deck()).await.unwrap(), SideId::P2);
    assert!(matches!(
        lobby.join(room + 100, standard_deck()).await,
        Err(SessionError::UnknownRoom(id)) if id == room + 100
    ));
    assert!(matches!(
        lobby.subscribe(room + 100),
        Err(SessionError::UnknownRoom(_))
    ));

    let mut events = lobby.subscribe(room).unwrap();
    let command = DeployCommand::new(SideId::P2, "knight", Vec2Fixed::from_ints(9, 24));
    lobby.deploy(room, command).await.unwrap();
    let seen = snapshot_where(&mut events, |s| {
        s.units_of(SideId::P2).any(|u| u.card_id == "knight")
    })
    .await;
    assert!(seen);

    lobby.close_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_finished_rooms_free_their_slot() {
    let config = ServerConfig {
        max_rooms: 1,
        ..short_match(2)
    };
    let mut lobby = Lobby::new(test_catalog(), config);
    let room = lobby.create_room(2).unwrap();
    let mut events = lobby.subscribe(room).unwrap();

    assert_eq!(run_to_game_over(&mut events).await, 1);
    lobby.room(room).unwrap().closed().await;

    assert!(lobby.create_room(0).is_ok());
    lobby.close_all().await;
}
