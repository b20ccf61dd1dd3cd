#![allow(dead_code)]

use sketch_core::{RoomConfig, RoomEvent, Session, WordBank};
use sketch_types::{Player, RoomPhase};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Small word bank so rounds stay predictable in tests
pub fn create_test_words() -> Arc<WordBank> {
    Arc::new(WordBank::from_word_list(
        "apple\nbanana\ncherry\nhouse\nmouse\ntrain\nplane\nwater",
    ))
}

/// Lobby with only the host seated
pub fn create_lobby(max_rounds: u32, time_per_round: u32) -> (Session, Player) {
    Session::create(
        Uuid::new_v4(),
        RoomConfig::new("Alice").with_rounds(max_rounds, time_per_round),
        create_test_words(),
        Instant::now(),
    )
    .expect("lobby should be created")
}

/// Lobby with the host plus one guest
pub fn create_two_player_lobby(max_rounds: u32) -> (Session, Player, Player) {
    let (mut session, host) = create_lobby(max_rounds, 60);
    let (guest, _) = session.join("Bob", Instant::now()).expect("guest joins");
    (session, host, guest)
}

/// Game already running with the host drawing
pub fn create_started_game(max_rounds: u32) -> (Session, Player, Player) {
    let (mut session, host, guest) = create_two_player_lobby(max_rounds);
    session
        .start_game(host.id, Instant::now())
        .expect("game starts");
    (session, host, guest)
}

pub fn current_word(session: &Session) -> String {
    session
        .current_word()
        .expect("a round should be active")
        .to_string()
}

pub fn score_of(session: &Session, player: &Player) -> u32 {
    session.player(player.id).map(|p| p.score).unwrap_or_default()
}

pub fn event_names(events: &[RoomEvent]) -> Vec<&'static str> {
    events.iter().map(RoomEvent::name).collect()
}

/// Checks the relationships that must hold after every operation
pub fn assert_session_invariants(session: &Session) {
    let room = session.room();
    assert_eq!(
        room.current_word.is_some(),
        room.phase == RoomPhase::RoundActive,
        "current word must be set exactly while a round is active"
    );
    if let Some(drawer) = room.current_player_id {
        assert!(
            room.players.iter().any(|p| p.id == drawer),
            "drawer must be a member of the room"
        );
    }
    assert!(room.round_number >= 1 && room.round_number <= room.max_rounds);
    assert_eq!(room.is_active, room.phase != RoomPhase::GameEnded);
    assert!(room.players.iter().any(|p| p.id == room.host_id));
}
