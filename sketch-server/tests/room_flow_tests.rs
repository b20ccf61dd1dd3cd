mod test_helpers;

use sketch_core::SessionError;
use sketch_server::error::ServiceError;
use sketch_server::room;
use sketch_types::{GameEndReason, RoomPhase, RoundEndReason, ServerMessage, StrokePoint};
use std::time::Duration;
use test_helpers::*;

fn point(x: f64, y: f64) -> StrokePoint {
    StrokePoint {
        x,
        y,
        color: "#000000".to_string(),
        stroke_width: 3.0,
        starts_new_stroke: false,
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_round_game_with_guess_then_timeout() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(2, 1).await;

    let err = handle.start_game(host.player.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Session(SessionError::NotEnoughPlayers { required: 2 })
    );

    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();

    let word = current_word(&handle);
    let outcome = handle.submit_guess(guest.player.id, &word).await.unwrap();
    assert!(outcome.is_correct);
    assert_eq!(outcome.points_awarded, 10);

    let room = handle.snapshot();
    assert_eq!(room.round_number, 2);
    assert_eq!(room.phase, RoomPhase::RoundActive);
    assert_eq!(room.current_player_id, Some(guest.player.id));

    // Nobody guesses round 2; its timer ends the game
    let mut seen = Vec::new();
    loop {
        let message = host.recv().await;
        let done = matches!(message, ServerMessage::GameEnded { .. });
        seen.push(message);
        if done {
            break;
        }
    }
    assert!(seen.iter().any(|m| matches!(
        m,
        ServerMessage::RoundEnded {
            round_number: 2,
            reason: RoundEndReason::TimedOut,
            solver_id: None,
            ..
        }
    )));
    match seen.last() {
        Some(ServerMessage::GameEnded { reason, .. }) => {
            assert_eq!(*reason, GameEndReason::RoundsCompleted)
        }
        other => panic!("expected GameEnded, got {:?}", other),
    }

    let room = handle.snapshot();
    assert_eq!(room.phase, RoomPhase::GameEnded);
    assert!(!room.is_active);
    assert_eq!(room.round_number, 2);
    assert_eq!(score_of(&handle, &guest.player), 10);
    assert_eq!(score_of(&handle, &host.player), 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_host_cannot_start() {
    let setup = TestRoomSetup::new();
    let (handle, _host) = setup.create_room(3, 30).await;
    let guest = setup.join(&handle, "Bob").await;

    let err = handle.start_game(guest.player.id).await.unwrap_err();
    assert_eq!(err, ServiceError::Session(SessionError::NotHost));
    assert_eq!(handle.snapshot().phase, RoomPhase::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_drawer_guess_is_not_recorded() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 30).await;
    let _guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();
    host.drain();

    let word = current_word(&handle);
    let err = handle.submit_guess(host.player.id, &word).await.unwrap_err();
    assert_eq!(err, ServiceError::Session(SessionError::IsDrawer));
    assert!(host.drain().is_empty());
    assert_eq!(handle.snapshot().round_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_old_timer_does_not_end_new_round() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 10).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;
    let word = current_word(&handle);
    handle.submit_guess(guest.player.id, &word).await.unwrap();
    assert_eq!(handle.snapshot().round_number, 2);

    // Round 1's deadline passes while round 2 is running
    tokio::time::sleep(Duration::from_secs(6)).await;
    let room = handle.snapshot();
    assert_eq!(room.round_number, 2);
    assert_eq!(room.phase, RoomPhase::RoundActive);

    // Round 2's own deadline ends it
    host.recv_until(|m| {
        matches!(
            m,
            ServerMessage::RoundEnded {
                round_number: 2,
                reason: RoundEndReason::TimedOut,
                ..
            }
        )
    })
    .await;
    assert_eq!(handle.snapshot().round_number, 3);
}

#[tokio::test(start_paused = true)]
async fn test_guess_racing_timeout_makes_one_transition() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 5).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();
    host.drain();

    let word = current_word(&handle);
    tokio::time::sleep(Duration::from_secs(5)).await;
    let _ = handle.submit_guess(guest.player.id, &word).await;

    let room = handle.snapshot();
    assert_eq!(room.round_number, 2);
    assert_eq!(room.phase, RoomPhase::RoundActive);

    let round_one_endings = host
        .drain()
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::RoundEnded { round_number: 1, .. }))
        .count();
    assert_eq!(round_one_endings, 1);
    assert!(score_of(&handle, &guest.player) <= 10);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_correct_guesses_pay_once() {
    let setup = TestRoomSetup::new();
    let (handle, host) = setup.create_room(3, 60).await;
    let first = setup.join(&handle, "Bob").await;
    let second = setup.join(&handle, "Carol").await;
    handle.start_game(host.player.id).await.unwrap();

    let word = current_word(&handle);
    let (a, b) = tokio::join!(
        handle.submit_guess(first.player.id, &word),
        handle.submit_guess(second.player.id, &word),
    );

    let correct = [a, b]
        .into_iter()
        .filter(|result| matches!(result, Ok(outcome) if outcome.is_correct))
        .count();
    assert_eq!(correct, 1);

    let total = score_of(&handle, &first.player) + score_of(&handle, &second.player);
    assert_eq!(total, 10);
    assert_eq!(handle.snapshot().round_number, 2);
}

#[tokio::test(start_paused = true)]
async fn test_strokes_reach_viewers_in_order_without_echo() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;
    let mut guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();
    host.drain();
    guest.drain();

    for i in 0..5 {
        handle
            .submit_stroke(
                host.player.id,
                vec![point(f64::from(i), f64::from(i))],
                Some(host.connection_id),
            )
            .await
            .unwrap();
    }

    let seqs: Vec<u32> = guest
        .drain()
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::StrokeAppended { stroke } => Some(stroke.seq),
            _ => None,
        })
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    assert!(host.drain().is_empty());

    let err = handle
        .submit_stroke(guest.player.id, vec![point(0.0, 0.0)], Some(guest.connection_id))
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Session(SessionError::NotDrawer));

    handle.clear_canvas(host.player.id).await.unwrap();
    assert!(matches!(
        guest.recv().await,
        ServerMessage::StrokesCleared { round_number: 1 }
    ));
    assert!(matches!(
        host.recv().await,
        ServerMessage::StrokesCleared { round_number: 1 }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_gets_full_snapshot() {
    let setup = TestRoomSetup::new();
    let (handle, host) = setup.create_room(3, 60).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();
    handle
        .submit_stroke(host.player.id, vec![point(1.0, 2.0)], Some(host.connection_id))
        .await
        .unwrap();
    handle.submit_guess(guest.player.id, "nope").await.unwrap();

    let (subscription, mut receiver) = subscription();
    let player = handle.join("Carol", Some(subscription)).await.unwrap();
    assert!(matches!(receiver.recv().await, Some(ServerMessage::Joined { .. })));
    match receiver.recv().await {
        Some(ServerMessage::RoomSnapshot {
            room,
            strokes,
            guesses,
        }) => {
            assert!(room.players.iter().any(|p| p.id == player.id));
            assert!(room.current_word.is_none());
            assert_eq!(strokes.len(), 1);
            assert_eq!(guesses.len(), 1);
            assert_eq!(guesses[0].text, "nope");
        }
        other => panic!("expected RoomSnapshot, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_marks_offline_and_rejoin_restores() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;
    let guest = setup.join(&handle, "Bob").await;
    host.drain();

    handle.disconnect(guest.connection_id).await;
    match host.recv().await {
        ServerMessage::PlayerLeft { player, removed } => {
            assert_eq!(player.id, guest.player.id);
            assert!(!player.is_online);
            assert!(!removed);
        }
        other => panic!("expected PlayerLeft, got {:?}", other),
    }

    let (subscription, _receiver) = subscription();
    let player = handle
        .rejoin(guest.player.id, Some(subscription))
        .await
        .unwrap();
    assert!(player.is_online);
    assert!(matches!(host.recv().await, ServerMessage::PlayerJoined { .. }));

    // Back within the grace period: nothing is pruned
    let later = room::now() + Duration::from_secs(60);
    assert_eq!(setup.registry.sweep(later).await, 0);
    assert!(handle.snapshot().players.iter().any(|p| p.id == guest.player.id));
}

#[tokio::test(start_paused = true)]
async fn test_second_connection_keeps_player_online() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;
    let guest = setup.join(&handle, "Bob").await;

    let (subscription, _second) = subscription();
    handle
        .rejoin(guest.player.id, Some(subscription))
        .await
        .unwrap();
    host.drain();

    handle.disconnect(guest.connection_id).await;
    handle.start_game(host.player.id).await.unwrap();
    assert!(host
        .drain()
        .iter()
        .all(|m| !matches!(m, ServerMessage::PlayerLeft { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_leave_cancels_subscription() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;
    let mut guest = setup.join(&handle, "Bob").await;
    host.drain();

    handle
        .leave(guest.player.id, Some(guest.connection_id))
        .await
        .unwrap();
    assert!(matches!(
        host.recv().await,
        ServerMessage::PlayerLeft { removed: false, .. }
    ));
    assert!(guest.receiver.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_offline_player_is_dropped_after_grace() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.disconnect(guest.connection_id).await;
    host.recv_until(|m| matches!(m, ServerMessage::PlayerLeft { removed: false, .. }))
        .await;

    let later = room::now() + Duration::from_secs(11);
    assert_eq!(setup.registry.sweep(later).await, 0);
    match host.recv().await {
        ServerMessage::PlayerLeft { player, removed } => {
            assert_eq!(player.id, guest.player.id);
            assert!(removed);
        }
        other => panic!("expected PlayerLeft, got {:?}", other),
    }
    assert_eq!(handle.snapshot().players.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_is_evicted() {
    let setup = TestRoomSetup::new();
    let (handle, host) = setup.create_room(3, 5).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();

    handle.disconnect(host.connection_id).await;
    handle.disconnect(guest.connection_id).await;

    let soon = room::now() + Duration::from_secs(10);
    assert_eq!(setup.registry.sweep(soon).await, 0);

    let later = room::now() + Duration::from_secs(31);
    assert_eq!(setup.registry.sweep(later).await, 1);
    assert_eq!(setup.registry.room_count(), 0);
    assert_eq!(
        setup.registry.get(handle.id()).unwrap_err(),
        ServiceError::RoomNotFound(handle.id())
    );
    assert_eq!(
        handle.start_game(host.player.id).await.unwrap_err(),
        ServiceError::RoomClosed(handle.id())
    );

    // The round timer died with the room
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_idle_room_closes_subscribers() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(3, 60).await;

    let later = room::now() + Duration::from_secs(6 * 60);
    assert_eq!(setup.registry.sweep(later).await, 1);

    match host.recv().await {
        ServerMessage::RoomClosed { room_id } => assert_eq!(room_id, handle.id()),
        other => panic!("expected RoomClosed, got {:?}", other),
    }
    assert!(host.receiver.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_host_ends_game_and_timer_is_cancelled() {
    let setup = TestRoomSetup::new();
    let (handle, mut host) = setup.create_room(5, 5).await;
    let guest = setup.join(&handle, "Bob").await;
    handle.start_game(host.player.id).await.unwrap();

    let err = handle.end_game(guest.player.id).await.unwrap_err();
    assert_eq!(err, ServiceError::Session(SessionError::NotHost));

    handle.end_game(host.player.id).await.unwrap();
    host.recv_until(|m| {
        matches!(
            m,
            ServerMessage::GameEnded {
                reason: GameEndReason::HostEnded,
                ..
            }
        )
    })
    .await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(host.drain().is_empty());
    assert_eq!(handle.snapshot().phase, RoomPhase::GameEnded);
    assert!(setup.registry.list_active_rooms().is_empty());

    let err = setup
        .registry
        .join_room(handle.id(), "Late", None)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Session(SessionError::RoomInactive));
}
