#![allow(dead_code)]

use sketch_core::WordBank;
use sketch_server::bus::Subscription;
use sketch_server::config::Config;
use sketch_server::registry::{NewRoom, RoomRegistry};
use sketch_server::room::RoomHandle;
use sketch_server::websocket::connection::ConnectionId;
use sketch_types::{Player, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A subscribed client as the room sees it: a connection id plus the
/// receiving end of its outgoing queue.
pub struct TestClient {
    pub connection_id: ConnectionId,
    pub player: Player,
    pub receiver: mpsc::UnboundedReceiver<ServerMessage>,
}

impl TestClient {
    /// Next message, failing the test if nothing arrives
    pub async fn recv(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(600), self.receiver.recv())
            .await
            .expect("Timeout waiting for room message")
            .expect("Room dropped the subscription")
    }

    /// Skip messages until one matches
    pub async fn recv_until(&mut self, check: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
        loop {
            let message = self.recv().await;
            if check(&message) {
                return message;
            }
        }
    }

    /// Everything already queued, without waiting
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub fn subscription() -> (Subscription, mpsc::UnboundedReceiver<ServerMessage>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        Subscription {
            connection_id: ConnectionId::new(),
            sender,
        },
        receiver,
    )
}

/// Registry with predictable words and short grace periods
pub struct TestRoomSetup {
    pub registry: Arc<RoomRegistry>,
}

impl TestRoomSetup {
    pub fn new() -> Self {
        Self::with_config(Config {
            room_grace_seconds: 30,
            player_grace_seconds: 10,
            room_idle_minutes: 5,
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        let words = WordBank::from_word_list("apple\nbanana\ncherry\nhouse\nmouse\ntrain");
        Self {
            registry: Arc::new(RoomRegistry::new(config, Arc::new(words))),
        }
    }

    /// Create a room and attach the host as a subscribed client
    pub async fn create_room(&self, max_rounds: u32, time_per_round: u32) -> (RoomHandle, TestClient) {
        let (handle, host) = self
            .registry
            .create_room(NewRoom::new("Alice").with_rounds(max_rounds, time_per_round))
            .expect("room should be created");
        let (subscription, receiver) = subscription();
        let connection_id = subscription.connection_id;
        let player = handle
            .rejoin(host.id, Some(subscription))
            .await
            .expect("host attaches");

        let mut client = TestClient {
            connection_id,
            player,
            receiver,
        };
        assert!(matches!(client.recv().await, ServerMessage::Joined { .. }));
        assert!(matches!(client.recv().await, ServerMessage::RoomSnapshot { .. }));
        (handle, client)
    }

    /// Join an existing room as a subscribed client
    pub async fn join(&self, handle: &RoomHandle, name: &str) -> TestClient {
        let (subscription, receiver) = subscription();
        let connection_id = subscription.connection_id;
        let player = handle
            .join(name, Some(subscription))
            .await
            .expect("player joins");

        let mut client = TestClient {
            connection_id,
            player,
            receiver,
        };
        assert!(matches!(client.recv().await, ServerMessage::Joined { .. }));
        assert!(matches!(client.recv().await, ServerMessage::RoomSnapshot { .. }));
        client
    }
}

/// The word for the round in progress, read from the unredacted snapshot
pub fn current_word(handle: &RoomHandle) -> String {
    handle
        .snapshot()
        .current_word
        .expect("a round should be active")
}

pub fn score_of(handle: &RoomHandle, player: &Player) -> u32 {
    handle
        .snapshot()
        .players
        .iter()
        .find(|p| p.id == player.id)
        .map(|p| p.score)
        .unwrap_or_default()
}
