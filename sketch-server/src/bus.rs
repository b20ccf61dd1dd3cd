use sketch_core::RoomEvent;
use sketch_types::{PlayerId, RoomId, ServerMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::websocket::connection::ConnectionId;

/// A connection's interest in one room's events.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub connection_id: ConnectionId,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Debug)]
struct Subscriber {
    player_id: PlayerId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Per-room fan-out. Owned by the room actor, so events reach every
/// subscriber in the order they were committed.
#[derive(Debug)]
pub struct EventBus {
    room_id: RoomId,
    subscribers: HashMap<ConnectionId, Subscriber>,
}

impl EventBus {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            subscribers: HashMap::new(),
        }
    }

    /// Membership is per connection; one player may hold several.
    pub fn subscribe(&mut self, subscription: Subscription, player_id: PlayerId) {
        debug!(
            "Connection {} subscribed to room {} as {}",
            subscription.connection_id, self.room_id, player_id
        );
        self.subscribers.insert(
            subscription.connection_id,
            Subscriber {
                player_id,
                sender: subscription.sender,
            },
        );
    }

    /// Returns the player the connection was acting for.
    pub fn unsubscribe(&mut self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.subscribers
            .remove(&connection_id)
            .map(|subscriber| subscriber.player_id)
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.subscribers
            .values()
            .any(|subscriber| subscriber.player_id == player_id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) {
        if let Some(subscriber) = self.subscribers.get(&connection_id) {
            let _ = subscriber.sender.send(message);
        }
    }

    /// Deliver `event` to every subscriber, personalized per viewer. Strokes
    /// are not echoed back to the connection that drew them. Returns the
    /// players whose last connection turned out to be closed.
    pub fn publish(&mut self, event: &RoomEvent, origin: Option<ConnectionId>) -> Vec<PlayerId> {
        let skip_origin = matches!(event, RoomEvent::StrokeAppended { .. });
        let mut closed = Vec::new();

        for (connection_id, subscriber) in &self.subscribers {
            if skip_origin && origin == Some(*connection_id) {
                continue;
            }
            let message = event.to_message_for(Some(subscriber.player_id));
            if subscriber.sender.send(message).is_err() {
                closed.push(*connection_id);
            }
        }

        let mut gone = Vec::new();
        for connection_id in closed {
            if let Some(player_id) = self.unsubscribe(connection_id) {
                debug!("Dropped closed connection {} from room {}", connection_id, self.room_id);
                if !self.has_player(player_id) && !gone.contains(&player_id) {
                    gone.push(player_id);
                }
            }
        }
        gone
    }

    /// Send the terminal `RoomClosed` and drop every subscription.
    pub fn close(&mut self) {
        let event = RoomEvent::RoomClosed {
            room_id: self.room_id,
        };
        for (_, subscriber) in self.subscribers.drain() {
            let _ = subscriber.sender.send(event.to_message_for(Some(subscriber.player_id)));
        }
    }
}
