use dashmap::DashMap;
use serde::Deserialize;
use sketch_core::{Session, WordBank};
use sketch_types::{Player, Room, RoomId, RoomSummary};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::bus::Subscription;
use crate::config::Config;
use crate::error::ServiceError;
use crate::room::{RoomHandle, now, spawn_room};
use crate::websocket::connection::ConnectionId;

/// Room creation request, shared by the websocket and HTTP surfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub host_name: String,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub max_rounds: Option<u32>,
    #[serde(default)]
    pub time_per_round: Option<u32>,
}

impl NewRoom {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            room_name: None,
            max_rounds: None,
            time_per_round: None,
        }
    }

    pub fn with_rounds(mut self, max_rounds: u32, time_per_round: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self.time_per_round = Some(time_per_round);
        self
    }
}

/// Every live room, keyed by id. Only this map is shared across rooms; each
/// room's own state lives behind its actor.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    words: Arc<WordBank>,
    config: Config,
}

impl RoomRegistry {
    pub fn new(config: Config, words: Arc<WordBank>) -> Self {
        Self {
            rooms: DashMap::new(),
            words,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_room(&self, request: NewRoom) -> Result<(RoomHandle, Player), ServiceError> {
        let room_config = self.config.room_config(
            &request.host_name,
            request.room_name,
            request.max_rounds,
            request.time_per_round,
        )?;
        let (session, host) =
            Session::create(Uuid::new_v4(), room_config, self.words.clone(), now())?;

        let handle = spawn_room(session, self.config.cleanup());
        self.rooms.insert(handle.id(), handle.clone());

        info!(
            "Room {} ({}) registered, {} rooms live",
            handle.id(),
            handle.summary().code,
            self.rooms.len()
        );
        Ok((handle, host))
    }

    pub fn get(&self, room_id: RoomId) -> Result<RoomHandle, ServiceError> {
        self.rooms
            .get(&room_id)
            .map(|entry| entry.value().clone())
            .ok_or(ServiceError::RoomNotFound(room_id))
    }

    /// Public view of a room: the secret word is never included.
    pub fn get_room(&self, room_id: RoomId) -> Result<Room, ServiceError> {
        Ok(self.get(room_id)?.snapshot().personalized_for(None))
    }

    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_name: &str,
        subscription: Option<Subscription>,
    ) -> Result<Player, ServiceError> {
        self.get(room_id)?.join(player_name, subscription).await
    }

    /// Rooms whose game has not ended, newest first.
    pub fn list_active_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<(chrono::DateTime<chrono::Utc>, RoomSummary)> = self
            .rooms
            .iter()
            .map(|entry| (entry.created_at(), entry.summary()))
            .filter(|(_, summary)| summary.phase != sketch_types::RoomPhase::GameEnded)
            .collect();
        rooms.sort_by(|a, b| b.0.cmp(&a.0));
        rooms.into_iter().map(|(_, summary)| summary).collect()
    }

    pub async fn disconnect(&self, room_id: RoomId, connection_id: ConnectionId) {
        if let Ok(handle) = self.get(room_id) {
            handle.disconnect(connection_id).await;
        }
    }

    /// Prune offline players in every room and evict rooms that have been
    /// empty or idle too long. Returns how many rooms were evicted.
    pub async fn sweep(&self, now: Instant) -> usize {
        let handles: Vec<RoomHandle> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut evicted = 0;
        for handle in handles {
            if handle.sweep(now).await {
                self.rooms.remove(&handle.id());
                info!("Room {} evicted", handle.id());
                evicted += 1;
            }
        }
        evicted
    }

    /// Close every room, notifying subscribers.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.rooms.clear();

        for handle in handles {
            handle.close().await;
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
