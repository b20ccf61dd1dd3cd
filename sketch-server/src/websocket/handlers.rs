use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bus::Subscription;
use crate::error::ServiceError;
use crate::registry::{NewRoom, RoomRegistry};
use crate::room::RoomHandle;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use sketch_core::SessionError;
use sketch_types::{ClientMessage, PlayerId, RoomId, ServerMessage, StrokePoint};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            registry,
        }
    }

    /// Dispatch one client request. Rejections are reported back to the
    /// client and never close the connection.
    pub async fn handle_message(&self, message: ClientMessage) {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::CreateRoom {
                host_name,
                room_name,
                max_rounds,
                time_per_round,
            } => {
                self.handle_create_room(NewRoom {
                    host_name,
                    room_name,
                    max_rounds,
                    time_per_round,
                })
                .await
            }
            ClientMessage::JoinRoom {
                room_id,
                player_name,
            } => self.handle_join_room(room_id, player_name).await,
            ClientMessage::Rejoin { room_id, player_id } => {
                self.handle_rejoin(room_id, player_id).await
            }
            ClientMessage::StartGame => self.handle_start_game().await,
            ClientMessage::SubmitGuess { text } => self.handle_submit_guess(text).await,
            ClientMessage::SubmitStroke { points } => self.handle_submit_stroke(points).await,
            ClientMessage::ClearCanvas => self.handle_clear_canvas().await,
            ClientMessage::EndGame => self.handle_end_game().await,
            ClientMessage::LeaveRoom => self.handle_leave_room().await,
            ClientMessage::Heartbeat => self.send_message(ServerMessage::Ack).await,
        };

        if let Err(e) = result {
            self.send_error(&e).await;
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(connection) = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
        {
            if let Some((room_id, _)) = connection.seat() {
                self.registry.disconnect(room_id, self.connection_id).await;
            }
        }
    }

    pub async fn send_error(&self, error: &ServiceError) {
        debug!("Rejected request from {}: {}", self.connection_id, error);
        let _ = self.send_message(error.to_message()).await;
    }

    async fn handle_create_room(&self, request: NewRoom) -> Result<(), ServiceError> {
        let (handle, host) = self.registry.create_room(request)?;
        self.detach().await;

        self.send_message(ServerMessage::RoomCreated {
            room_id: handle.id(),
            player_id: host.id,
        })
        .await?;

        handle.rejoin(host.id, Some(self.subscription().await?)).await?;
        self.connection_manager
            .bind(self.connection_id, handle.id(), host.id)
            .await;
        info!("Connection {} created room {}", self.connection_id, handle.id());
        Ok(())
    }

    async fn handle_join_room(&self, room_id: RoomId, player_name: String) -> Result<(), ServiceError> {
        let handle = self.registry.get(room_id)?;
        if player_name.trim().is_empty() {
            return Err(SessionError::EmptyName.into());
        }
        if !handle.snapshot().is_active {
            return Err(SessionError::RoomInactive.into());
        }
        self.detach().await;

        let player = handle
            .join(player_name, Some(self.subscription().await?))
            .await?;
        self.connection_manager
            .bind(self.connection_id, room_id, player.id)
            .await;
        Ok(())
    }

    async fn handle_rejoin(&self, room_id: RoomId, player_id: PlayerId) -> Result<(), ServiceError> {
        let handle = self.registry.get(room_id)?;
        if !handle.snapshot().players.iter().any(|p| p.id == player_id) {
            return Err(SessionError::PlayerNotFound(player_id).into());
        }
        let current = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
            .and_then(|connection| connection.seat());
        if current != Some((room_id, player_id)) {
            self.detach().await;
        }

        handle
            .rejoin(player_id, Some(self.subscription().await?))
            .await?;
        self.connection_manager
            .bind(self.connection_id, room_id, player_id)
            .await;
        info!("Connection {} rejoined room {} as {}", self.connection_id, room_id, player_id);
        Ok(())
    }

    async fn handle_start_game(&self) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        handle.start_game(player_id).await?;
        self.send_message(ServerMessage::Ack).await
    }

    async fn handle_submit_guess(&self, text: String) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        let outcome = handle.submit_guess(player_id, text).await?;
        self.send_message(ServerMessage::GuessResult { outcome }).await
    }

    /// No acknowledgement: the drawer already rendered the stroke locally.
    async fn handle_submit_stroke(&self, points: Vec<StrokePoint>) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        handle
            .submit_stroke(player_id, points, Some(self.connection_id))
            .await
    }

    async fn handle_clear_canvas(&self) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        handle.clear_canvas(player_id).await
    }

    async fn handle_end_game(&self) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        handle.end_game(player_id).await?;
        self.send_message(ServerMessage::Ack).await
    }

    async fn handle_leave_room(&self) -> Result<(), ServiceError> {
        let (handle, player_id) = self.seat().await?;
        self.connection_manager.unbind(self.connection_id).await;
        handle.leave(player_id, Some(self.connection_id)).await?;
        self.send_message(ServerMessage::Left).await
    }

    /// Leave whatever room this connection is currently bound to. Callers
    /// check the new request first so a rejected one keeps the old seat.
    async fn detach(&self) {
        if let Ok((handle, player_id)) = self.seat().await {
            self.connection_manager.unbind(self.connection_id).await;
            if let Err(e) = handle.leave(player_id, Some(self.connection_id)).await {
                warn!(
                    "Connection {} could not leave room {}: {}",
                    self.connection_id,
                    handle.id(),
                    e
                );
            }
        }
    }

    async fn seat(&self) -> Result<(RoomHandle, PlayerId), ServiceError> {
        let (room_id, player_id) = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
            .and_then(|connection| connection.seat())
            .ok_or(ServiceError::NotInRoom)?;
        Ok((self.registry.get(room_id)?, player_id))
    }

    async fn subscription(&self) -> Result<Subscription, ServiceError> {
        let sender = self
            .connection_manager
            .sender(self.connection_id)
            .await
            .ok_or(ServiceError::Disconnected)?;
        Ok(Subscription {
            connection_id: self.connection_id,
            sender,
        })
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), ServiceError> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
            .map_err(|_| ServiceError::Disconnected)
    }
}
