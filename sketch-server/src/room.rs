use chrono::{DateTime, Utc};
use sketch_core::{RoomCleanup, RoomEvent, Session, SessionError};
use sketch_types::{
    GuessOutcome, Player, PlayerId, Room, RoomId, RoomPhase, RoomSummary, ServerMessage,
    StrokePoint,
};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::bus::{EventBus, Subscription};
use crate::error::ServiceError;
use crate::scheduler::RoundScheduler;
use crate::websocket::connection::ConnectionId;

const COMMAND_BUFFER: usize = 256;

pub type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

/// Work items for a room's actor. Each is applied to the session in arrival
/// order, one at a time.
pub enum RoomCommand {
    Join {
        name: String,
        subscription: Option<Subscription>,
        reply: Reply<Player>,
    },
    Rejoin {
        player_id: PlayerId,
        subscription: Option<Subscription>,
        reply: Reply<Player>,
    },
    Leave {
        player_id: PlayerId,
        connection_id: Option<ConnectionId>,
        reply: Reply<()>,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    StartGame {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    SubmitGuess {
        player_id: PlayerId,
        text: String,
        reply: Reply<GuessOutcome>,
    },
    SubmitStroke {
        player_id: PlayerId,
        points: Vec<StrokePoint>,
        origin: Option<ConnectionId>,
        reply: Reply<()>,
    },
    ClearCanvas {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    EndGame {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    RoundTimeout {
        generation: u64,
    },
    Sweep {
        now: Instant,
        reply: oneshot::Sender<bool>,
    },
    Close,
}

/// Cheap, cloneable access to a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    created_at: DateTime<Utc>,
    commands: mpsc::Sender<RoomCommand>,
    snapshot: watch::Receiver<Room>,
}

impl RoomHandle {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Unredacted state as of the last committed command.
    pub fn snapshot(&self) -> Room {
        self.snapshot.borrow().clone()
    }

    pub fn summary(&self) -> RoomSummary {
        self.snapshot.borrow().summary()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::RoomClosed(self.id))?;
        response.await.map_err(|_| ServiceError::RoomClosed(self.id))?
    }

    /// Seat a new player. With a subscription, the connection receives
    /// `Joined` and a full snapshot before any later event.
    pub async fn join(
        &self,
        name: impl Into<String>,
        subscription: Option<Subscription>,
    ) -> Result<Player, ServiceError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join {
            name,
            subscription,
            reply,
        })
        .await
    }

    pub async fn rejoin(
        &self,
        player_id: PlayerId,
        subscription: Option<Subscription>,
    ) -> Result<Player, ServiceError> {
        self.request(|reply| RoomCommand::Rejoin {
            player_id,
            subscription,
            reply,
        })
        .await
    }

    pub async fn leave(
        &self,
        player_id: PlayerId,
        connection_id: Option<ConnectionId>,
    ) -> Result<(), ServiceError> {
        self.request(|reply| RoomCommand::Leave {
            player_id,
            connection_id,
            reply,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let _ = self
            .commands
            .send(RoomCommand::Disconnect { connection_id })
            .await;
    }

    pub async fn start_game(&self, player_id: PlayerId) -> Result<(), ServiceError> {
        self.request(|reply| RoomCommand::StartGame { player_id, reply })
            .await
    }

    pub async fn submit_guess(
        &self,
        player_id: PlayerId,
        text: impl Into<String>,
    ) -> Result<GuessOutcome, ServiceError> {
        let text = text.into();
        self.request(|reply| RoomCommand::SubmitGuess {
            player_id,
            text,
            reply,
        })
        .await
    }

    pub async fn submit_stroke(
        &self,
        player_id: PlayerId,
        points: Vec<StrokePoint>,
        origin: Option<ConnectionId>,
    ) -> Result<(), ServiceError> {
        self.request(|reply| RoomCommand::SubmitStroke {
            player_id,
            points,
            origin,
            reply,
        })
        .await
    }

    pub async fn clear_canvas(&self, player_id: PlayerId) -> Result<(), ServiceError> {
        self.request(|reply| RoomCommand::ClearCanvas { player_id, reply })
            .await
    }

    pub async fn end_game(&self, player_id: PlayerId) -> Result<(), ServiceError> {
        self.request(|reply| RoomCommand::EndGame { player_id, reply })
            .await
    }

    /// Prune offline players and report whether the room should go.
    /// A room whose actor is already gone counts as evicted.
    pub(crate) async fn sweep(&self, now: Instant) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(RoomCommand::Sweep { now, reply })
            .await
            .is_err()
        {
            return true;
        }
        response.await.unwrap_or(true)
    }

    pub(crate) async fn close(&self) {
        let _ = self.commands.send(RoomCommand::Close).await;
    }
}

/// Current time on the tokio clock, so paused-clock tests drive the session.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Start the actor that owns `session` and return a handle to it.
pub fn spawn_room(session: Session, cleanup: RoomCleanup) -> RoomHandle {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot) = watch::channel(session.room());

    let handle = RoomHandle {
        id: session.id(),
        created_at: session.created_at(),
        commands: commands.clone(),
        snapshot,
    };

    let actor = RoomActor {
        bus: EventBus::new(session.id()),
        session,
        scheduler: RoundScheduler::new(),
        cleanup,
        snapshot: snapshot_tx,
        commands: commands.downgrade(),
        receiver,
    };
    tokio::spawn(actor.run());

    handle
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct RoomActor {
    session: Session,
    bus: EventBus,
    scheduler: RoundScheduler,
    cleanup: RoomCleanup,
    snapshot: watch::Sender<Room>,
    commands: mpsc::WeakSender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_id = self.session.id();
        while let Some(command) = self.receiver.recv().await {
            if self.handle(command) == Flow::Stop {
                break;
            }
        }
        self.scheduler.cancel();
        self.bus.close();
        debug!("Room {} actor stopped", room_id);
    }

    fn handle(&mut self, command: RoomCommand) -> Flow {
        match command {
            RoomCommand::Join {
                name,
                subscription,
                reply,
            } => {
                let result = self
                    .session
                    .join(&name, now())
                    .map(|(player, events)| self.attach(player, events, subscription));
                let _ = reply.send(result.map_err(ServiceError::from));
            }
            RoomCommand::Rejoin {
                player_id,
                subscription,
                reply,
            } => {
                let result = self
                    .session
                    .rejoin(player_id, now())
                    .map(|(player, events)| self.attach(player, events, subscription));
                let _ = reply.send(result.map_err(ServiceError::from));
            }
            RoomCommand::Leave {
                player_id,
                connection_id,
                reply,
            } => {
                if let Some(connection_id) = connection_id {
                    self.bus.unsubscribe(connection_id);
                }
                let result = if self.bus.has_player(player_id) {
                    Ok(())
                } else {
                    self.session
                        .leave(player_id, now())
                        .map(|events| self.commit(events, None))
                };
                let _ = reply.send(result.map_err(ServiceError::from));
            }
            RoomCommand::Disconnect { connection_id } => {
                if let Some(player_id) = self.bus.unsubscribe(connection_id) {
                    self.mark_offline(player_id);
                }
            }
            RoomCommand::StartGame { player_id, reply } => {
                let result = self.session.start_game(player_id, now());
                let _ = reply.send(self.apply(result, None));
            }
            RoomCommand::SubmitGuess {
                player_id,
                text,
                reply,
            } => {
                let result = self
                    .session
                    .submit_guess(player_id, &text, now())
                    .map(|(outcome, events)| {
                        self.commit(events, None);
                        outcome
                    });
                let _ = reply.send(result.map_err(ServiceError::from));
            }
            RoomCommand::SubmitStroke {
                player_id,
                points,
                origin,
                reply,
            } => {
                let result = self.session.submit_stroke(player_id, points, now());
                let _ = reply.send(self.apply(result, origin));
            }
            RoomCommand::ClearCanvas { player_id, reply } => {
                let result = self.session.clear_canvas(player_id, now());
                let _ = reply.send(self.apply(result, None));
            }
            RoomCommand::EndGame { player_id, reply } => {
                let result = self.session.end_game(player_id, now());
                let _ = reply.send(self.apply(result, None));
            }
            RoomCommand::RoundTimeout { generation } => {
                match self.session.round_timeout(generation) {
                    Ok(events) => {
                        info!("Round timer expired in room {}", self.session.id());
                        self.commit(events, None);
                    }
                    Err(SessionError::StaleRound { generation }) => {
                        debug!(
                            "Ignoring stale round timer (generation {}) in room {}",
                            generation,
                            self.session.id()
                        );
                    }
                    Err(e) => warn!("Round timer rejected in room {}: {}", self.session.id(), e),
                }
            }
            RoomCommand::Sweep { now, reply } => {
                let events = self.cleanup.prune_players(&mut self.session, now);
                if !events.is_empty() {
                    self.commit(events, None);
                }
                let eviction = self.cleanup.should_evict(&self.session, now);
                let _ = reply.send(eviction.is_some());
                if let Some(reason) = eviction {
                    info!("Evicting room {} ({:?})", self.session.id(), reason);
                    return Flow::Stop;
                }
            }
            RoomCommand::Close => {
                info!("Closing room {}", self.session.id());
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn apply(
        &mut self,
        result: Result<Vec<RoomEvent>, SessionError>,
        origin: Option<ConnectionId>,
    ) -> Result<(), ServiceError> {
        let events = result?;
        self.commit(events, origin);
        Ok(())
    }

    /// Publish committed events, refresh the shared snapshot and keep the
    /// round timer in step with the session.
    fn commit(&mut self, events: Vec<RoomEvent>, origin: Option<ConnectionId>) {
        self.snapshot.send_replace(self.session.room());

        let mut gone = Vec::new();
        for event in &events {
            debug!("Room {} event {}", self.session.id(), event.name());
            for player_id in self.bus.publish(event, origin) {
                if !gone.contains(&player_id) {
                    gone.push(player_id);
                }
            }
        }
        self.sync_timer();

        for player_id in gone {
            self.mark_offline(player_id);
        }
    }

    fn attach(
        &mut self,
        player: Player,
        events: Vec<RoomEvent>,
        subscription: Option<Subscription>,
    ) -> Player {
        self.commit(events, None);

        if let Some(subscription) = subscription {
            let connection_id = subscription.connection_id;
            self.bus.subscribe(subscription, player.id);
            self.bus.send_to(
                connection_id,
                ServerMessage::Joined {
                    room_id: self.session.id(),
                    player_id: player.id,
                },
            );
            self.bus.send_to(
                connection_id,
                ServerMessage::RoomSnapshot {
                    room: self.session.room().personalized_for(Some(player.id)),
                    strokes: self.session.strokes().to_vec(),
                    guesses: self.session.guesses().to_vec(),
                },
            );
        }
        player
    }

    fn mark_offline(&mut self, player_id: PlayerId) {
        if self.bus.has_player(player_id) {
            return;
        }
        match self.session.leave(player_id, now()) {
            Ok(events) => self.commit(events, None),
            Err(e) => debug!("Player {} already gone: {}", player_id, e),
        }
    }

    fn sync_timer(&mut self) {
        let generation = self.session.round_generation();
        match self.session.phase() {
            RoomPhase::RoundActive => {
                if self.scheduler.armed_generation() != Some(generation) {
                    self.scheduler.arm(
                        generation,
                        self.session.round_duration(),
                        self.commands.clone(),
                    );
                }
            }
            _ => self.scheduler.cancel(),
        }
    }
}
