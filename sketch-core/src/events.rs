use sketch_types::{
    GameEndReason, Guess, Player, PlayerId, Room, RoomId, RoundEndReason, ServerMessage, Stroke,
};

/// State deltas produced by committed session mutations, in commit order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// Room-level fields changed (phase, round, drawer, scores). Carries the
    /// unredacted room; it must be personalized before it leaves the server.
    RoomUpdated { room: Room },
    PlayerJoined { player: Player },
    PlayerLeft { player: Player, removed: bool },
    GuessSubmitted { guess: Guess },
    StrokeAppended { stroke: Stroke },
    StrokesCleared { round_number: u32 },
    RoundEnded {
        round_number: u32,
        word: String,
        reason: RoundEndReason,
        solver_id: Option<PlayerId>,
    },
    GameEnded { reason: GameEndReason, final_scores: Vec<Player> },
    /// Terminal: the room was evicted and every subscription is dropped.
    RoomClosed { room_id: RoomId },
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::RoomUpdated { .. } => "RoomUpdated",
            RoomEvent::PlayerJoined { .. } => "PlayerJoined",
            RoomEvent::PlayerLeft { .. } => "PlayerLeft",
            RoomEvent::GuessSubmitted { .. } => "GuessSubmitted",
            RoomEvent::StrokeAppended { .. } => "StrokeAppended",
            RoomEvent::StrokesCleared { .. } => "StrokesCleared",
            RoomEvent::RoundEnded { .. } => "RoundEnded",
            RoomEvent::GameEnded { .. } => "GameEnded",
            RoomEvent::RoomClosed { .. } => "RoomClosed",
        }
    }

    /// Wire form of the event as delivered to `viewer`.
    pub fn to_message_for(&self, viewer: Option<PlayerId>) -> ServerMessage {
        match self {
            RoomEvent::RoomUpdated { room } => ServerMessage::RoomUpdated {
                room: room.personalized_for(viewer),
            },
            RoomEvent::PlayerJoined { player } => ServerMessage::PlayerJoined {
                player: player.clone(),
            },
            RoomEvent::PlayerLeft { player, removed } => ServerMessage::PlayerLeft {
                player: player.clone(),
                removed: *removed,
            },
            RoomEvent::GuessSubmitted { guess } => ServerMessage::GuessSubmitted {
                guess: guess.clone(),
            },
            RoomEvent::StrokeAppended { stroke } => ServerMessage::StrokeAppended {
                stroke: stroke.clone(),
            },
            RoomEvent::StrokesCleared { round_number } => ServerMessage::StrokesCleared {
                round_number: *round_number,
            },
            RoomEvent::RoundEnded {
                round_number,
                word,
                reason,
                solver_id,
            } => ServerMessage::RoundEnded {
                round_number: *round_number,
                word: word.clone(),
                reason: *reason,
                solver_id: *solver_id,
            },
            RoomEvent::GameEnded {
                reason,
                final_scores,
            } => ServerMessage::GameEnded {
                reason: *reason,
                final_scores: final_scores.clone(),
            },
            RoomEvent::RoomClosed { room_id } => ServerMessage::RoomClosed { room_id: *room_id },
        }
    }
}
