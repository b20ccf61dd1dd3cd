use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    ErrorKind, GameEndReason, Guess, GuessOutcome, Player, PlayerId, Room, RoomId,
    RoundEndReason, Stroke, StrokePoint,
};

/// Requests sent by a client over its websocket. After `CreateRoom`,
/// `JoinRoom` or `Rejoin` the connection is bound to that room and player,
/// so later requests carry no identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    CreateRoom {
        host_name: String,
        room_name: Option<String>,
        max_rounds: Option<u32>,
        time_per_round: Option<u32>,
    },
    JoinRoom { room_id: RoomId, player_name: String },
    Rejoin { room_id: RoomId, player_id: PlayerId },
    StartGame,
    SubmitGuess { text: String },
    SubmitStroke { points: Vec<StrokePoint> },
    ClearCanvas,
    EndGame,
    LeaveRoom,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    RoomCreated { room_id: RoomId, player_id: PlayerId },
    Joined { room_id: RoomId, player_id: PlayerId },
    RoomSnapshot { room: Room, strokes: Vec<Stroke>, guesses: Vec<Guess> },
    RoomUpdated { room: Room },
    PlayerJoined { player: Player },
    PlayerLeft { player: Player, removed: bool },
    GuessSubmitted { guess: Guess },
    GuessResult { outcome: GuessOutcome },
    StrokeAppended { stroke: Stroke },
    StrokesCleared { round_number: u32 },
    RoundEnded {
        round_number: u32,
        word: String,
        reason: RoundEndReason,
        solver_id: Option<PlayerId>,
    },
    GameEnded { reason: GameEndReason, final_scores: Vec<Player> },
    RoomClosed { room_id: RoomId },
    Ack,
    Left,
    Error { kind: ErrorKind, code: String, message: String },
}
