use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::player::Player;
use crate::{PlayerId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomPhase {
    Lobby,       // Waiting for the host to start
    RoundActive, // Timer running, word assigned
    RoundEnding, // Between a round's end and the next round
    GameEnded,   // Terminal
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundEndReason {
    Guessed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameEndReason {
    RoundsCompleted,
    HostEnded,
}

/// Full room state. `current_word` is only ever populated in the copy
/// addressed to the drawer, see [`Room::personalized_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub host_id: PlayerId,
    pub current_player_id: Option<PlayerId>,
    pub current_word: Option<String>,
    pub round_number: u32,
    pub max_rounds: u32,
    pub time_per_round: u32,
    pub is_active: bool,
    pub phase: RoomPhase,
    pub players: Vec<Player>,
    pub round_ends_at: Option<String>, // ISO 8601 string
    pub created_at: String,            // ISO 8601 string
}

impl Room {
    /// Copy of the room as seen by `viewer`. Everyone except the current
    /// drawer gets the word stripped.
    pub fn personalized_for(&self, viewer: Option<PlayerId>) -> Self {
        let is_drawer = viewer.is_some() && viewer == self.current_player_id;
        let mut room = self.clone();
        if !is_drawer {
            room.current_word = None;
        }
        room
    }

    /// Short display code: the first six hex digits of the id, uppercased.
    pub fn code(&self) -> String {
        room_code(&self.id)
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            code: self.code(),
            name: self.name.clone(),
            round_number: self.round_number,
            max_rounds: self.max_rounds,
            time_per_round: self.time_per_round,
            phase: self.phase,
            player_count: self.players.len() as u32,
            created_at: self.created_at.clone(),
        }
    }
}

pub fn room_code(id: &RoomId) -> String {
    id.simple().to_string()[..6].to_uppercase()
}

/// Row of the public room list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSummary {
    pub id: RoomId,
    pub code: String,
    pub name: String,
    pub round_number: u32,
    pub max_rounds: u32,
    pub time_per_round: u32,
    pub phase: RoomPhase,
    pub player_count: u32,
    pub created_at: String,
}
