use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GuessId, PlayerId, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub id: GuessId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    pub is_correct: bool,
    pub round_number: u32,
    pub created_at: String, // ISO 8601 string
}

/// What the guessing player is told about their submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessOutcome {
    pub accepted: bool,
    pub is_correct: bool,
    pub points_awarded: u32,
}
