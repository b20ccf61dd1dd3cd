use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coarse classification of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorKind {
    Validation, // Malformed or empty input
    NotFound,   // Unknown room or player
    Conflict,   // Not allowed in the current state or for this player
    Timing,     // Stale round trigger, normally absorbed server-side
}

/// Error payload used by HTTP replies.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}
