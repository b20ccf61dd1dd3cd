use sketch_types::{ErrorKind, PlayerId};
use thiserror::Error;

/// Why the session refused a request. Rejections never mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("display name must not be empty")]
    EmptyName,
    #[error("guess must not be empty")]
    EmptyGuess,
    #[error("invalid stroke: {0}")]
    InvalidStroke(String),
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
    #[error("player {0} is not in this room")]
    PlayerNotFound(PlayerId),
    #[error("only the host can do that")]
    NotHost,
    #[error("at least {required} players are needed to start")]
    NotEnoughPlayers { required: usize },
    #[error("the game has already started")]
    AlreadyStarted,
    #[error("the drawer cannot guess their own word")]
    IsDrawer,
    #[error("only the current drawer can draw")]
    NotDrawer,
    #[error("no round is in progress")]
    RoomNotActive,
    #[error("the game in this room has ended")]
    RoomInactive,
    #[error("round trigger for generation {generation} is stale")]
    StaleRound { generation: u64 },
    #[error("the word list is empty")]
    NoWords,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::EmptyName
            | SessionError::EmptyGuess
            | SessionError::InvalidStroke(_)
            | SessionError::InvalidConfig(_) => ErrorKind::Validation,
            SessionError::PlayerNotFound(_) => ErrorKind::NotFound,
            SessionError::StaleRound { .. } => ErrorKind::Timing,
            SessionError::NotHost
            | SessionError::NotEnoughPlayers { .. }
            | SessionError::AlreadyStarted
            | SessionError::IsDrawer
            | SessionError::NotDrawer
            | SessionError::RoomNotActive
            | SessionError::RoomInactive
            | SessionError::NoWords => ErrorKind::Conflict,
        }
    }

    /// Stable identifier clients can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::EmptyName => "EmptyName",
            SessionError::EmptyGuess => "EmptyGuess",
            SessionError::InvalidStroke(_) => "InvalidStroke",
            SessionError::InvalidConfig(_) => "InvalidConfig",
            SessionError::PlayerNotFound(_) => "PlayerNotFound",
            SessionError::NotHost => "NotHost",
            SessionError::NotEnoughPlayers { .. } => "NotEnoughPlayers",
            SessionError::AlreadyStarted => "AlreadyStarted",
            SessionError::IsDrawer => "IsDrawer",
            SessionError::NotDrawer => "NotDrawer",
            SessionError::RoomNotActive => "RoomNotActive",
            SessionError::RoomInactive => "RoomInactive",
            SessionError::StaleRound { .. } => "StaleRound",
            SessionError::NoWords => "NoWords",
        }
    }
}
