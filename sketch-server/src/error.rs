use sketch_core::SessionError;
use sketch_types::{ErrorKind, ErrorBody, RoomId, ServerMessage};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),
    #[error("room {0} has been closed")]
    RoomClosed(RoomId),
    #[error("join or create a room first")]
    NotInRoom,
    #[error("too many messages, slow down")]
    RateLimited,
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("connection is closed")]
    Disconnected,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Session(e) => e.kind(),
            ServiceError::RoomNotFound(_) | ServiceError::RoomClosed(_) => ErrorKind::NotFound,
            ServiceError::NotInRoom | ServiceError::RateLimited | ServiceError::Disconnected => {
                ErrorKind::Conflict
            }
            ServiceError::InvalidMessage(_) => ErrorKind::Validation,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Session(e) => e.code(),
            ServiceError::RoomNotFound(_) => "RoomNotFound",
            ServiceError::RoomClosed(_) => "RoomClosed",
            ServiceError::NotInRoom => "NotInRoom",
            ServiceError::RateLimited => "RateLimited",
            ServiceError::InvalidMessage(_) => "InvalidMessage",
            ServiceError::Disconnected => "Disconnected",
        }
    }

    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::Error {
            kind: self.kind(),
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }

    pub fn status_code(&self) -> warp::http::StatusCode {
        match self.kind() {
            ErrorKind::Validation => warp::http::StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => warp::http::StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::Timing => warp::http::StatusCode::CONFLICT,
        }
    }
}
