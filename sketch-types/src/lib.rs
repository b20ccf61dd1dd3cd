pub mod errors;
pub mod messages;
pub mod player;
pub mod room;
pub mod stroke;

// Re-export all types
pub use errors::*;
pub use messages::*;
pub use player::*;
pub use room::*;
pub use stroke::*;

pub type RoomId = uuid::Uuid;
pub type PlayerId = uuid::Uuid;
pub type GuessId = uuid::Uuid;
