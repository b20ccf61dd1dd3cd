pub mod cleanup;
pub mod errors;
pub mod events;
pub mod scoring;
pub mod session;
pub mod strokes;
pub mod words;

// Re-export main components
pub use cleanup::*;
pub use errors::*;
pub use events::*;
pub use scoring::*;
pub use session::*;
pub use strokes::*;
pub use words::*;
