pub mod commands;
pub mod controller;
pub mod state;

pub use commands::PlaybackCommand;
pub use controller::{PlaybackController, PlaybackEvent};
pub use state::{PlaybackSnapshot, PlaybackState, PlaybackStatus, TickOutcome};
