pub mod input;
pub mod session_editor;

use thiserror::Error;

pub use input::{Field, FieldBounds, SegmentUpdate};
pub use session_editor::{SessionEditor, ValidatedSession, MIN_SEGMENTS};

#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("session must have at least {min} segments (has {count})")]
    TooFewSegments { count: usize, min: usize },
    #[error("no segment with id {0}")]
    UnknownSegment(String),
    #[error("no preset named {0}")]
    UnknownPreset(String),
}
