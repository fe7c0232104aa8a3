use log::{debug, info};

use crate::models::{Segment, Session};
use crate::presets;

use super::input::{Field, SegmentUpdate};
use super::EditorError;

/// Sessions shorter than this can neither be started nor shrunk further.
pub const MIN_SEGMENTS: usize = 5;

const DEFAULT_SEGMENT_SECS: u32 = 60;
const DEFAULT_SEGMENT_SPEED: f64 = 3.0;
const DEFAULT_SEGMENT_INCLINE: f64 = 0.0;

/// A session that passed the start checks. Only the editor can produce one,
/// so the playback controller never sees a session under the segment floor.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSession(Session);

impl ValidatedSession {
    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0.segments
    }
}

/// Working copy of the session being set up.
#[derive(Debug, Clone)]
pub struct SessionEditor {
    session: Session,
}

impl Default for SessionEditor {
    fn default() -> Self {
        Self::new(presets::default_session())
    }
}

impl SessionEditor {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.session.name = name.into();
    }

    /// Appends a segment with the stock defaults and returns its id.
    pub fn add_segment(&mut self) -> String {
        let segment = Segment::new(
            DEFAULT_SEGMENT_SECS,
            DEFAULT_SEGMENT_SPEED,
            DEFAULT_SEGMENT_INCLINE,
        );
        let id = segment.id.clone();
        self.session.segments.push(segment);
        id
    }

    /// Removes a segment unless that would leave the session at or under the
    /// floor. Returns whether anything was removed.
    pub fn remove_segment(&mut self, id: &str) -> bool {
        if self.session.segments.len() <= MIN_SEGMENTS {
            debug!(
                "refusing to remove segment {id}: session already at {} segments",
                self.session.segments.len()
            );
            return false;
        }

        let before = self.session.segments.len();
        self.session.segments.retain(|segment| segment.id != id);
        before != self.session.segments.len()
    }

    pub fn update_segment(&mut self, id: &str, update: &SegmentUpdate) -> Result<(), EditorError> {
        let segment = self
            .session
            .segment_mut(id)
            .ok_or_else(|| EditorError::UnknownSegment(id.to_string()))?;
        update.apply(segment);
        Ok(())
    }

    pub fn set_field(&mut self, id: &str, field: Field, value: f64) -> Result<(), EditorError> {
        self.update_segment(id, &SegmentUpdate::field(field, value))
    }

    /// Applies text typed into a field, resolving it like a blurred input box.
    pub fn enter_text(&mut self, id: &str, field: Field, raw: &str) -> Result<(), EditorError> {
        let value = field.bounds().resolve(raw);
        self.set_field(id, field, value)
    }

    /// Replaces the working session with a fresh copy of a preset.
    pub fn load_preset(&mut self, preset_id: &str) -> Result<(), EditorError> {
        let preset =
            presets::load(preset_id).ok_or_else(|| EditorError::UnknownPreset(preset_id.to_string()))?;
        info!(
            "Loaded preset {} ({} segments)",
            preset.id,
            preset.segments.len()
        );
        self.session = preset;
        Ok(())
    }

    pub fn validate_for_playback(&self) -> Result<ValidatedSession, EditorError> {
        let count = self.session.segments.len();
        if count < MIN_SEGMENTS {
            return Err(EditorError::TooFewSegments {
                count,
                min: MIN_SEGMENTS,
            });
        }
        Ok(ValidatedSession(self.session.clone()))
    }

    /// Total planned time as shown in the setup header, e.g. `39m 0s`.
    pub fn total_time_label(&self) -> String {
        let total = self.session.total_duration_secs();
        format!("{}m {}s", total / 60, total % 60)
    }
}
