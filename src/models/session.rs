use serde::{Deserialize, Serialize};

use super::Segment;

/// A named, ordered list of segments. Segments play in vector order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            segments,
        }
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| u64::from(segment.duration_secs))
            .sum()
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    pub fn segment_mut(&mut self, id: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|segment| segment.id == id)
    }
}
