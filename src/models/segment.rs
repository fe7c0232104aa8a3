use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One leg of a workout: how long it lasts and what the belt should be set to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub duration_secs: u32,
    /// Target belt speed in km/h.
    pub speed: f64,
    /// Target incline in percent.
    pub incline: f64,
}

impl Segment {
    pub fn new(duration_secs: u32, speed: f64, incline: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            duration_secs,
            speed,
            incline,
        }
    }

    /// Duration split the way the editor shows it: whole minutes and the leftover seconds.
    pub fn minutes_and_seconds(&self) -> (u32, u32) {
        (self.duration_secs / 60, self.duration_secs % 60)
    }
}
