//! Numeric field rules for segment editing.
//!
//! Edits never fail: out-of-range numbers clamp to the nearest bound and
//! anything that does not parse falls back to the field minimum.

use crate::models::Segment;

pub const MAX_MINUTES: f64 = 99.0;
pub const MAX_SECONDS: f64 = 59.0;
pub const MAX_SPEED: f64 = 15.0;
pub const MAX_INCLINE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Minutes,
    Seconds,
    Speed,
    Incline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
}

impl FieldBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Resolves raw text the way an input box does when it loses focus.
    pub fn resolve(&self, raw: &str) -> f64 {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => self.clamp(value),
            _ => self.min,
        }
    }
}

impl Field {
    pub fn bounds(self) -> FieldBounds {
        match self {
            Field::Minutes => FieldBounds::new(0.0, MAX_MINUTES),
            Field::Seconds => FieldBounds::new(0.0, MAX_SECONDS),
            Field::Speed => FieldBounds::new(0.0, MAX_SPEED),
            Field::Incline => FieldBounds::new(0.0, MAX_INCLINE),
        }
    }
}

/// Partial edit of a segment. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentUpdate {
    pub minutes: Option<f64>,
    pub seconds: Option<f64>,
    pub speed: Option<f64>,
    pub incline: Option<f64>,
}

impl SegmentUpdate {
    pub fn field(field: Field, value: f64) -> Self {
        let mut update = Self::default();
        match field {
            Field::Minutes => update.minutes = Some(value),
            Field::Seconds => update.seconds = Some(value),
            Field::Speed => update.speed = Some(value),
            Field::Incline => update.incline = Some(value),
        }
        update
    }

    pub fn duration_secs(total: u32) -> Self {
        Self {
            minutes: Some(f64::from(total / 60)),
            seconds: Some(f64::from(total % 60)),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, segment: &mut Segment) {
        let (mins, secs) = segment.minutes_and_seconds();
        // Whole units only; fractional minutes or seconds are truncated.
        let mins = self
            .minutes
            .map(|value| Field::Minutes.bounds().clamp(value) as u32)
            .unwrap_or(mins);
        let secs = self
            .seconds
            .map(|value| Field::Seconds.bounds().clamp(value) as u32)
            .unwrap_or(secs);
        segment.duration_secs = mins * 60 + secs;

        if let Some(speed) = self.speed {
            segment.speed = Field::Speed.bounds().clamp(speed);
        }
        if let Some(incline) = self.incline {
            segment.incline = Field::Incline.bounds().clamp(incline);
        }
    }
}
