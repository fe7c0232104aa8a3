//! Built-in session catalog.
//!
//! The catalog is built once and never mutated. Callers that want to edit a
//! preset must go through [`load`], which hands back an independent copy.

use std::sync::LazyLock;

use crate::models::{Segment, Session};

pub const HIIT_GONZALO: &str = "hiit-gonzalo";
pub const BASIC_WARMUP: &str = "basic-warmup";

static CATALOG: LazyLock<Vec<Session>> = LazyLock::new(build_catalog);

fn minutes(m: u32) -> u32 {
    m * 60
}

fn build_catalog() -> Vec<Session> {
    let mut hiit = vec![
        Segment::new(minutes(5), 3.5, 5.0),
        Segment::new(minutes(6), 4.5, 8.0),
        Segment::new(minutes(6), 4.5, 11.0),
        Segment::new(minutes(6), 4.5, 9.0),
        Segment::new(minutes(6), 4.5, 12.0),
        Segment::new(minutes(1), 4.5, 13.0),
        Segment::new(minutes(1), 4.5, 14.0),
        Segment::new(minutes(1), 4.5, 15.0),
    ];
    // Segments 9-17: 30 s at 4 km/h, incline stepping down from 14 to 6.
    hiit.extend((0..9).map(|step| Segment::new(30, 4.0, f64::from(14 - step))));
    hiit.extend([
        Segment::new(30, 3.5, 5.0),
        Segment::new(30, 3.5, 4.0),
        Segment::new(30, 3.0, 3.0),
        Segment::new(minutes(1), 2.0, 2.0),
    ]);

    let warmup = vec![
        Segment::new(minutes(2), 3.0, 0.0),
        Segment::new(minutes(2), 4.0, 2.0),
        Segment::new(minutes(2), 5.0, 4.0),
        Segment::new(minutes(2), 6.0, 2.0),
        Segment::new(minutes(2), 3.0, 0.0),
    ];

    vec![
        Session::new(HIIT_GONZALO, "HIIT GONZALO", hiit),
        Session::new(BASIC_WARMUP, "Calentamiento Básico", warmup),
    ]
}

/// Every preset, in catalog order.
pub fn all() -> &'static [Session] {
    &CATALOG
}

pub fn find(preset_id: &str) -> Option<&'static Session> {
    CATALOG.iter().find(|preset| preset.id == preset_id)
}

/// Deep copy of the named preset, ready to be edited.
pub fn load(preset_id: &str) -> Option<Session> {
    find(preset_id).cloned()
}

/// The session a fresh editor starts with: a copy of the first preset.
pub fn default_session() -> Session {
    CATALOG[0].clone()
}
