//! Plain-text rendering for the terminal front end.

use std::fmt::Write;

use crate::models::{Segment, Session};
use crate::timer::{PlaybackSnapshot, PlaybackStatus};

const BELL: char = '\u{7}';
const PROGRESS_WIDTH: usize = 20;

/// `MM:SS`; minutes keep growing past 99 rather than wrapping.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn format_targets(segment: &Segment) -> String {
    format!("{:>4.1} km/h {:>4.0}%", segment.speed, segment.incline)
}

fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0)) * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        " ".repeat(PROGRESS_WIDTH - filled)
    )
}

/// One status line per frame. Rings the terminal bell while the segment is
/// about to run out, if `bell` is set.
pub fn render_frame(snapshot: &PlaybackSnapshot, bell: bool) -> String {
    let mut line = String::new();
    if bell && snapshot.near_expiry {
        line.push(BELL);
    }

    let marker = match (snapshot.status, snapshot.near_expiry) {
        (PlaybackStatus::Paused, _) => "PAUSA",
        (PlaybackStatus::Finished, _) => "FIN",
        (PlaybackStatus::Running, true) => "!!",
        (PlaybackStatus::Running, false) => "",
    };

    let _ = write!(
        line,
        "Tramo {} de {} {:>5} {} | {} | total {} {} {:>3.0}%",
        snapshot.current_index + 1,
        snapshot.segment_count,
        marker,
        format_clock(u64::from(snapshot.segment_remaining)),
        format_targets(&snapshot.current),
        format_clock(snapshot.total_remaining),
        progress_bar(snapshot.progress()),
        snapshot.progress() * 100.0,
    );

    if let Some(next) = &snapshot.next {
        let _ = write!(
            line,
            " | siguiente {} {}",
            format_clock(u64::from(next.duration_secs)),
            format_targets(next)
        );
    }

    line
}

/// Numbered table of a session's segments.
pub fn render_plan(session: &Session) -> String {
    let total = session.total_duration_secs();
    let mut out = format!(
        "{} ({} tramos, {}m {}s)\n",
        session.name,
        session.segments.len(),
        total / 60,
        total % 60
    );
    for (index, segment) in session.segments.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} {}",
            index + 1,
            format_clock(u64::from(segment.duration_secs)),
            format_targets(segment)
        );
    }
    out
}

pub fn render_catalog(presets: &[Session]) -> String {
    let mut out = String::new();
    for preset in presets {
        let total = preset.total_duration_secs();
        let _ = writeln!(
            out,
            "{:<16} {:<24} {:>3} tramos {:>4}m {:>2}s",
            preset.id,
            preset.name,
            preset.segments.len(),
            total / 60,
            total % 60
        );
    }
    out
}

/// Closing message once a session has been played to the end.
pub fn render_summary(session: &Session) -> String {
    format!(
        "¡Entrenamiento completado! {}: {} tramos, {}m",
        session.name,
        session.segments.len(),
        session.total_duration_secs() / 60
    )
}
