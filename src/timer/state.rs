use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Segment;

/// Segments at or under this many seconds left count as about to expire.
pub const NEAR_EXPIRY_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackStatus {
    Running,
    Paused,
    Finished,
}

/// What a single tick did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed.
    Ignored,
    Counted,
    /// The current segment ran out and playback moved on.
    Advanced { from: usize, to: usize },
    Finished,
}

/// Countdown over an ordered list of segments.
///
/// The state owns its own copy of the segments, so edits made in setup after
/// playback starts cannot reach a running session.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    segments: Vec<Segment>,
    current_index: usize,
    segment_remaining: u32,
    total_remaining: u64,
    status: PlaybackStatus,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of the playback state handed to observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub current_index: usize,
    pub segment_count: usize,
    pub segment_remaining: u32,
    pub total_remaining: u64,
    pub total_duration: u64,
    pub near_expiry: bool,
    pub current: Segment,
    pub next: Option<Segment>,
    pub started_at: DateTime<Utc>,
}

impl PlaybackSnapshot {
    /// Fraction of the whole session already played, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total_duration == 0 {
            return 1.0;
        }
        1.0 - self.total_remaining as f64 / self.total_duration as f64
    }
}

impl PlaybackState {
    /// Returns `None` for an empty segment list; callers are expected to have
    /// enforced the session floor already.
    pub fn new(segments: Vec<Segment>, started_at: DateTime<Utc>) -> Option<Self> {
        let first = segments.first()?.duration_secs;
        let total_remaining = segments
            .iter()
            .map(|segment| u64::from(segment.duration_secs))
            .sum();

        Some(Self {
            segments,
            current_index: 0,
            segment_remaining: first,
            total_remaining,
            status: PlaybackStatus::Running,
            started_at,
        })
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn segment_remaining(&self) -> u32 {
        self.segment_remaining
    }

    pub fn total_remaining(&self) -> u64 {
        self.total_remaining
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn current_segment(&self) -> &Segment {
        &self.segments[self.current_index]
    }

    pub fn next_segment(&self) -> Option<&Segment> {
        self.segments.get(self.current_index + 1)
    }

    pub fn is_near_expiry(&self) -> bool {
        self.is_near_expiry_within(NEAR_EXPIRY_SECS)
    }

    pub fn is_near_expiry_within(&self, window_secs: u32) -> bool {
        self.segment_remaining > 0 && self.segment_remaining <= window_secs
    }

    fn is_last(&self) -> bool {
        self.current_index + 1 >= self.segments.len()
    }

    /// Advances the countdown by one second.
    ///
    /// A segment that hits zero is replaced by the next one within the same
    /// tick, and zero-length segments after it are skipped in that tick too.
    /// The one exception is a zero-length first segment: it stays current
    /// until the first tick, which only moves past it. `[0, 2, 2, 2, 2]`
    /// therefore takes 9 ticks for 8 seconds of countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != PlaybackStatus::Running {
            return TickOutcome::Ignored;
        }

        if self.segment_remaining > 0 {
            self.segment_remaining -= 1;
            self.total_remaining = self.total_remaining.saturating_sub(1);
        }

        if self.segment_remaining > 0 {
            return TickOutcome::Counted;
        }

        let from = self.current_index;
        while self.segment_remaining == 0 {
            if self.is_last() {
                self.status = PlaybackStatus::Finished;
                return TickOutcome::Finished;
            }
            self.current_index += 1;
            self.segment_remaining = self.segments[self.current_index].duration_secs;
        }

        TickOutcome::Advanced {
            from,
            to: self.current_index,
        }
    }

    /// Returns `true` if this call changed the status.
    pub fn pause(&mut self) -> bool {
        if self.status != PlaybackStatus::Running {
            return false;
        }
        self.status = PlaybackStatus::Paused;
        true
    }

    /// Returns `true` if this call changed the status.
    pub fn resume(&mut self) -> bool {
        if self.status != PlaybackStatus::Paused {
            return false;
        }
        self.status = PlaybackStatus::Running;
        true
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot_with_window(NEAR_EXPIRY_SECS)
    }

    pub fn snapshot_with_window(&self, near_expiry_secs: u32) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            current_index: self.current_index,
            segment_count: self.segments.len(),
            segment_remaining: self.segment_remaining,
            total_remaining: self.total_remaining,
            total_duration: self
                .segments
                .iter()
                .map(|segment| u64::from(segment.duration_secs))
                .sum(),
            near_expiry: self.is_near_expiry_within(near_expiry_secs),
            current: self.current_segment().clone(),
            next: self.next_segment().cloned(),
            started_at: self.started_at,
        }
    }
}
