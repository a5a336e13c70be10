//! Arrival clock and display timestamps.
//!
//! Ranking is defined by [`ArrivalTime`], read from a monotonic
//! [`Instant`] rather than the wall clock so that clock adjustments on the
//! host can never reorder presses. The wall clock is only used for the
//! human-readable display string.
//!
//! Every reading handed out by [`ArrivalClock::stamp`] is strictly greater
//! than the previous one: if the underlying `Instant` has not advanced
//! (coarse timers, two presses inside the same tick) the clock bumps the
//! reading by one nanosecond.

use std::time::Instant;

use buzzer_types::ArrivalTime;
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Display format for press times: `HH:MM:SS.mmm`.
pub const DISPLAY_FORMAT: &str = "%H:%M:%S%.3f";

/// The time readings attached to one accepted press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// Monotonic arrival reading.
    pub arrival: ArrivalTime,
    /// Wall-clock acceptance time.
    pub wall: DateTime<Utc>,
    /// `wall` rendered in the display offset.
    pub display: String,
}

/// Issues strictly increasing arrival readings for one event.
#[derive(Debug, Clone)]
pub struct ArrivalClock {
    /// Instant the clock was created (or resumed).
    epoch: Instant,
    /// Nanoseconds added to every reading; non-zero after a resume.
    base: u64,
    /// The last reading handed out, if any.
    last: Option<u64>,
    /// Offset used for display strings.
    display_offset: FixedOffset,
}

impl ArrivalClock {
    /// Create a clock starting at zero that renders display times in the
    /// given offset.
    pub fn new(display_offset: FixedOffset) -> Self {
        Self {
            epoch: Instant::now(),
            base: 0,
            last: None,
            display_offset,
        }
    }

    /// Restart the clock so that every future reading is strictly greater
    /// than `after`.
    ///
    /// Used when a previous run's presses are restored from storage.
    pub fn resume_after(&mut self, after: ArrivalTime) {
        self.epoch = Instant::now();
        self.base = after.as_nanos().saturating_add(1);
        self.last = Some(after.as_nanos());
    }

    /// Make sure every future reading is strictly greater than `seen`.
    ///
    /// Unlike [`resume_after`](Self::resume_after) this never moves the
    /// clock backwards.
    pub fn observe(&mut self, seen: ArrivalTime) {
        let seen = seen.as_nanos();
        if self.last.is_none_or(|last| last < seen) {
            self.last = Some(seen);
        }
    }

    /// The display offset.
    pub const fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Take the next arrival reading together with the wall-clock time.
    pub fn stamp(&mut self) -> Stamp {
        let elapsed = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let mut reading = self.base.saturating_add(elapsed);
        if let Some(last) = self.last
            && reading <= last
        {
            reading = last.saturating_add(1);
        }
        self.last = Some(reading);

        let wall = Utc::now();
        Stamp {
            arrival: ArrivalTime(reading),
            wall,
            display: format_display_time(wall, self.display_offset),
        }
    }
}

impl Default for ArrivalClock {
    fn default() -> Self {
        Self::new(utc())
    }
}

/// Render a wall-clock time as `HH:MM:SS.mmm` in the given offset.
pub fn format_display_time(wall: DateTime<Utc>, offset: FixedOffset) -> String {
    wall.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
}

/// Build a display offset from minutes east of UTC.
///
/// Returns `None` if the offset is outside +/- 24 hours.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn utc() -> FixedOffset {
    Utc.fix()
}
