use crate::clock::Timestamp;
use chrono::{Duration, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OperatingHours
// ---------------------------------------------------------------------------

/// Daily window, half-open `[start_hour, end_hour)` on the local clock.
///
/// `end_hour` may be `24` to mean midnight. A window with
/// `start_hour > end_hour` wraps past midnight (e.g. 18 → 2), and
/// `start_hour == end_hour` never admits anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 24,
        }
    }
}

impl OperatingHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        let (start, end) = (self.start_hour, self.end_hour);
        if start == end {
            false
        } else if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_hour == self.end_hour
    }

    /// The next closing boundary strictly after `now`.
    pub fn next_end_after(&self, now: Timestamp) -> Timestamp {
        let boundary_hour = self.end_hour % 24;
        let at = NaiveTime::from_hms_opt(boundary_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let today = now.date_naive().and_time(at);
        let candidate = now
            .offset()
            .from_local_datetime(&today)
            .single()
            .unwrap_or(now);
        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(1)
        }
    }

    /// Human label, e.g. `7:00 AM - 12:00 AM`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            twelve_hour(self.start_hour),
            twelve_hour(self.end_hour)
        )
    }
}

fn twelve_hour(hour: u32) -> String {
    let h = hour % 24;
    let suffix = if h < 12 { "AM" } else { "PM" };
    let display = match h % 12 {
        0 => 12,
        n => n,
    };
    format!("{display}:00 {suffix}")
}

/// Whether `now` falls inside `window`.
pub fn is_within_operating_hours(now: Timestamp, window: &OperatingHours) -> bool {
    window.contains_hour(now.hour())
}

/// When the sweep for `window` should next run.
pub fn next_window_end(now: Timestamp, window: &OperatingHours) -> Timestamp {
    window.next_end_after(now)
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// The operating-hours predicate every state-changing citizen operation
/// consults. `force_open` is the testing override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub window: OperatingHours,
    pub force_open: bool,
}

impl Gate {
    pub fn new(window: OperatingHours, force_open: bool) -> Self {
        Self { window, force_open }
    }

    pub fn is_open(&self, now: Timestamp) -> bool {
        self.force_open || is_within_operating_hours(now, &self.window)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
