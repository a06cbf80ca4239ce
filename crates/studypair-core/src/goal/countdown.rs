//! Remaining-time breakdown for a target timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Whole days plus the hour/minute/second remainder (hours are 0..=23).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remaining {
    pub days: u64,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub is_expired: bool,
}

impl Remaining {
    pub const EXPIRED: Remaining = Remaining {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        is_expired: true,
    };

    pub fn total_seconds(&self) -> u64 {
        self.days * 86_400
            + u64::from(self.hours) * 3_600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }

    /// `D-3 04:05:06`, or `D-Day passed` once expired.
    pub fn format_compact(&self) -> String {
        if self.is_expired {
            return "D-Day passed".to_string();
        }
        format!(
            "D-{} {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Break `target - now` into days/hours/minutes/seconds.
///
/// A target at or before `now` (including a clock that jumped past it) is
/// reported as expired with every field zero.
pub fn compute_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let diff = (target - now).num_milliseconds();
    if diff <= 0 {
        return Remaining::EXPIRED;
    }

    let days = diff / MS_PER_DAY;
    let rest = diff % MS_PER_DAY;
    let hours = rest / MS_PER_HOUR;
    let rest = rest % MS_PER_HOUR;
    let minutes = rest / MS_PER_MINUTE;
    let rest = rest % MS_PER_MINUTE;
    let seconds = rest / MS_PER_SECOND;

    Remaining {
        days: days as u64,
        hours: hours as u32,
        minutes: minutes as u32,
        seconds: seconds as u32,
        is_expired: false,
    }
}
