//! Wall-clock time source.
//!
//! Every duration computed by the core is derived from a [`Clock`], so tests
//! can substitute a [`ManualClock`] and step time deterministically.

use std::cell::Cell;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The caller's calendar day.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// `today()` is the calendar day at a fixed offset (UTC unless set), so
/// results don't depend on the host timezone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
            offset: Utc.fix(),
        }
    }

    /// Report `today()` as seen from `offset` instead of UTC.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().with_timezone(&self.offset).date_naive()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance_secs(90);
        assert_eq!(clock.now(), start + Duration::seconds(90));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[test]
    fn offset_shifts_the_calendar_day() {
        // 03:00 UTC is still the previous evening at UTC-7.
        let at = Utc.with_ymd_and_hms(2025, 3, 11, 3, 0, 0).unwrap();
        let west = ManualClock::new(at).with_offset(FixedOffset::west_opt(7 * 3600).unwrap());
        assert_eq!(west.today(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(ManualClock::new(at).today(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    }
}
