//! Injectable time source.
//!
//! Drip unlocking and streak accounting are calendar-day sensitive, so every
//! engine component reads time through a `Clock` rather than calling
//! `Utc::now()` directly. Tests drive day boundaries with `FixedClock`.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};

/// Time source abstraction.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar day (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock with second precision, for tests.
#[derive(Debug)]
pub struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    /// Pin the clock at the given instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            secs: AtomicI64::new(now.timestamp()),
        }
    }

    /// Jump to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        self.secs.store(now.timestamp(), Ordering::SeqCst);
    }

    /// Move forward (or back) by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Move forward (or back) by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance_secs(days * 86_400);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances_by_days() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();
        let clock = FixedClock::at(start);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        clock.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert_eq!(clock.now().timestamp(), start.timestamp() + 2 * 86_400);
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = Utc::now().timestamp();
        let now = SystemClock.now().timestamp();
        assert!(now >= before);
    }
}
