//! Drip scheduling: when a lesson becomes visible to an enrolled learner.
//!
//! Pure calendar arithmetic, no side effects. Unlocking is date-granular:
//! a lesson whose unlock date is today counts as unlocked, regardless of the
//! time of day the learner enrolled.

use chrono::{DateTime, Days, NaiveDate, Utc};

/// A lesson's release policy, parsed from its persisted drip columns.
///
/// Rows that fail validation (unknown kind, `days_after_enrollment` without
/// a day count, `fixed_date` without a date) parse to [`DripPolicy::Locked`]:
/// a gate must fail closed, never open or crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DripPolicy {
    /// Available from the moment of enrollment.
    Immediate,
    /// Opens `days` calendar days after the enrollment date.
    DaysAfterEnrollment { days: i64 },
    /// Opens on a fixed calendar date, independent of enrollment.
    FixedDate { date: DateTime<Utc> },
    /// Malformed or unknown policy; never unlocks.
    Locked,
}

impl DripPolicy {
    /// Validate raw drip columns into a policy.
    pub fn parse(kind: &str, days: Option<i64>, date_secs: Option<i64>) -> Self {
        match kind {
            "immediate" => Self::Immediate,
            "days_after_enrollment" => match days {
                Some(d) if d >= 0 => Self::DaysAfterEnrollment { days: d },
                _ => Self::Locked,
            },
            "fixed_date" => match date_secs.and_then(|s| DateTime::from_timestamp(s, 0)) {
                Some(date) => Self::FixedDate { date },
                None => Self::Locked,
            },
            _ => Self::Locked,
        }
    }

    /// Whether the lesson is open at `now` for an enrollment started at
    /// `enrolled_at`. Same-day unlock counts as unlocked.
    pub fn is_unlocked(&self, enrolled_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Immediate => true,
            Self::Locked => false,
            Self::DaysAfterEnrollment { .. } | Self::FixedDate { .. } => self
                .unlock_date(enrolled_at)
                .is_some_and(|unlock| now.date_naive() >= unlock),
        }
    }

    /// The calendar day the lesson opens, for "unlocks in N days" display.
    /// `None` for `Immediate` (already open) and `Locked` (never opens).
    pub fn unlock_date(&self, enrolled_at: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            Self::Immediate | Self::Locked => None,
            Self::DaysAfterEnrollment { days } => u64::try_from(*days)
                .ok()
                .and_then(|d| enrolled_at.date_naive().checked_add_days(Days::new(d))),
            Self::FixedDate { date } => Some(date.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn immediate_is_always_unlocked() {
        let policy = DripPolicy::parse("immediate", None, None);
        assert_eq!(policy, DripPolicy::Immediate);
        assert!(policy.is_unlocked(at(2030, 1, 1, 0), at(2020, 1, 1, 0)));
        assert!(policy.is_unlocked(at(2020, 1, 1, 0), at(2030, 1, 1, 0)));
        assert_eq!(policy.unlock_date(at(2025, 5, 1, 9)), None);
    }

    #[test]
    fn days_after_enrollment_respects_boundary() {
        let policy = DripPolicy::parse("days_after_enrollment", Some(7), None);
        let enrolled = at(2025, 3, 1, 18);

        assert!(!policy.is_unlocked(enrolled, at(2025, 3, 7, 23)));
        // Same calendar day as the unlock date counts, even early morning.
        assert!(policy.is_unlocked(enrolled, at(2025, 3, 8, 0)));
        assert!(policy.is_unlocked(enrolled, at(2025, 4, 1, 12)));
        assert_eq!(
            policy.unlock_date(enrolled),
            NaiveDate::from_ymd_opt(2025, 3, 8)
        );
    }

    #[test]
    fn zero_day_drip_unlocks_on_enrollment_day() {
        let policy = DripPolicy::parse("days_after_enrollment", Some(0), None);
        let enrolled = at(2025, 3, 1, 18);
        assert!(policy.is_unlocked(enrolled, at(2025, 3, 1, 19)));
    }

    #[test]
    fn fixed_date_respects_boundary() {
        let release = at(2025, 6, 15, 8);
        let policy = DripPolicy::parse("fixed_date", None, Some(release.timestamp()));

        assert!(!policy.is_unlocked(at(2025, 1, 1, 0), at(2025, 6, 14, 23)));
        assert!(policy.is_unlocked(at(2025, 1, 1, 0), at(2025, 6, 15, 0)));
        assert_eq!(
            policy.unlock_date(at(2025, 1, 1, 0)),
            NaiveDate::from_ymd_opt(2025, 6, 15)
        );
    }

    #[test]
    fn enrollment_date_is_irrelevant_for_fixed_date() {
        let release = at(2025, 6, 15, 8);
        let policy = DripPolicy::parse("fixed_date", None, Some(release.timestamp()));
        let now = at(2025, 7, 1, 0);
        assert!(policy.is_unlocked(at(2020, 1, 1, 0), now));
        assert!(policy.is_unlocked(at(2025, 6, 30, 0), now));
    }

    #[test]
    fn malformed_policies_fail_closed() {
        let cases = [
            DripPolicy::parse("days_after_enrollment", None, None),
            DripPolicy::parse("days_after_enrollment", Some(-3), None),
            DripPolicy::parse("fixed_date", None, None),
            DripPolicy::parse("lunar_cycle", Some(7), None),
            DripPolicy::parse("", None, None),
        ];
        for policy in cases {
            assert_eq!(policy, DripPolicy::Locked);
            assert!(!policy.is_unlocked(at(2020, 1, 1, 0), at(2030, 1, 1, 0)));
            assert_eq!(policy.unlock_date(at(2020, 1, 1, 0)), None);
        }
    }
}
