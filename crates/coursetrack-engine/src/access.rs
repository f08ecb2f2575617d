//! Lesson access gate.
//!
//! Every lesson event (watch report, completion, quiz submission) passes
//! through here first: the learner needs an active enrollment covering the
//! lesson's course, and the lesson's drip schedule must have opened.

use chrono::{DateTime, Utc};

use crate::drip::DripPolicy;
use crate::error::{EngineError, Result};
use crate::storage::Database;

/// Proof that a learner may touch a lesson right now.
#[derive(Debug, Clone)]
pub struct LessonAccess {
    pub enrollment_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
    pub drip: DripPolicy,
}

/// Resolve and check access for a (user, lesson) pair at `now`.
///
/// `AccessDenied` when no active enrollment covers the lesson;
/// `LessonLocked` (with the unlock date when one is known) when the drip
/// schedule has not opened it yet. Malformed drip rows stay locked.
pub async fn lesson_access(
    db: &Database,
    user_id: &str,
    lesson_id: &str,
    now: DateTime<Utc>,
) -> Result<LessonAccess> {
    let row = db
        .lesson_access_row(user_id, lesson_id)
        .await?
        .ok_or(EngineError::AccessDenied)?;

    let enrolled_at =
        DateTime::from_timestamp(row.enrolled_at, 0).ok_or(EngineError::AccessDenied)?;
    let drip = DripPolicy::parse(&row.drip_kind, row.drip_days, row.drip_date);

    if !drip.is_unlocked(enrolled_at, now) {
        return Err(EngineError::LessonLocked {
            unlocks_on: drip.unlock_date(enrolled_at),
        });
    }

    Ok(LessonAccess {
        enrollment_id: row.enrollment_id,
        course_id: row.course_id,
        enrolled_at,
        drip,
    })
}
