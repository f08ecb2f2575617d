//! Progress ledger: watch time, lesson completion, course progress.

use std::sync::Arc;

use tracing::{debug, info};

use coursetrack_core::{Clock, Rules};

use crate::access::lesson_access;
use crate::enrollment::EnrollmentStatus;
use crate::error::{EngineError, Result};
use crate::gamification::GamificationEngine;
use crate::storage::{CompleteLessonParams, Database, LessonProgress};

/// Result of a lesson completion.
#[derive(Debug, Clone)]
pub struct LessonCompletion {
    pub progress: LessonProgress,
    /// True when this call completed the whole course.
    pub course_completed: bool,
}

/// A user's progress through one course.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CourseProgress {
    pub course_id: String,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub progress_percent: i64,
    pub enrolled_at: i64,
    pub lessons: Vec<LessonProgress>,
}

/// Tracks per-lesson watch time and completion, and propagates course
/// completion into enrollment state. Every operation is gated on an active
/// enrollment and an open drip schedule.
#[derive(Clone)]
pub struct ProgressLedger {
    db: Database,
    clock: Arc<dyn Clock>,
    rules: Rules,
    gamification: GamificationEngine,
}

impl ProgressLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>, rules: Rules) -> Self {
        let gamification = GamificationEngine::new(db.clone(), clock.clone(), rules.clone());
        Self {
            db,
            clock,
            rules,
            gamification,
        }
    }

    /// Record a watch-time report for a lesson.
    ///
    /// `watched_seconds` is the learner's furthest position, so the stored
    /// value only rises; lifetime watch time accumulates only the delta
    /// above the previous report. Awards the per-report point and registers
    /// daily activity.
    pub async fn report_watch_time(
        &self,
        user_id: &str,
        lesson_id: &str,
        watched_seconds: u32,
    ) -> Result<LessonProgress> {
        lesson_access(&self.db, user_id, lesson_id, self.clock.now()).await?;

        let progress = self
            .db
            .record_watch_time(
                user_id,
                lesson_id,
                i64::from(watched_seconds),
                self.rules.watch_report_points,
            )
            .await?;

        debug!(
            user_id,
            lesson_id,
            watched_seconds = progress.watched_seconds,
            "Watch time recorded"
        );

        self.gamification.record_daily_activity(user_id).await?;

        Ok(progress)
    }

    /// Mark a lesson completed, idempotently, and propagate course
    /// completion into the enrollment when this was the last lesson.
    ///
    /// Points are only awarded on the first completion; repeats leave the
    /// row and the point total untouched.
    pub async fn complete_lesson(&self, user_id: &str, lesson_id: &str) -> Result<LessonCompletion> {
        let access = lesson_access(&self.db, user_id, lesson_id, self.clock.now()).await?;

        let record = self
            .db
            .complete_lesson(&CompleteLessonParams {
                user_id,
                lesson_id,
                course_id: &access.course_id,
                now: self.clock.now().timestamp(),
                lesson_points: self.rules.lesson_completion_points,
                course_bonus: self.rules.course_completion_bonus,
            })
            .await?;

        if record.newly_completed {
            debug!(user_id, lesson_id, "Lesson completed");
        }
        if record.course_completed {
            info!(user_id, course_id = %access.course_id, "Course completed");
            self.gamification.on_course_completed(user_id).await?;
        }

        self.gamification.record_daily_activity(user_id).await?;

        Ok(LessonCompletion {
            progress: record.progress,
            course_completed: record.course_completed,
        })
    }

    /// Compute a user's progress through a course and refresh the cached
    /// percentage on the enrollment row.
    pub async fn course_progress(&self, user_id: &str, course_id: &str) -> Result<CourseProgress> {
        let enrollment = self
            .db
            .enrollment_for(user_id, course_id)
            .await?
            .ok_or(EngineError::AccessDenied)?;
        if EnrollmentStatus::parse(&enrollment.status) != Some(EnrollmentStatus::Active) {
            return Err(EngineError::AccessDenied);
        }

        let (total, completed) = self.db.course_lesson_counts(user_id, course_id).await?;
        let percent = progress_percent(completed, total);
        self.db
            .cache_course_progress(user_id, course_id, percent)
            .await?;

        let lessons = self.db.lesson_progress_for_course(user_id, course_id).await?;

        Ok(CourseProgress {
            course_id: course_id.to_string(),
            total_lessons: total,
            completed_lessons: completed,
            progress_percent: percent,
            enrolled_at: enrollment.enrolled_at,
            lessons,
        })
    }
}

/// Completion percentage, rounded to the nearest integer; 0 for an empty
/// course.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn progress_percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i64
}
