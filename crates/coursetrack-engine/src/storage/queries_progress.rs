//! Lesson progress queries.
//!
//! The watch-time and completion paths are the two spots where concurrent
//! writers for the same (user, lesson) or (user, course) pair can collide,
//! so both run their read-modify-write sequences inside one transaction.

use super::db::{Database, DatabaseError};
use super::models::{LessonAccessRow, LessonProgress};

/// Inputs for the transactional lesson-completion path.
pub struct CompleteLessonParams<'a> {
    pub user_id: &'a str,
    pub lesson_id: &'a str,
    pub course_id: &'a str,
    pub now: i64,
    /// Points awarded on the false -> true completion transition.
    pub lesson_points: i64,
    /// Bonus awarded when this call completes the whole course.
    pub course_bonus: i64,
}

/// Result of the transactional lesson-completion path.
pub struct CompletionRecord {
    pub progress: LessonProgress,
    /// False when the lesson was already completed (idempotent repeat).
    pub newly_completed: bool,
    /// True when this call transitioned the enrollment to completed.
    pub course_completed: bool,
}

impl Database {
    /// Resolve the active enrollment covering a lesson, joined through
    /// module -> course, together with the lesson's drip columns.
    pub async fn lesson_access_row(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<Option<LessonAccessRow>, DatabaseError> {
        let row = sqlx::query_as::<_, LessonAccessRow>(
            "SELECT e.id AS enrollment_id, e.course_id, e.enrolled_at,
                    l.drip_kind, l.drip_days, l.drip_date
             FROM enrollments e
             JOIN modules m ON m.course_id = e.course_id
             JOIN lessons l ON l.module_id = m.id
             WHERE e.user_id = ? AND l.id = ? AND e.status = 'active'",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    /// Get the progress row for a (user, lesson) pair.
    pub async fn get_lesson_progress(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<Option<LessonProgress>, DatabaseError> {
        let row = sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    /// Record a watch-time report.
    ///
    /// The stored value only ever rises (`MAX(existing, incoming)`), and the
    /// lifetime watch-time counter accumulates just the minutes of the delta
    /// above the previous value, so re-reports of the same position add
    /// nothing. Runs in a transaction so concurrent reports cannot lose the
    /// higher value or double-count the delta.
    pub async fn record_watch_time(
        &self,
        user_id: &str,
        lesson_id: &str,
        watched_seconds: i64,
        report_points: i64,
    ) -> Result<LessonProgress, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let previous: i64 = sqlx::query_scalar(
            "SELECT watched_seconds FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

        sqlx::query(
            "INSERT INTO lesson_progress (user_id, lesson_id, watched_seconds)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id, lesson_id)
             DO UPDATE SET watched_seconds = MAX(lesson_progress.watched_seconds, excluded.watched_seconds)",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(watched_seconds)
        .execute(&mut *tx)
        .await?;

        let minutes_delta = (watched_seconds - previous).max(0) / 60;
        sqlx::query(
            "UPDATE user_stats
             SET total_watch_time = total_watch_time + ?, points = points + ?
             WHERE user_id = ?",
        )
        .bind(minutes_delta)
        .bind(report_points)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Mark a lesson completed and propagate course completion.
    ///
    /// One transaction covers the completion mark, the count comparison, and
    /// the conditional enrollment flip: when two concurrent calls finish the
    /// last two lessons of a course, the status filter on the UPDATE lets
    /// exactly one of them win the transition and the bonus.
    pub async fn complete_lesson(
        &self,
        params: &CompleteLessonParams<'_>,
    ) -> Result<CompletionRecord, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let already: Option<i64> = sqlx::query_scalar(
            "SELECT completed FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(params.user_id)
        .bind(params.lesson_id)
        .fetch_optional(&mut *tx)
        .await?;

        if already == Some(1) {
            let progress = sqlx::query_as::<_, LessonProgress>(
                "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
            )
            .bind(params.user_id)
            .bind(params.lesson_id)
            .fetch_one(&mut *tx)
            .await?;

            return Ok(CompletionRecord {
                progress,
                newly_completed: false,
                course_completed: false,
            });
        }

        sqlx::query(
            "INSERT INTO lesson_progress (user_id, lesson_id, completed, completed_at)
             VALUES (?, ?, 1, ?)
             ON CONFLICT(user_id, lesson_id)
             DO UPDATE SET completed = 1, completed_at = excluded.completed_at",
        )
        .bind(params.user_id)
        .bind(params.lesson_id)
        .bind(params.now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE user_stats SET points = points + ? WHERE user_id = ?")
            .bind(params.lesson_points)
            .bind(params.user_id)
            .execute(&mut *tx)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons l
             JOIN modules m ON l.module_id = m.id
             WHERE m.course_id = ?",
        )
        .bind(params.course_id)
        .fetch_one(&mut *tx)
        .await?;

        let completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress lp
             JOIN lessons l ON lp.lesson_id = l.id
             JOIN modules m ON l.module_id = m.id
             WHERE lp.user_id = ? AND m.course_id = ? AND lp.completed = 1",
        )
        .bind(params.user_id)
        .bind(params.course_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut course_completed = false;
        if total > 0 && completed >= total {
            let result = sqlx::query(
                "UPDATE enrollments SET status = 'completed', completed_at = ?
                 WHERE user_id = ? AND course_id = ? AND status = 'active'",
            )
            .bind(params.now)
            .bind(params.user_id)
            .bind(params.course_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                sqlx::query("UPDATE user_stats SET points = points + ? WHERE user_id = ?")
                    .bind(params.course_bonus)
                    .bind(params.user_id)
                    .execute(&mut *tx)
                    .await?;
                course_completed = true;
            }
        }

        let progress = sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(params.user_id)
        .bind(params.lesson_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CompletionRecord {
            progress,
            newly_completed: true,
            course_completed,
        })
    }

    /// Count (total, completed) lessons for a user's course.
    pub async fn course_lesson_counts(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<(i64, i64), DatabaseError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons l
             JOIN modules m ON l.module_id = m.id
             WHERE m.course_id = ?",
        )
        .bind(course_id)
        .fetch_one(self.pool())
        .await?;

        let completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress lp
             JOIN lessons l ON lp.lesson_id = l.id
             JOIN modules m ON l.module_id = m.id
             WHERE lp.user_id = ? AND m.course_id = ? AND lp.completed = 1",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(self.pool())
        .await?;

        Ok((total, completed))
    }

    /// Every progress row this user has in the course, in lesson order.
    pub async fn lesson_progress_for_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<LessonProgress>, DatabaseError> {
        let rows = sqlx::query_as::<_, LessonProgress>(
            "SELECT lp.* FROM lesson_progress lp
             JOIN lessons l ON lp.lesson_id = l.id
             JOIN modules m ON l.module_id = m.id
             WHERE lp.user_id = ? AND m.course_id = ?
             ORDER BY m.position, l.position",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Cache the derived completion percentage on the enrollment row.
    pub async fn cache_course_progress(
        &self,
        user_id: &str,
        course_id: &str,
        percent: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE enrollments SET progress = ? WHERE user_id = ? AND course_id = ?")
            .bind(percent)
            .bind(user_id)
            .bind(course_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Record a quiz attempt, overwriting any previous attempt for the pair.
    pub async fn record_quiz_attempt(
        &self,
        user_id: &str,
        lesson_id: &str,
        score: f64,
        passed: bool,
        now: i64,
    ) -> Result<LessonProgress, DatabaseError> {
        let completed_at = passed.then_some(now);

        sqlx::query(
            "INSERT INTO lesson_progress (user_id, lesson_id, quiz_score, completed, completed_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, lesson_id)
             DO UPDATE SET quiz_score = excluded.quiz_score,
                           completed = excluded.completed,
                           completed_at = excluded.completed_at",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(score)
        .bind(i64::from(passed))
        .bind(completed_at)
        .execute(self.pool())
        .await?;

        let row = sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row)
    }
}
