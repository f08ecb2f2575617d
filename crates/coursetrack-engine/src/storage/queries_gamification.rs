//! Gamification queries: stats, streaks, badges, certificates, leaderboard.

use super::db::{Database, DatabaseError};
use super::models::{Badge, Certificate, EarnedBadge, LeaderboardRow, UserStats};

impl Database {
    /// Get the stats row for a user.
    pub async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, DatabaseError> {
        let stats = sqlx::query_as::<_, UserStats>("SELECT * FROM user_stats WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(stats)
    }

    /// Apply the daily-activity rule in one atomic UPDATE.
    ///
    /// Streak: +1 when the last activity was yesterday, unchanged when it was
    /// already today, otherwise reset to 1 (including the first-ever
    /// activity). Longest streak tracks the maximum. The first-activity
    /// bonus is added only when the last activity predates today.
    ///
    /// `today`/`yesterday` are ISO-8601 dates, which compare correctly as
    /// strings. Returns `None` when the user has no stats row.
    pub async fn record_daily_activity(
        &self,
        user_id: &str,
        today: &str,
        yesterday: &str,
        first_activity_points: i64,
    ) -> Result<Option<UserStats>, DatabaseError> {
        let result = sqlx::query(
            "UPDATE user_stats SET
                 current_streak = CASE
                     WHEN last_activity_date = ? THEN current_streak + 1
                     WHEN last_activity_date = ? THEN current_streak
                     ELSE 1
                 END,
                 longest_streak = MAX(longest_streak, CASE
                     WHEN last_activity_date = ? THEN current_streak + 1
                     WHEN last_activity_date = ? THEN current_streak
                     ELSE 1
                 END),
                 points = points + CASE
                     WHEN last_activity_date IS NULL OR last_activity_date < ? THEN ?
                     ELSE 0
                 END,
                 last_activity_date = ?
             WHERE user_id = ?",
        )
        .bind(yesterday)
        .bind(today)
        .bind(yesterday)
        .bind(today)
        .bind(today)
        .bind(first_activity_points)
        .bind(today)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_user_stats(user_id).await
    }

    /// The highest-requirement streak badge at or below the given milestone.
    pub async fn find_streak_badge(
        &self,
        milestone: i64,
    ) -> Result<Option<Badge>, DatabaseError> {
        let badge = sqlx::query_as::<_, Badge>(
            "SELECT * FROM badges WHERE kind = 'streak' AND requirement <= ?
             ORDER BY requirement DESC LIMIT 1",
        )
        .bind(milestone)
        .fetch_optional(self.pool())
        .await?;

        Ok(badge)
    }

    /// Completion badges unlocked by the given completed-course count.
    pub async fn find_completion_badges(
        &self,
        completed_courses: i64,
    ) -> Result<Vec<Badge>, DatabaseError> {
        let badges = sqlx::query_as::<_, Badge>(
            "SELECT * FROM badges WHERE kind = 'completion' AND requirement <= ?
             ORDER BY requirement",
        )
        .bind(completed_courses)
        .fetch_all(self.pool())
        .await?;

        Ok(badges)
    }

    /// Award a badge, insert-if-absent. Returns whether the award was new;
    /// concurrent attempts neither error nor duplicate.
    pub async fn award_badge(
        &self,
        user_id: &str,
        badge_id: &str,
        earned_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(earned_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Badges a user has earned, most recent first.
    pub async fn badges_for(&self, user_id: &str) -> Result<Vec<EarnedBadge>, DatabaseError> {
        let badges = sqlx::query_as::<_, EarnedBadge>(
            "SELECT b.id, b.name, b.description, b.kind, b.requirement, ub.earned_at
             FROM user_badges ub
             JOIN badges b ON ub.badge_id = b.id
             WHERE ub.user_id = ?
             ORDER BY ub.earned_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(badges)
    }

    /// The full badge catalog.
    pub async fn badge_catalog(&self) -> Result<Vec<Badge>, DatabaseError> {
        let badges =
            sqlx::query_as::<_, Badge>("SELECT * FROM badges ORDER BY kind, requirement")
                .fetch_all(self.pool())
                .await?;

        Ok(badges)
    }

    /// Insert a certificate. Propagates `Conflict` when the (user, course)
    /// pair already holds one; that constraint is what serializes racing
    /// claims down to a single winner.
    pub async fn create_certificate(
        &self,
        id: &str,
        user_id: &str,
        course_id: &str,
        certificate_number: &str,
        issued_at: i64,
    ) -> Result<Certificate, DatabaseError> {
        sqlx::query(
            "INSERT INTO certificates (id, user_id, course_id, certificate_number, issued_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(course_id)
        .bind(certificate_number)
        .bind(issued_at)
        .execute(self.pool())
        .await?;

        self.get_certificate(user_id, course_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Certificate {id}")))
    }

    /// The certificate for a (user, course) pair, if issued.
    pub async fn get_certificate(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let cert = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(cert)
    }

    /// Certificates a user has earned, most recent first.
    pub async fn certificates_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<Certificate>, DatabaseError> {
        let certs = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE user_id = ? ORDER BY issued_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(certs)
    }

    /// Top students by points, descending.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT u.id AS user_id, u.name, s.points, s.current_streak,
                    (SELECT COUNT(*) FROM certificates c WHERE c.user_id = u.id) AS certificates
             FROM users u
             JOIN user_stats s ON s.user_id = u.id
             WHERE u.role = 'student'
             ORDER BY s.points DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Summary counts
    // =========================================================================

    /// Enrollments that were not cancelled.
    pub async fn count_enrollments(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE user_id = ? AND status != 'cancelled'",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }

    /// Courses this user has completed.
    pub async fn count_completed_courses(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE user_id = ? AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }

    /// Badges this user has earned.
    pub async fn count_badges(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_badges WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    /// Certificates this user holds.
    pub async fn count_certificates(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }
}
