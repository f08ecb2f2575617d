//! Gamification: streaks, points, badges, certificates, leaderboard.

use std::sync::Arc;

use chrono::Days;
use tracing::{debug, info};
use uuid::Uuid;

use coursetrack_core::db::DatabaseError;
use coursetrack_core::{Clock, Rules};

use crate::enrollment::EnrollmentStatus;
use crate::error::{EngineError, Result};
use crate::storage::{Badge, Certificate, Database, EarnedBadge, UserStats};

/// A leaderboard entry with its 1-based position.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    pub points: i64,
    pub current_streak: i64,
    pub certificates: i64,
}

/// Aggregated gamification state for one user.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSummary {
    pub courses_enrolled: i64,
    pub courses_completed: i64,
    pub total_watch_time: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub badges: i64,
    pub certificates: i64,
    pub points: i64,
}

/// Derives points, streaks, badges, and certificates from learning events.
#[derive(Clone)]
pub struct GamificationEngine {
    db: Database,
    clock: Arc<dyn Clock>,
    rules: Rules,
}

impl GamificationEngine {
    pub fn new(db: Database, clock: Arc<dyn Clock>, rules: Rules) -> Self {
        Self { db, clock, rules }
    }

    /// Register activity for the current calendar day and update the streak.
    ///
    /// Called on daily login and by every watch/complete event. Consecutive
    /// days extend the streak, a same-day repeat is a no-op, and a gap
    /// resets to 1. The first activity of a day also earns the daily bonus.
    /// Newly reached streak milestones are checked for badges.
    pub async fn record_daily_activity(&self, user_id: &str) -> Result<UserStats> {
        let today = self.clock.today();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        let stats = self
            .db
            .record_daily_activity(
                user_id,
                &today.to_string(),
                &yesterday.to_string(),
                self.rules.daily_activity_points,
            )
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Stats for user {user_id}")))?;

        debug!(
            user_id,
            current_streak = stats.current_streak,
            points = stats.points,
            "Daily activity recorded"
        );

        self.check_streak_badges(user_id, stats.current_streak)
            .await?;

        Ok(stats)
    }

    /// Award streak badges for every milestone the streak has reached.
    ///
    /// For each milestone, the highest-requirement streak badge at or below
    /// it is awarded insert-if-absent, so re-checks and concurrent checks
    /// stay idempotent.
    pub async fn check_streak_badges(
        &self,
        user_id: &str,
        current_streak: i64,
    ) -> Result<Vec<Badge>> {
        let now = self.clock.now().timestamp();
        let mut awarded = Vec::new();

        for &milestone in &self.rules.streak_milestones {
            if current_streak < milestone {
                continue;
            }
            let Some(badge) = self.db.find_streak_badge(milestone).await? else {
                continue;
            };
            if self.db.award_badge(user_id, &badge.id, now).await? {
                info!(user_id, badge = %badge.name, "Streak badge awarded");
                awarded.push(badge);
            }
        }

        Ok(awarded)
    }

    /// Hook run when an enrollment reaches `completed`: award any completion
    /// badges unlocked by the user's completed-course count.
    pub(crate) async fn on_course_completed(&self, user_id: &str) -> Result<()> {
        let completed = self.db.count_completed_courses(user_id).await?;
        let now = self.clock.now().timestamp();

        for badge in self.db.find_completion_badges(completed).await? {
            if self.db.award_badge(user_id, &badge.id, now).await? {
                info!(user_id, badge = %badge.name, "Completion badge awarded");
            }
        }

        Ok(())
    }

    /// Issue the certificate for a completed course.
    ///
    /// The (user, course) uniqueness constraint backs the race: when two
    /// claims both see "not yet claimed", the insert decides the winner and
    /// the loser surfaces `AlreadyClaimed`.
    pub async fn claim_certificate(&self, user_id: &str, course_id: &str) -> Result<Certificate> {
        let enrollment = self
            .db
            .enrollment_for(user_id, course_id)
            .await?
            .ok_or(EngineError::NotCompleted)?;
        if EnrollmentStatus::parse(&enrollment.status) != Some(EnrollmentStatus::Completed) {
            return Err(EngineError::NotCompleted);
        }

        if self.db.get_certificate(user_id, course_id).await?.is_some() {
            return Err(EngineError::AlreadyClaimed);
        }

        let now = self.clock.now();
        let number = certificate_number(now.timestamp_millis());
        let id = Uuid::new_v4().to_string();

        let cert = self
            .db
            .create_certificate(&id, user_id, course_id, &number, now.timestamp())
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => EngineError::AlreadyClaimed,
                other => other.into(),
            })?;

        info!(user_id, course_id, number = %cert.certificate_number, "Certificate issued");

        Ok(cert)
    }

    /// Top students by points, annotated with 1-based ranks. Ties keep the
    /// query's stable order rather than sharing a rank.
    pub async fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.unwrap_or(self.rules.leaderboard_limit);
        let rows = self.db.leaderboard(limit).await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| LeaderboardEntry {
                rank: i + 1,
                user_id: row.user_id,
                name: row.name,
                points: row.points,
                current_streak: row.current_streak,
                certificates: row.certificates,
            })
            .collect())
    }

    /// Aggregated gamification state for one user.
    pub async fn stats_summary(&self, user_id: &str) -> Result<StatsSummary> {
        let stats = self
            .db
            .get_user_stats(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Stats for user {user_id}")))?;

        Ok(StatsSummary {
            courses_enrolled: self.db.count_enrollments(user_id).await?,
            courses_completed: self.db.count_completed_courses(user_id).await?,
            total_watch_time: stats.total_watch_time,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            badges: self.db.count_badges(user_id).await?,
            certificates: self.db.count_certificates(user_id).await?,
            points: stats.points,
        })
    }

    /// Badges a user has earned, most recent first.
    pub async fn badges_for(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        Ok(self.db.badges_for(user_id).await?)
    }

    /// Certificates a user holds, most recent first.
    pub async fn certificates_for(&self, user_id: &str) -> Result<Vec<Certificate>> {
        Ok(self.db.certificates_for(user_id).await?)
    }

    /// The full badge catalog.
    pub async fn badge_catalog(&self) -> Result<Vec<Badge>> {
        Ok(self.db.badge_catalog().await?)
    }
}

/// Display format: time-based prefix plus a short random suffix.
fn certificate_number(epoch_millis: i64) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("CERT-{epoch_millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_number_format() {
        let number = certificate_number(1_700_000_000_123);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CERT");
        assert_eq!(parts[1], "1700000000123");
        assert_eq!(parts[2].len(), 8);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn certificate_numbers_are_unique() {
        let a = certificate_number(1_700_000_000_000);
        let b = certificate_number(1_700_000_000_000);
        assert_ne!(a, b);
    }
}
