//! Database models for the `CourseTrack` engine.
//!
//! Plain records mirroring the persisted columns. Status and kind columns
//! stay `String` here; the engine parses them into typed enums at its own
//! boundary. Booleans are stored as 0/1 integers.

use serde::{Deserialize, Serialize};

/// User record. Owned by the surrounding platform; the engine reads it for
/// leaderboards and creates the companion stats row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: String,
    pub created_at: i64,
}

/// Course record from the catalog boundary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub status: String,
    pub created_at: i64,
}

/// Module record from the catalog boundary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseModule {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub position: i64,
}

/// Lesson record from the catalog boundary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub kind: String,
    pub content: Option<String>,
    pub position: i64,
    pub duration_minutes: i64,
    pub is_free: i64,
    pub drip_kind: String,
    pub drip_days: Option<i64>,
    pub drip_date: Option<i64>,
}

/// Enrollment record tying a learner to a course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: String,
    pub payment_status: String,
    pub progress: i64,
    pub enrolled_at: i64,
    pub completed_at: Option<i64>,
    pub expires_at: Option<i64>,
}

/// Per-(user, lesson) progress record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonProgress {
    pub user_id: String,
    pub lesson_id: String,
    pub completed: i64,
    pub watched_seconds: i64,
    pub quiz_score: Option<f64>,
    pub completed_at: Option<i64>,
}

/// Per-user gamification counters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserStats {
    pub user_id: String,
    pub total_watch_time: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub points: i64,
    pub last_activity_date: Option<String>,
}

/// Badge catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub requirement: i64,
}

/// A badge earned by a user, joined with its catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EarnedBadge {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub requirement: i64,
    pub earned_at: i64,
}

/// Certificate issued for a completed course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub certificate_number: String,
    pub issued_at: i64,
}

/// Join row backing the lesson access gate: the learner's active enrollment
/// plus the lesson's raw drip columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LessonAccessRow {
    pub enrollment_id: String,
    pub course_id: String,
    pub enrolled_at: i64,
    pub drip_kind: String,
    pub drip_days: Option<i64>,
    pub drip_date: Option<i64>,
}

/// Leaderboard row before rank annotation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub name: String,
    pub points: i64,
    pub current_streak: i64,
    pub certificates: i64,
}
