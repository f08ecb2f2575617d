//! Error types for the `CourseTrack` engine.

use chrono::NaiveDate;
use thiserror::Error;

use coursetrack_core::db::DatabaseError;

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Expected, recoverable conditions surfaced to callers as typed errors.
///
/// Everything except `Database` is a business outcome the caller is meant to
/// handle (render, retry at its own policy, or report to the learner).
#[derive(Debug, Error)]
pub enum EngineError {
    /// No active enrollment covers the lesson or course.
    #[error("no active enrollment for this lesson or course")]
    AccessDenied,

    /// Enrollment is active but the drip schedule has not opened the lesson.
    /// Carries the unlock date so callers can show "unlocks in N days".
    #[error("lesson is not yet unlocked")]
    LessonLocked { unlocks_on: Option<NaiveDate> },

    /// Certificate claim before the course is completed.
    #[error("course is not completed")]
    NotCompleted,

    /// Certificate already exists for this user and course.
    #[error("certificate already claimed")]
    AlreadyClaimed,

    /// Enrollment already exists for this user and course.
    #[error("already enrolled in this course")]
    AlreadyEnrolled,

    /// Requested enrollment status change is not a legal edge.
    #[error("invalid enrollment transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Lesson content payload is missing or malformed for its kind.
    #[error("invalid lesson content: {0}")]
    InvalidContent(String),

    /// Infrastructure failure; not retried by the engine.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
