//! `SQLite` storage for the `CourseTrack` engine.
//!
//! Provides persistence for the catalog boundary (users, courses, modules,
//! lessons, badges) and the engine-owned state (enrollments, lesson progress,
//! user stats, user badges, certificates).

mod db;
mod models;
mod queries;
mod queries_gamification;
mod queries_progress;


pub use db::{Database, DatabaseError};
pub use models::*;
pub use queries::{EnrollmentParams, LessonParams};
pub use queries_progress::{CompleteLessonParams, CompletionRecord};
