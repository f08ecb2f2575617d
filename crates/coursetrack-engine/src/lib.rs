//! `CourseTrack` progression engine.
//!
//! The rules governing when a learner may access a lesson (drip scheduling),
//! how lesson and course completion propagate into enrollment state, and how
//! gamification state (points, streaks, badges, certificates) is derived from
//! learning events:
//! - [`drip`] -- pure lesson unlock calculation
//! - [`access`] -- active-enrollment + drip gate in front of lesson events
//! - [`progress`] -- watch-time ledger and completion propagation
//! - [`enrollment`] -- explicit enrollment state machine
//! - [`gamification`] -- streaks, points, badges, certificates, leaderboard
//! - [`quiz`] -- pure quiz grading and attempt recording
//! - [`storage`] -- `SQLite` persistence for all of the above

pub mod access;
pub mod content;
pub mod drip;
pub mod enrollment;
pub mod error;
pub mod gamification;
pub mod progress;
pub mod quiz;
pub mod storage;

pub use access::LessonAccess;
pub use content::{LessonContent, LessonKind, QuizQuestion};
pub use drip::DripPolicy;
pub use enrollment::{EnrollmentService, EnrollmentStatus, PaymentStatus};
pub use error::{EngineError, Result};
pub use gamification::{GamificationEngine, LeaderboardEntry, StatsSummary};
pub use progress::{CourseProgress, LessonCompletion, ProgressLedger};
pub use quiz::{QuizGrader, QuizResult, grade};
pub use storage::{Database, DatabaseError};
