//! Gamification and grading rule configuration.
//!
//! The engine never hard-codes point values or thresholds; deployments tune
//! them through a JSON rules file resolved at startup, falling back to the
//! built-in defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Point, streak, and grading rules applied by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Points awarded per watch-time report.
    pub watch_report_points: i64,
    /// Points awarded when a lesson first transitions to completed.
    pub lesson_completion_points: i64,
    /// Bonus awarded once when a course reaches 100%.
    pub course_completion_bonus: i64,
    /// Points awarded on the first activity of a calendar day.
    pub daily_activity_points: i64,
    /// Minimum quiz score (0-100) counted as a pass.
    pub quiz_pass_mark: f64,
    /// Consecutive-day counts that trigger a streak badge check.
    pub streak_milestones: Vec<i64>,
    /// Default number of leaderboard entries returned.
    pub leaderboard_limit: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            watch_report_points: 1,
            lesson_completion_points: 10,
            course_completion_bonus: 100,
            daily_activity_points: 5,
            quiz_pass_mark: 70.0,
            streak_milestones: vec![7, 30, 100],
            leaderboard_limit: 10,
        }
    }
}

impl Rules {
    /// Load rules from a JSON file. Missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let rules: Self = serde_json::from_str(&raw)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject configurations the engine cannot apply sensibly.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.quiz_pass_mark) {
            return Err(Error::Config(format!(
                "quiz_pass_mark must be within 0..=100, got {}",
                self.quiz_pass_mark
            )));
        }
        if self.streak_milestones.iter().any(|&m| m <= 0) {
            return Err(Error::Config(
                "streak_milestones must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_point_values() {
        let rules = Rules::default();
        assert_eq!(rules.watch_report_points, 1);
        assert_eq!(rules.lesson_completion_points, 10);
        assert_eq!(rules.course_completion_bonus, 100);
        assert_eq!(rules.daily_activity_points, 5);
        assert!((rules.quiz_pass_mark - 70.0).abs() < f64::EPSILON);
        assert_eq!(rules.streak_milestones, vec![7, 30, 100]);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"daily_activity_points": 2}"#).unwrap();

        let rules = Rules::from_file(&path).unwrap();
        assert_eq!(rules.daily_activity_points, 2);
        assert_eq!(rules.lesson_completion_points, 10);
    }

    #[test]
    fn pass_mark_out_of_range_is_rejected() {
        let rules = Rules {
            quiz_pass_mark: 140.0,
            ..Rules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn non_positive_milestone_is_rejected() {
        let rules = Rules {
            streak_milestones: vec![7, 0],
            ..Rules::default()
        };
        assert!(rules.validate().is_err());
    }
}
