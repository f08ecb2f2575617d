//! Quiz grading.
//!
//! Scoring is a pure function; `QuizGrader::submit` wraps it with the access
//! gate and attempt persistence. Repeated attempts always overwrite the
//! previous one, so a later failing attempt clears a previous pass.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use coursetrack_core::{Clock, Rules};

use crate::access::lesson_access;
use crate::content::{LessonContent, QuizQuestion};
use crate::error::{EngineError, Result};
use crate::storage::Database;

/// Outcome of grading one submission.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    /// 0-100, unrounded: 2 of 3 correct is 66.666...
    pub score: f64,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub passed: bool,
}

/// Score a submission against the question list.
///
/// Answers align with questions by position; a missing or out-of-range
/// answer is simply wrong. An empty quiz scores 0 and never passes.
#[allow(clippy::cast_precision_loss)]
pub fn grade(questions: &[QuizQuestion], answers: &[usize], pass_mark: f64) -> QuizResult {
    let total_questions = questions.len();
    let correct_answers = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i) == Some(&q.correct_answer))
        .count();

    let score = if total_questions == 0 {
        0.0
    } else {
        correct_answers as f64 / total_questions as f64 * 100.0
    };

    QuizResult {
        score,
        correct_answers,
        total_questions,
        passed: score >= pass_mark,
    }
}

/// Grades quiz submissions and records the attempt on the progress row.
#[derive(Clone)]
pub struct QuizGrader {
    db: Database,
    clock: Arc<dyn Clock>,
    rules: Rules,
}

impl QuizGrader {
    pub fn new(db: Database, clock: Arc<dyn Clock>, rules: Rules) -> Self {
        Self { db, clock, rules }
    }

    /// Grade a submission for a quiz lesson and persist the attempt.
    ///
    /// The lesson must be a quiz with a valid question payload, and the
    /// learner must pass the access gate. The attempt overwrites any prior
    /// score; completion follows the pass/fail outcome.
    pub async fn submit(
        &self,
        user_id: &str,
        lesson_id: &str,
        answers: &[usize],
    ) -> Result<QuizResult> {
        let lesson = self.db.get_lesson(lesson_id).await.map_err(|e| match e {
            coursetrack_core::db::DatabaseError::NotFound(msg) => EngineError::NotFound(msg),
            other => other.into(),
        })?;
        if lesson.kind != "quiz" {
            return Err(EngineError::NotFound(format!(
                "Quiz lesson {lesson_id}"
            )));
        }

        lesson_access(&self.db, user_id, lesson_id, self.clock.now()).await?;

        let raw = lesson
            .content
            .as_deref()
            .ok_or_else(|| EngineError::InvalidContent("quiz has no content".to_string()))?;
        let LessonContent::Quiz { questions } = LessonContent::from_json(raw)? else {
            return Err(EngineError::InvalidContent(
                "lesson content is not a quiz".to_string(),
            ));
        };

        let result = grade(&questions, answers, self.rules.quiz_pass_mark);

        self.db
            .record_quiz_attempt(
                user_id,
                lesson_id,
                result.score,
                result.passed,
                self.clock.now().timestamp(),
            )
            .await?;

        debug!(
            user_id,
            lesson_id,
            score = result.score,
            passed = result.passed,
            "Quiz attempt recorded"
        );

        Ok(result)
    }
}
