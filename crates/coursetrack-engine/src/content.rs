//! Typed lesson kinds and content payloads.
//!
//! Lesson content is persisted as JSON tagged by `kind`; each variant carries
//! only the fields relevant to that kind and is validated here, at the
//! boundary, before any engine logic touches it.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// What a lesson is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Text,
    Quiz,
    Assignment,
}

impl LessonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Quiz => "quiz",
            Self::Assignment => "assignment",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "quiz" => Some(Self::Quiz),
            "assignment" => Some(Self::Assignment),
            _ => None,
        }
    }
}

/// A single quiz question. `correct_answer` indexes into `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// Lesson content payload, tagged by lesson kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LessonContent {
    Video {
        #[serde(default)]
        source_url: Option<String>,
    },
    Text {
        body: String,
    },
    Quiz {
        questions: Vec<QuizQuestion>,
    },
    Assignment {
        instructions: String,
    },
}

impl LessonContent {
    /// Deserialize and validate a persisted content payload.
    pub fn from_json(raw: &str) -> Result<Self> {
        let content: Self =
            serde_json::from_str(raw).map_err(|e| EngineError::InvalidContent(e.to_string()))?;
        content.validate()?;
        Ok(content)
    }

    fn validate(&self) -> Result<()> {
        if let Self::Quiz { questions } = self {
            for (i, q) in questions.iter().enumerate() {
                if q.options.is_empty() {
                    return Err(EngineError::InvalidContent(format!(
                        "question {i} has no options"
                    )));
                }
                if q.correct_answer >= q.options.len() {
                    return Err(EngineError::InvalidContent(format!(
                        "question {i} answer index {} out of range",
                        q.correct_answer
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_payload_round_trips() {
        let raw = r#"{
            "kind": "quiz",
            "questions": [
                {"prompt": "2 + 2?", "options": ["3", "4"], "correct_answer": 1}
            ]
        }"#;
        let content = LessonContent::from_json(raw).unwrap();
        let LessonContent::Quiz { questions } = content else {
            panic!("expected quiz content");
        };
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, 1);
    }

    #[test]
    fn answer_index_out_of_range_is_rejected() {
        let raw = r#"{
            "kind": "quiz",
            "questions": [
                {"prompt": "?", "options": ["a"], "correct_answer": 3}
            ]
        }"#;
        assert!(matches!(
            LessonContent::from_json(raw),
            Err(EngineError::InvalidContent(_))
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(LessonContent::from_json(r#"{"kind": "hologram"}"#).is_err());
        assert!(LessonKind::parse("hologram").is_none());
    }
}
