//! Recovering quiz questions from free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{QuizQuestion, validate_questions};

// Greedy: from the first `[` to the last `]`.
static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("static regex is valid"));

/// Questions recovered from a completion, tagged with how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GeneratedQuiz {
    /// The completion contained a well-formed question array.
    Parsed { questions: Vec<QuizQuestion> },
    /// The completion was unusable; `questions` holds a single placeholder.
    #[serde(rename_all = "camelCase")]
    FallbackUsed {
        questions: Vec<QuizQuestion>,
        reason: String,
    },
}

impl GeneratedQuiz {
    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        match self {
            GeneratedQuiz::Parsed { questions } | GeneratedQuiz::FallbackUsed { questions, .. } => {
                questions
            }
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, GeneratedQuiz::FallbackUsed { .. })
    }
}

/// Extract questions from `completion`.
///
/// Takes the widest bracketed span if there is one, otherwise the whole text,
/// and falls back to a placeholder question about `topic` when that does not
/// parse into valid questions.
#[must_use]
pub fn parse_generated_quiz(completion: &str, topic: &str) -> GeneratedQuiz {
    let candidate = JSON_ARRAY
        .find(completion)
        .map_or(completion, |m| m.as_str());

    match serde_json::from_str::<Vec<QuizQuestion>>(candidate) {
        Ok(questions) => match validate_questions(&questions) {
            Ok(()) => GeneratedQuiz::Parsed { questions },
            Err(err) => fallback(topic, err.to_string()),
        },
        Err(err) => fallback(topic, err.to_string()),
    }
}

fn fallback(topic: &str, reason: String) -> GeneratedQuiz {
    GeneratedQuiz::FallbackUsed {
        questions: vec![placeholder_question(topic)],
        reason,
    }
}

/// Stand-in question returned when generation produced nothing usable.
#[must_use]
pub fn placeholder_question(topic: &str) -> QuizQuestion {
    QuizQuestion {
        question: format!("What is an important concept in {topic}?"),
        options: vec![
            "Option A".to_string(),
            "Option B".to_string(),
            "Option C".to_string(),
            "Option D".to_string(),
        ],
        correct_answer: 0,
        explanation: "This is a sample question. Please try generating the quiz again."
            .to_string(),
    }
}
