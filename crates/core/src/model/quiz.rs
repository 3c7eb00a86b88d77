use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuizAttemptId, QuizId, SubjectId, TopicId, UserId};
use crate::model::level::Difficulty;

/// Every question offers exactly this many choices.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("question {index} has {count} options, expected {OPTIONS_PER_QUESTION}")]
    WrongOptionCount { index: usize, count: usize },

    #[error("question {index} marks option {answer} as correct, which does not exist")]
    CorrectAnswerOutOfRange { index: usize, answer: usize },

    #[error("question {index} has no question text")]
    EmptyQuestion { index: usize },

    #[error("submitted {submitted} answers for a quiz of {expected} questions")]
    AnswerCountMismatch { submitted: usize, expected: usize },
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizQuestion {
    fn check(&self, index: usize) -> Result<(), QuizError> {
        if self.question.trim().is_empty() {
            return Err(QuizError::EmptyQuestion { index });
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(QuizError::WrongOptionCount {
                index,
                count: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                index,
                answer: self.correct_answer,
            });
        }
        Ok(())
    }
}

/// Check the shape of every question in order.
///
/// # Errors
///
/// Returns the first `QuizError` found, or `QuizError::NoQuestions` for an empty list.
pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    questions
        .iter()
        .enumerate()
        .try_for_each(|(index, q)| q.check(index))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub topic_id: Option<TopicId>,
    pub title: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    pub topic_id: Option<TopicId>,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
}

impl QuizDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is blank or any question is malformed.
    pub fn validate(mut self) -> Result<Self, QuizError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        self.title = title.to_string();
        validate_questions(&self.questions)?;
        Ok(self)
    }
}

/// Answers as submitted by the quiz taker, one slot per question.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSubmission {
    /// Selected option per question; `None` for a skipped question.
    pub answers: Vec<Option<usize>>,
    /// Seconds spent on the quiz.
    #[serde(default)]
    pub time_spent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub question_index: usize,
    pub selected_answer: Option<usize>,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: QuizAttemptId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent: u32,
    pub answers: Vec<AttemptAnswer>,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of checking a submission against the stored answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAttempt {
    pub score: u32,
    pub total_questions: u32,
    pub answers: Vec<AttemptAnswer>,
}

/// Percentage of matching answers, rounded to the nearest whole point.
///
/// Slots beyond the shorter list never match; an empty key scores 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn score_answers(selected: &[Option<usize>], correct: &[usize]) -> u32 {
    if correct.is_empty() {
        return 0;
    }
    let matches = correct
        .iter()
        .zip(selected)
        .filter(|(key, pick)| **pick == Some(**key))
        .count();
    ((matches as f64 / correct.len() as f64) * 100.0).round() as u32
}

impl Quiz {
    /// Grade a submission against this quiz's answer key.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AnswerCountMismatch` if the submission does not have one
    /// slot per question.
    pub fn grade(&self, submission: &AttemptSubmission) -> Result<GradedAttempt, QuizError> {
        if submission.answers.len() != self.questions.len() {
            return Err(QuizError::AnswerCountMismatch {
                submitted: submission.answers.len(),
                expected: self.questions.len(),
            });
        }
        let key: Vec<usize> = self.questions.iter().map(|q| q.correct_answer).collect();
        let answers = submission
            .answers
            .iter()
            .zip(&key)
            .enumerate()
            .map(|(question_index, (pick, correct))| AttemptAnswer {
                question_index,
                selected_answer: *pick,
                correct: *pick == Some(*correct),
            })
            .collect();

        Ok(GradedAttempt {
            score: score_answers(&submission.answers, &key),
            total_questions: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            answers,
        })
    }
}
