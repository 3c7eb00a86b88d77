use std::sync::Arc;

use storage::repository::{
    NewQuizAttemptRecord, NewQuizRecord, QuizRepository, SubjectRepository, TopicRepository,
};
use study_core::model::{
    AttemptSubmission, Quiz, QuizAttempt, QuizDraft, QuizId, SubjectId, UserId,
};

use crate::Clock;
use crate::access::owned_by;
use crate::error::QuizServiceError;

/// Stores quizzes and grades attempts against the stored answer key.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    subjects: Arc<dyn SubjectRepository>,
    topics: Arc<dyn TopicRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        subjects: Arc<dyn SubjectRepository>,
        topics: Arc<dyn TopicRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            clock,
            subjects,
            topics,
            quizzes,
        }
    }

    /// Save a quiz under one of the caller's subjects.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::SubjectNotFound` or `QuizServiceError::TopicNotFound`
    /// if a reference is missing, foreign, or the topic sits under another subject.
    /// Returns `QuizServiceError::Validation` for malformed questions.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn save(
        &self,
        caller: &UserId,
        subject_id: SubjectId,
        draft: QuizDraft,
    ) -> Result<Quiz, QuizServiceError> {
        let draft = draft.validate().map_err(study_core::Error::from)?;
        owned_by(self.subjects.get_subject(subject_id).await?, caller)
            .ok_or(QuizServiceError::SubjectNotFound)?;
        if let Some(topic_id) = draft.topic_id {
            owned_by(self.topics.get_topic(topic_id).await?, caller)
                .filter(|t| t.subject_id == subject_id)
                .ok_or(QuizServiceError::TopicNotFound)?;
        }

        let id = self
            .quizzes
            .insert_quiz(NewQuizRecord {
                user_id: caller.clone(),
                subject_id,
                topic_id: draft.topic_id,
                title: draft.title,
                difficulty: draft.difficulty,
                questions: draft.questions,
                created_at: self.clock.now(),
            })
            .await?;
        self.get(caller, id).await
    }

    /// The caller's quizzes for a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_for_subject(
        &self,
        caller: &UserId,
        subject_id: SubjectId,
    ) -> Result<Vec<Quiz>, QuizServiceError> {
        let quizzes = self.quizzes.list_quizzes_for_subject(subject_id).await?;
        Ok(quizzes
            .into_iter()
            .filter(|q| &q.user_id == caller)
            .collect())
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the quiz is missing or foreign.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get(&self, caller: &UserId, id: QuizId) -> Result<Quiz, QuizServiceError> {
        owned_by(self.quizzes.get_quiz(id).await?, caller).ok_or(QuizServiceError::NotFound)
    }

    /// Grade the submitted answers and store the attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the quiz is missing or foreign.
    /// Returns `QuizServiceError::Validation` if the answer count does not match.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn submit_attempt(
        &self,
        caller: &UserId,
        id: QuizId,
        submission: AttemptSubmission,
    ) -> Result<QuizAttempt, QuizServiceError> {
        let quiz = self.get(caller, id).await?;
        let graded = quiz.grade(&submission).map_err(study_core::Error::from)?;
        let record = NewQuizAttemptRecord {
            user_id: caller.clone(),
            quiz_id: id,
            score: graded.score,
            total_questions: graded.total_questions,
            time_spent: submission.time_spent,
            answers: graded.answers,
            completed_at: self.clock.now(),
        };
        let attempt_id = self.quizzes.insert_attempt(record.clone()).await?;
        tracing::debug!(quiz_id = %id, score = record.score, "quiz attempt recorded");

        Ok(QuizAttempt {
            id: attempt_id,
            user_id: record.user_id,
            quiz_id: record.quiz_id,
            score: record.score,
            total_questions: record.total_questions,
            time_spent: record.time_spent,
            answers: record.answers,
            completed_at: record.completed_at,
        })
    }

    /// Attempts on one of the caller's quizzes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the quiz is missing or foreign.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_attempts(
        &self,
        caller: &UserId,
        id: QuizId,
    ) -> Result<Vec<QuizAttempt>, QuizServiceError> {
        self.get(caller, id).await?;
        let attempts = self.quizzes.list_attempts_for_quiz(id).await?;
        Ok(attempts
            .into_iter()
            .filter(|a| &a.user_id == caller)
            .collect())
    }
}
