use thiserror::Error;

use crate::model::{ProfileError, QuizError, StudySessionError, SubjectError, TopicError};

/// Any validation failure raised by the domain model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
