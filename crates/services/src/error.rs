//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the completion client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("completion base url is invalid: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("completion base url must use http or https, got {0}")]
    UnsupportedScheme(String),
    /// Blank first choice. Surfaced as an upstream failure rather than replaced with canned text.
    #[error("completion returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `TutorService`.
///
/// Upstream failures are logged where they happen and surface here without
/// detail.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("AI features are not configured")]
    Disabled,
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("failed to generate AI response")]
    Upstream,
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error("profile not found")]
    NotFound,
    #[error("profile already exists")]
    AlreadyExists,
    #[error(transparent)]
    Validation(#[from] study_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SubjectService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubjectServiceError {
    #[error("subject not found or access denied")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] study_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TopicService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TopicServiceError {
    #[error("subject not found or access denied")]
    SubjectNotFound,
    #[error("topic not found or access denied")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] study_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudySessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudySessionServiceError {
    #[error("session not found or access denied")]
    NotFound,
    #[error("referenced subject or topic not found or access denied")]
    ReferenceNotFound,
    #[error("session already ended")]
    AlreadyEnded,
    #[error(transparent)]
    Validation(#[from] study_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("invalid utc offset: {0} minutes")]
    InvalidOffset(i32),
    #[error("analytics window of {0} days is out of range")]
    InvalidWindow(u32),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("subject not found or access denied")]
    SubjectNotFound,
    #[error("topic not found or access denied")]
    TopicNotFound,
    #[error("quiz not found or access denied")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] study_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
