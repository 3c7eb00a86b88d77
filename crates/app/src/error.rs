use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::{
    AnalyticsError, ProfileServiceError, QuizServiceError, StudySessionServiceError,
    SubjectServiceError, TopicServiceError, TutorError,
};
use storage::repository::StorageError;
use thiserror::Error;
use tracing::error;

/// Failures surfaced to HTTP clients as `{"error": message}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing or empty x-user-id header")]
    Unauthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn not_found(err: impl ToString) -> Self {
        Self::NotFound(err.to_string())
    }

    fn bad_request(err: impl ToString) -> Self {
        Self::BadRequest(err.to_string())
    }

    fn conflict(err: impl ToString) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ApiError::not_found("record not found"),
            other => {
                error!(error = %other, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl From<ProfileServiceError> for ApiError {
    fn from(err: ProfileServiceError) -> Self {
        match err {
            ProfileServiceError::NotFound => ApiError::not_found(err),
            ProfileServiceError::AlreadyExists => ApiError::conflict(err),
            ProfileServiceError::Validation(_) => ApiError::bad_request(err),
            ProfileServiceError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<SubjectServiceError> for ApiError {
    fn from(err: SubjectServiceError) -> Self {
        match err {
            SubjectServiceError::NotFound => ApiError::not_found(err),
            SubjectServiceError::Validation(_) => ApiError::bad_request(err),
            SubjectServiceError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<TopicServiceError> for ApiError {
    fn from(err: TopicServiceError) -> Self {
        match err {
            TopicServiceError::SubjectNotFound | TopicServiceError::NotFound => {
                ApiError::not_found(err)
            }
            TopicServiceError::Validation(_) => ApiError::bad_request(err),
            TopicServiceError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<StudySessionServiceError> for ApiError {
    fn from(err: StudySessionServiceError) -> Self {
        match err {
            StudySessionServiceError::NotFound | StudySessionServiceError::ReferenceNotFound => {
                ApiError::not_found(err)
            }
            StudySessionServiceError::AlreadyEnded => ApiError::conflict(err),
            StudySessionServiceError::Validation(_) => ApiError::bad_request(err),
            StudySessionServiceError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidOffset(_) | AnalyticsError::InvalidWindow(_) => {
                ApiError::bad_request(err)
            }
            AnalyticsError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<QuizServiceError> for ApiError {
    fn from(err: QuizServiceError) -> Self {
        match err {
            QuizServiceError::SubjectNotFound
            | QuizServiceError::TopicNotFound
            | QuizServiceError::NotFound => ApiError::not_found(err),
            QuizServiceError::Validation(_) => ApiError::bad_request(err),
            QuizServiceError::Storage(inner) => inner.into(),
            _ => ApiError::Internal,
        }
    }
}

impl From<TutorError> for ApiError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::Disabled => ApiError::Unavailable(err.to_string()),
            TutorError::InvalidRequest(_) => ApiError::bad_request(err),
            TutorError::Upstream => ApiError::BadGateway(err.to_string()),
            _ => ApiError::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::StudySessionError;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(status(SubjectServiceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ProfileServiceError::AlreadyExists), StatusCode::CONFLICT);
        assert_eq!(
            status(StudySessionServiceError::AlreadyEnded),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StudySessionServiceError::Validation(
                StudySessionError::InvalidTimeRange.into()
            )),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AnalyticsError::InvalidOffset(1440)), StatusCode::BAD_REQUEST);
        assert_eq!(status(AnalyticsError::InvalidWindow(u32::MAX)), StatusCode::BAD_REQUEST);
        assert_eq!(status(TutorError::Disabled), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(TutorError::Upstream), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn storage_failures_hide_details() {
        let err: ApiError =
            QuizServiceError::Storage(StorageError::Connection("pool closed".into())).into();
        assert!(matches!(err, ApiError::Internal));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let missing: ApiError = TopicServiceError::Storage(StorageError::NotFound).into();
        assert!(matches!(missing, ApiError::NotFound(_)));
    }
}
