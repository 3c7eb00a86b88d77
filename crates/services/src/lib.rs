#![forbid(unsafe_code)]

mod access;
pub mod ai;
pub mod analytics_service;
pub mod app_services;
pub mod error;
pub mod profile_service;
pub mod quiz_service;
pub mod study_session_service;
pub mod subject_service;
pub mod topic_service;

pub use study_core::Clock;

pub use ai::TutorService;
pub use analytics_service::AnalyticsService;
pub use app_services::AppServices;
pub use error::{
    AnalyticsError, AppServicesError, CompletionError, ProfileServiceError, QuizServiceError,
    StudySessionServiceError, SubjectServiceError, TopicServiceError, TutorError,
};
pub use profile_service::ProfileService;
pub use quiz_service::QuizService;
pub use study_session_service::{
    DEFAULT_RECENT_LIMIT, EndedSession, SessionStart, StudySessionService,
};
pub use subject_service::SubjectService;
pub use topic_service::TopicService;
