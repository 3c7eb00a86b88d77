use std::sync::Arc;

use chrono::FixedOffset;
use storage::repository::Storage;

use crate::Clock;
use crate::ai::{CompletionConfig, CompletionProvider, OpenAiCompletionClient, TutorService};
use crate::analytics_service::AnalyticsService;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::quiz_service::QuizService;
use crate::study_session_service::StudySessionService;
use crate::subject_service::SubjectService;
use crate::topic_service::TopicService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    profiles: Arc<ProfileService>,
    subjects: Arc<SubjectService>,
    topics: Arc<TopicService>,
    sessions: Arc<StudySessionService>,
    analytics: Arc<AnalyticsService>,
    quizzes: Arc<QuizService>,
    tutor: Arc<TutorService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// AI features stay disabled when `completion` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// completion client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        utc_offset: FixedOffset,
        completion: Option<CompletionConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let provider = match completion {
            Some(config) => {
                let client: Arc<dyn CompletionProvider> =
                    Arc::new(OpenAiCompletionClient::new(config)?);
                Some(client)
            }
            None => None,
        };
        Ok(Self::from_storage(&storage, clock, utc_offset, provider))
    }

    /// Build services over an existing storage aggregate.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        utc_offset: FixedOffset,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        let profiles = Arc::new(ProfileService::new(clock, Arc::clone(&storage.profiles)));
        let subjects = Arc::new(SubjectService::new(
            clock,
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.topics),
        ));
        let topics = Arc::new(TopicService::new(
            clock,
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.topics),
        ));
        let sessions = Arc::new(StudySessionService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.topics),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            clock,
            Arc::clone(&storage.sessions),
            utc_offset,
        ));
        let quizzes = Arc::new(QuizService::new(
            clock,
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.topics),
            Arc::clone(&storage.quizzes),
        ));
        let tutor = Arc::new(TutorService::new(provider));

        Self {
            profiles,
            subjects,
            topics,
            sessions,
            analytics,
            quizzes,
            tutor,
        }
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn subjects(&self) -> Arc<SubjectService> {
        Arc::clone(&self.subjects)
    }

    #[must_use]
    pub fn topics(&self) -> Arc<TopicService> {
        Arc::clone(&self.topics)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<StudySessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }
}
