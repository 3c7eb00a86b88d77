use std::sync::Arc;

use study_core::generated_quiz::{GeneratedQuiz, parse_generated_quiz};

use crate::ai::completion::CompletionProvider;
use crate::ai::prompts::{ChatTurn, ExplainRequest, QuizRequest, StudyPlanRequest, SummarizeRequest};
use crate::error::TutorError;

/// AI tutoring features: one prompt, one completion call each.
#[derive(Clone)]
pub struct TutorService {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl TutorService {
    #[must_use]
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Explain a concept at the requested depth.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for blank fields,
    /// `TutorError::Disabled` without a provider, or `TutorError::Upstream`
    /// if the completion call fails.
    pub async fn explain_concept(&self, request: &ExplainRequest) -> Result<String, TutorError> {
        request.validate()?;
        self.complete("explain", &request.render()).await
    }

    /// Generate quiz questions, falling back to a placeholder when the model's
    /// answer cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for invalid fields,
    /// `TutorError::Disabled` without a provider, or `TutorError::Upstream`
    /// if the completion call fails.
    pub async fn generate_quiz(&self, request: &QuizRequest) -> Result<GeneratedQuiz, TutorError> {
        request.validate()?;
        let completion = self.complete("quiz", &request.render()).await?;
        let quiz = parse_generated_quiz(&completion, &request.topic);
        if let GeneratedQuiz::FallbackUsed { reason, .. } = &quiz {
            tracing::warn!(%reason, "quiz completion unusable; returning placeholder question");
        }
        Ok(quiz)
    }

    /// Reply to a tutoring chat message.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for a blank message,
    /// `TutorError::Disabled` without a provider, or `TutorError::Upstream`
    /// if the completion call fails.
    pub async fn chat(&self, turn: &ChatTurn) -> Result<String, TutorError> {
        turn.validate()?;
        self.complete("chat", &turn.render()).await
    }

    /// Summarize document text into study notes.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for blank fields,
    /// `TutorError::Disabled` without a provider, or `TutorError::Upstream`
    /// if the completion call fails.
    pub async fn summarize(&self, request: &SummarizeRequest) -> Result<String, TutorError> {
        request.validate()?;
        self.complete("summarize", &request.render()).await
    }

    /// Draft a study plan across subjects.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for invalid hours,
    /// `TutorError::Disabled` without a provider, or `TutorError::Upstream`
    /// if the completion call fails.
    pub async fn study_plan(&self, request: &StudyPlanRequest) -> Result<String, TutorError> {
        request.validate()?;
        self.complete("plan", &request.render()).await
    }

    async fn complete(&self, feature: &'static str, prompt: &str) -> Result<String, TutorError> {
        let provider = self.provider.as_ref().ok_or(TutorError::Disabled)?;
        provider.complete(prompt).await.map_err(|err| {
            tracing::error!(feature, error = %err, "completion request failed");
            TutorError::Upstream
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use study_core::model::{Difficulty, ExplanationDepth, Level};

    /// Replays a canned completion and records the prompts it was given.
    struct StubProvider {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or(CompletionError::EmptyResponse)
        }
    }

    fn quiz_request() -> QuizRequest {
        QuizRequest {
            subject: "Biology".into(),
            topic: "photosynthesis".into(),
            difficulty: Difficulty::Easy,
            question_count: 3,
        }
    }

    #[tokio::test]
    async fn disabled_service_reports_disabled() {
        let tutor = TutorService::disabled();
        assert!(!tutor.enabled());
        let err = tutor.generate_quiz(&quiz_request()).await.unwrap_err();
        assert!(matches!(err, TutorError::Disabled));
    }

    #[tokio::test]
    async fn unparseable_quiz_falls_back() {
        let stub = StubProvider::replying("Sorry, I can't do that.");
        let tutor = TutorService::new(Some(stub.clone()));
        let quiz = tutor.generate_quiz(&quiz_request()).await.unwrap();
        assert!(quiz.is_fallback());
        assert_eq!(quiz.questions().len(), 1);
        assert_eq!(quiz.questions()[0].correct_answer, 0);

        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].contains("Create 3 multiple-choice questions"));
    }

    #[tokio::test]
    async fn upstream_failure_is_generic() {
        let tutor = TutorService::new(Some(StubProvider::failing()));
        let err = tutor
            .explain_concept(&ExplainRequest {
                topic: "Osmosis".into(),
                subject: "Biology".into(),
                difficulty: ExplanationDepth::Advanced,
                context: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TutorError::Upstream));
        assert_eq!(err.to_string(), "failed to generate AI response");
    }

    #[tokio::test]
    async fn chat_returns_completion_text() {
        let stub = StubProvider::replying("Take a short break, then we'll continue.");
        let tutor = TutorService::new(Some(stub.clone()));
        let reply = tutor
            .chat(&ChatTurn {
                message: "I'm exhausted".into(),
                subject: None,
                difficulty: None,
                fatigue_level: Some(Level::High),
                conversation_history: Vec::new(),
            })
            .await
            .unwrap();
        assert!(reply.starts_with("Take a short break"));
        assert!(stub.prompts.lock().unwrap()[0].contains("seems tired"));
    }

    #[tokio::test]
    async fn invalid_request_never_calls_provider() {
        let stub = StubProvider::replying("unused");
        let tutor = TutorService::new(Some(stub.clone()));
        let err = tutor
            .summarize(&SummarizeRequest {
                text: "   ".into(),
                subject: "History".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TutorError::InvalidRequest(_)));
        assert!(stub.prompts.lock().unwrap().is_empty());
    }
}
