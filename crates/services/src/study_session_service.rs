use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storage::repository::{
    NewStudySessionRecord, StudySessionRepository, SubjectRepository, TopicRepository,
};
use study_core::model::{
    SessionActivityPatch, StudySession, StudySessionError, StudySessionId, SubjectId, TopicId,
    UserId,
};

use crate::Clock;
use crate::access::owned_by;
use crate::error::StudySessionServiceError;

/// Number of sessions returned by [`StudySessionService::recent`] when no limit is given.
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// What the caller is about to study. Both references are optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub subject_id: Option<SubjectId>,
    pub topic_id: Option<TopicId>,
}

/// Result of ending a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndedSession {
    pub session_id: StudySessionId,
    /// Minutes.
    pub duration: u32,
}

/// Starts, updates and ends tracked study sessions.
#[derive(Clone)]
pub struct StudySessionService {
    clock: Clock,
    sessions: Arc<dyn StudySessionRepository>,
    subjects: Arc<dyn SubjectRepository>,
    topics: Arc<dyn TopicRepository>,
}

impl StudySessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn StudySessionRepository>,
        subjects: Arc<dyn SubjectRepository>,
        topics: Arc<dyn TopicRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            subjects,
            topics,
        }
    }

    /// Open a new session at the current time.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionServiceError::ReferenceNotFound` if a referenced
    /// subject or topic is missing or foreign.
    /// Returns `StudySessionServiceError::Storage` if persistence fails.
    pub async fn start(
        &self,
        caller: &UserId,
        start: SessionStart,
    ) -> Result<StudySession, StudySessionServiceError> {
        if let Some(subject_id) = start.subject_id {
            owned_by(self.subjects.get_subject(subject_id).await?, caller)
                .ok_or(StudySessionServiceError::ReferenceNotFound)?;
        }
        if let Some(topic_id) = start.topic_id {
            owned_by(self.topics.get_topic(topic_id).await?, caller)
                .ok_or(StudySessionServiceError::ReferenceNotFound)?;
        }

        let id = self
            .sessions
            .insert_session(NewStudySessionRecord {
                user_id: caller.clone(),
                subject_id: start.subject_id,
                topic_id: start.topic_id,
                start_time: self.clock.now(),
            })
            .await?;
        tracing::debug!(session_id = %id, "study session started");
        self.owned(caller, id).await
    }

    /// Record activity counters and self-ratings on a session.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionServiceError::NotFound` if the session is missing or foreign.
    /// Returns `StudySessionServiceError::Storage` if persistence fails.
    pub async fn update_activity(
        &self,
        caller: &UserId,
        id: StudySessionId,
        patch: SessionActivityPatch,
    ) -> Result<StudySession, StudySessionServiceError> {
        let mut session = self.owned(caller, id).await?;
        session.apply_activity(patch);
        self.sessions.update_session(&session).await?;
        Ok(session)
    }

    /// End a session now and store its duration.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionServiceError::NotFound` if the session is missing or foreign.
    /// Returns `StudySessionServiceError::AlreadyEnded` if it was ended before.
    /// Returns `StudySessionServiceError::Validation` if the clock is behind the start time.
    /// Returns `StudySessionServiceError::Storage` if persistence fails.
    pub async fn end(
        &self,
        caller: &UserId,
        id: StudySessionId,
        notes: Option<String>,
    ) -> Result<EndedSession, StudySessionServiceError> {
        let mut session = self.owned(caller, id).await?;
        let duration = match session.end(self.clock.now(), notes) {
            Ok(minutes) => minutes,
            Err(StudySessionError::AlreadyEnded) => {
                return Err(StudySessionServiceError::AlreadyEnded);
            }
            Err(other) => return Err(study_core::Error::from(other).into()),
        };
        self.sessions.update_session(&session).await?;
        tracing::debug!(session_id = %id, duration, "study session ended");
        Ok(EndedSession {
            session_id: id,
            duration,
        })
    }

    /// The caller's oldest session that has not been ended.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionServiceError::Storage` if repository access fails.
    pub async fn active(
        &self,
        caller: &UserId,
    ) -> Result<Option<StudySession>, StudySessionServiceError> {
        Ok(self.sessions.active_session(caller).await?)
    }

    /// The caller's latest completed sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionServiceError::Storage` if repository access fails.
    pub async fn recent(
        &self,
        caller: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<StudySession>, StudySessionServiceError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        Ok(self.sessions.recent_completed(caller, limit).await?)
    }

    async fn owned(
        &self,
        caller: &UserId,
        id: StudySessionId,
    ) -> Result<StudySession, StudySessionServiceError> {
        owned_by(self.sessions.get_session(id).await?, caller)
            .ok_or(StudySessionServiceError::NotFound)
    }
}
