use std::sync::Arc;

use storage::repository::{NewSubjectRecord, SubjectRepository, TopicRepository};
use study_core::model::{Subject, SubjectDraft, SubjectId, SubjectPatch, UserId, compare_for_listing};
use study_core::progress::{SubjectOverview, SubjectProgress};

use crate::Clock;
use crate::access::owned_by;
use crate::error::SubjectServiceError;

/// Orchestrates subject creation, listing and progress views for one caller.
#[derive(Clone)]
pub struct SubjectService {
    clock: Clock,
    subjects: Arc<dyn SubjectRepository>,
    topics: Arc<dyn TopicRepository>,
}

impl SubjectService {
    #[must_use]
    pub fn new(
        clock: Clock,
        subjects: Arc<dyn SubjectRepository>,
        topics: Arc<dyn TopicRepository>,
    ) -> Self {
        Self {
            clock,
            subjects,
            topics,
        }
    }

    /// The caller's subjects in display order.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::Storage` if repository access fails.
    pub async fn list(&self, caller: &UserId) -> Result<Vec<Subject>, SubjectServiceError> {
        let mut subjects = self.subjects.list_subjects_for_user(caller).await?;
        subjects.sort_by(compare_for_listing);
        Ok(subjects)
    }

    /// Create a subject owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::Validation` for a blank name.
    /// Returns `SubjectServiceError::Storage` if persistence fails.
    pub async fn create(
        &self,
        caller: &UserId,
        draft: SubjectDraft,
    ) -> Result<Subject, SubjectServiceError> {
        let draft = draft.validate().map_err(study_core::Error::from)?;
        let id = self
            .subjects
            .insert_subject(NewSubjectRecord::from_draft(
                caller.clone(),
                draft,
                self.clock.now(),
            ))
            .await?;
        self.owned(caller, id).await
    }

    /// Apply a partial update to one of the caller's subjects.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::NotFound` if the subject is missing or foreign.
    /// Returns `SubjectServiceError::Validation` for a blank name.
    /// Returns `SubjectServiceError::Storage` if persistence fails.
    pub async fn update(
        &self,
        caller: &UserId,
        id: SubjectId,
        patch: SubjectPatch,
    ) -> Result<Subject, SubjectServiceError> {
        let mut subject = self.owned(caller, id).await?;
        subject.apply_patch(patch).map_err(study_core::Error::from)?;
        self.subjects.update_subject(&subject).await?;
        Ok(subject)
    }

    /// Delete a subject with its topics and quizzes.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::NotFound` if the subject is missing or foreign.
    /// Returns `SubjectServiceError::Storage` if persistence fails.
    pub async fn delete(&self, caller: &UserId, id: SubjectId) -> Result<(), SubjectServiceError> {
        self.owned(caller, id).await?;
        self.subjects.delete_subject(id).await?;
        tracing::debug!(subject_id = %id, "subject deleted");
        Ok(())
    }

    /// Progress computed from the subject's current topics.
    ///
    /// Returns `Ok(None)` when the subject is missing or owned by someone else.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::Storage` if repository access fails.
    pub async fn progress(
        &self,
        caller: &UserId,
        id: SubjectId,
    ) -> Result<Option<SubjectProgress>, SubjectServiceError> {
        let Some(subject) = owned_by(self.subjects.get_subject(id).await?, caller) else {
            return Ok(None);
        };
        let topics = self
            .topics
            .list_topics_for_subject(id)
            .await?
            .into_iter()
            .filter(|t| &t.user_id == caller)
            .collect();
        Ok(Some(SubjectProgress::from_topics(subject, topics)))
    }

    /// Roll-up across all of the caller's subjects.
    ///
    /// # Errors
    ///
    /// Returns `SubjectServiceError::Storage` if repository access fails.
    pub async fn overview(&self, caller: &UserId) -> Result<SubjectOverview, SubjectServiceError> {
        let subjects = self.subjects.list_subjects_for_user(caller).await?;
        Ok(SubjectOverview::from_subjects(&subjects))
    }

    async fn owned(&self, caller: &UserId, id: SubjectId) -> Result<Subject, SubjectServiceError> {
        owned_by(self.subjects.get_subject(id).await?, caller).ok_or(SubjectServiceError::NotFound)
    }
}
