use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use storage::repository::{NewTopicRecord, SubjectRepository, TopicRepository};
use study_core::model::{SubjectId, Topic, TopicDraft, TopicId, TopicProgressPatch, UserId};
use study_core::progress::count_completed;

use crate::Clock;
use crate::access::owned_by;
use crate::error::TopicServiceError;

/// One async lock per subject, so that completed-count recomputations for the
/// same subject run one at a time within this process.
#[derive(Default)]
struct SubjectLocks {
    inner: Mutex<HashMap<SubjectId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubjectLocks {
    fn for_subject(&self, id: SubjectId) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(id).or_default())
    }
}

/// Topic writes plus the subject completed-count they keep in sync.
#[derive(Clone)]
pub struct TopicService {
    clock: Clock,
    subjects: Arc<dyn SubjectRepository>,
    topics: Arc<dyn TopicRepository>,
    locks: Arc<SubjectLocks>,
}

/// Which topic just changed, for the recount that follows a write.
enum Change {
    Written(TopicId, bool),
    Deleted(TopicId),
}

impl TopicService {
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
            locks: Arc::new(SubjectLocks::default()),
        }
    }

    /// The caller's topics under a subject, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn list_by_subject(
        &self,
        caller: &UserId,
        subject_id: SubjectId,
    ) -> Result<Vec<Topic>, TopicServiceError> {
        let topics = self.topics.list_topics_for_subject(subject_id).await?;
        Ok(topics
            .into_iter()
            .filter(|t| &t.user_id == caller)
            .collect())
    }

    /// Create a topic under one of the caller's subjects.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::SubjectNotFound` if the subject is missing or foreign.
    /// Returns `TopicServiceError::Validation` for invalid fields.
    /// Returns `TopicServiceError::Storage` if persistence fails.
    pub async fn create(
        &self,
        caller: &UserId,
        subject_id: SubjectId,
        draft: TopicDraft,
    ) -> Result<Topic, TopicServiceError> {
        let draft = draft.validate().map_err(study_core::Error::from)?;
        owned_by(self.subjects.get_subject(subject_id).await?, caller)
            .ok_or(TopicServiceError::SubjectNotFound)?;

        let lock = self.locks.for_subject(subject_id);
        let _guard = lock.lock().await;

        let id = self
            .topics
            .insert_topic(NewTopicRecord::from_draft(
                subject_id,
                caller.clone(),
                draft,
                self.clock.now(),
            ))
            .await?;
        self.recount(subject_id, Change::Written(id, false)).await?;

        self.topics
            .get_topic(id)
            .await?
            .ok_or(TopicServiceError::NotFound)
    }

    /// Record study progress on a topic and stamp its last-studied time.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::NotFound` if the topic is missing or foreign.
    /// Returns `TopicServiceError::Storage` if persistence fails.
    pub async fn update_progress(
        &self,
        caller: &UserId,
        id: TopicId,
        patch: TopicProgressPatch,
    ) -> Result<Topic, TopicServiceError> {
        let subject_id = self.owned(caller, id).await?.subject_id;

        let lock = self.locks.for_subject(subject_id);
        let _guard = lock.lock().await;

        // Re-read under the lock so the write starts from the latest row.
        let mut topic = self.owned(caller, id).await?;
        topic.apply_progress(patch, self.clock.now());
        self.topics.update_topic(&topic).await?;

        if patch.completed.is_some() {
            self.recount(subject_id, Change::Written(id, topic.completed))
                .await?;
        }
        Ok(topic)
    }

    /// Delete a topic and recount its subject.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::NotFound` if the topic is missing or foreign.
    /// Returns `TopicServiceError::Storage` if persistence fails.
    pub async fn delete(&self, caller: &UserId, id: TopicId) -> Result<(), TopicServiceError> {
        let subject_id = self.owned(caller, id).await?.subject_id;

        let lock = self.locks.for_subject(subject_id);
        let _guard = lock.lock().await;

        self.topics.delete_topic(id).await?;
        self.recount(subject_id, Change::Deleted(id)).await
    }

    async fn owned(&self, caller: &UserId, id: TopicId) -> Result<Topic, TopicServiceError> {
        owned_by(self.topics.get_topic(id).await?, caller).ok_or(TopicServiceError::NotFound)
    }

    async fn recount(&self, subject_id: SubjectId, change: Change) -> Result<(), TopicServiceError> {
        let mut topics = self.topics.list_topics_for_subject(subject_id).await?;
        let count = match change {
            Change::Written(id, completed) => count_completed(&topics, Some((id, completed))),
            Change::Deleted(id) => {
                topics.retain(|t| t.id != id);
                count_completed(&topics, None)
            }
        };
        self.subjects
            .set_completed_topics(subject_id, count)
            .await?;
        tracing::debug!(subject_id = %subject_id, completed = count, "subject progress recounted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, NewSubjectRecord};
    use study_core::model::{Difficulty, Level};
    use study_core::time::{fixed_clock, fixed_now};

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        svc: TopicService,
        me: UserId,
        subject_id: SubjectId,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let me = UserId::new("me").unwrap();
        let subject_id = repo
            .insert_subject(NewSubjectRecord {
                user_id: me.clone(),
                name: "Calculus".into(),
                description: None,
                difficulty: Difficulty::Hard,
                exam_date: None,
                total_topics: 3,
                priority: Level::High,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let svc = TopicService::new(fixed_clock(), repo.clone(), repo.clone());
        Fixture {
            repo,
            svc,
            me,
            subject_id,
        }
    }

    fn draft(name: &str) -> TopicDraft {
        TopicDraft {
            name: name.into(),
            description: None,
            difficulty: Difficulty::Medium,
            estimated_hours: 2.0,
        }
    }

    async fn completed_count(f: &Fixture) -> u32 {
        f.repo
            .get_subject(f.subject_id)
            .await
            .unwrap()
            .unwrap()
            .completed_topics
    }

    #[tokio::test]
    async fn completed_count_tracks_toggles_and_deletes() {
        let f = fixture().await;
        let a = f.svc.create(&f.me, f.subject_id, draft("Limits")).await.unwrap();
        let b = f.svc.create(&f.me, f.subject_id, draft("Series")).await.unwrap();
        assert!(!a.completed);
        assert_eq!(a.mastery_level.value(), 0);

        let done = TopicProgressPatch {
            completed: Some(true),
            mastery_level: None,
        };
        f.svc.update_progress(&f.me, a.id, done).await.unwrap();
        f.svc.update_progress(&f.me, b.id, done).await.unwrap();
        assert_eq!(completed_count(&f).await, 2);

        f.svc
            .update_progress(
                &f.me,
                b.id,
                TopicProgressPatch {
                    completed: Some(false),
                    mastery_level: Some(-10.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(completed_count(&f).await, 1);

        f.svc.delete(&f.me, a.id).await.unwrap();
        assert_eq!(completed_count(&f).await, 0);
    }

    #[tokio::test]
    async fn concurrent_toggles_leave_true_count() {
        let f = fixture().await;
        let mut ids = Vec::new();
        for i in 0..6 {
            let topic = f
                .svc
                .create(&f.me, f.subject_id, draft(&format!("T{i}")))
                .await
                .unwrap();
            ids.push(topic.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let svc = f.svc.clone();
                let me = f.me.clone();
                let id = *id;
                tokio::spawn(async move {
                    svc.update_progress(
                        &me,
                        id,
                        TopicProgressPatch {
                            completed: Some(true),
                            mastery_level: Some(150.0),
                        },
                    )
                    .await
                })
            })
            .collect();
        for handle in handles {
            let topic = handle.await.unwrap().unwrap();
            assert_eq!(topic.mastery_level.value(), 100);
        }

        assert_eq!(completed_count(&f).await, 6);
    }

    #[tokio::test]
    async fn progress_stamps_last_studied() {
        let f = fixture().await;
        let topic = f.svc.create(&f.me, f.subject_id, draft("Limits")).await.unwrap();
        assert!(topic.last_studied.is_none());
        let updated = f
            .svc
            .update_progress(&f.me, topic.id, TopicProgressPatch::default())
            .await
            .unwrap();
        assert_eq!(updated.last_studied, Some(fixed_now()));
    }

    #[tokio::test]
    async fn foreign_subject_and_topic_are_hidden() {
        let f = fixture().await;
        let intruder = UserId::new("intruder").unwrap();
        let err = f
            .svc
            .create(&intruder, f.subject_id, draft("Sneaky"))
            .await
            .unwrap_err();
        assert!(matches!(err, TopicServiceError::SubjectNotFound));

        let topic = f.svc.create(&f.me, f.subject_id, draft("Mine")).await.unwrap();
        let err = f.svc.delete(&intruder, topic.id).await.unwrap_err();
        assert!(matches!(err, TopicServiceError::NotFound));
        assert!(f.svc.list_by_subject(&intruder, f.subject_id).await.unwrap().is_empty());
    }
}
