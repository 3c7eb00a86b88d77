use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use study_core::model::{
    AttemptAnswer, Difficulty, ExplanationDepth, Level, MasteryLevel, Profile, ProfileDraft,
    ProfileId, Quiz, QuizAttempt, QuizAttemptId, QuizId, QuizQuestion, StudySession,
    StudySessionId, Subject, SubjectDraft, SubjectId, Topic, TopicDraft, TopicId, UserId,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── INSERT RECORDS ────────────────────────────────────────────────────────────
//

/// Insert payload for a profile; the row id is assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewProfileRecord {
    pub user_id: UserId,
    pub name: String,
    pub study_intensity: Level,
    pub preferred_difficulty: ExplanationDepth,
    pub daily_study_hours: f64,
    pub break_frequency: u32,
    pub created_at: DateTime<Utc>,
}

impl NewProfileRecord {
    #[must_use]
    pub fn from_draft(user_id: UserId, draft: ProfileDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name: draft.name,
            study_intensity: draft.study_intensity,
            preferred_difficulty: draft.preferred_difficulty,
            daily_study_hours: draft.daily_study_hours,
            break_frequency: draft.break_frequency,
            created_at,
        }
    }

    fn into_profile(self, id: ProfileId) -> Profile {
        Profile {
            id,
            user_id: self.user_id,
            name: self.name,
            study_intensity: self.study_intensity,
            preferred_difficulty: self.preferred_difficulty,
            daily_study_hours: self.daily_study_hours,
            break_frequency: self.break_frequency,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSubjectRecord {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub exam_date: Option<DateTime<Utc>>,
    pub total_topics: u32,
    pub priority: Level,
    pub created_at: DateTime<Utc>,
}

impl NewSubjectRecord {
    #[must_use]
    pub fn from_draft(user_id: UserId, draft: SubjectDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name: draft.name,
            description: draft.description,
            difficulty: draft.difficulty,
            exam_date: draft.exam_date,
            total_topics: draft.total_topics,
            priority: draft.priority,
            created_at,
        }
    }

    fn into_subject(self, id: SubjectId) -> Subject {
        Subject {
            id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            difficulty: self.difficulty,
            exam_date: self.exam_date,
            total_topics: self.total_topics,
            completed_topics: 0,
            priority: self.priority,
            created_at: self.created_at,
        }
    }
}

/// New topics always start incomplete with zero mastery.
#[derive(Debug, Clone)]
pub struct NewTopicRecord {
    pub subject_id: SubjectId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub created_at: DateTime<Utc>,
}

impl NewTopicRecord {
    #[must_use]
    pub fn from_draft(
        subject_id: SubjectId,
        user_id: UserId,
        draft: TopicDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            user_id,
            name: draft.name,
            description: draft.description,
            difficulty: draft.difficulty,
            estimated_hours: draft.estimated_hours,
            created_at,
        }
    }

    fn into_topic(self, id: TopicId) -> Topic {
        Topic {
            id,
            subject_id: self.subject_id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            difficulty: self.difficulty,
            estimated_hours: self.estimated_hours,
            completed: false,
            last_studied: None,
            mastery_level: MasteryLevel::default(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStudySessionRecord {
    pub user_id: UserId,
    pub subject_id: Option<SubjectId>,
    pub topic_id: Option<TopicId>,
    pub start_time: DateTime<Utc>,
}

impl NewStudySessionRecord {
    fn into_session(self, id: StudySessionId) -> StudySession {
        StudySession {
            id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            topic_id: self.topic_id,
            start_time: self.start_time,
            end_time: None,
            duration: None,
            focus_level: None,
            fatigue_level: None,
            interaction_count: 0,
            breaks_count: 0,
            completed: false,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQuizRecord {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub topic_id: Option<TopicId>,
    pub title: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
}

impl NewQuizRecord {
    fn into_quiz(self, id: QuizId) -> Quiz {
        Quiz {
            id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            topic_id: self.topic_id,
            title: self.title,
            difficulty: self.difficulty,
            questions: self.questions,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQuizAttemptRecord {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent: u32,
    pub answers: Vec<AttemptAnswer>,
    pub completed_at: DateTime<Utc>,
}

impl NewQuizAttemptRecord {
    fn into_attempt(self, id: QuizAttemptId) -> QuizAttempt {
        QuizAttempt {
            id,
            user_id: self.user_id,
            quiz_id: self.quiz_id,
            score: self.score,
            total_questions: self.total_questions,
            time_spent: self.time_spent,
            answers: self.answers,
            completed_at: self.completed_at,
        }
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already has a profile.
    async fn insert_profile(&self, profile: NewProfileRecord) -> Result<ProfileId, StorageError>;

    /// Fetch the profile owned by `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn profile_for_user(&self, user_id: &UserId) -> Result<Option<Profile>, StorageError>;

    /// Overwrite the mutable fields of an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist.
    async fn update_profile(&self, profile: &Profile) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Insert a subject with a completed count of zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the subject cannot be stored.
    async fn insert_subject(&self, subject: NewSubjectRecord) -> Result<SubjectId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError>;

    /// All subjects owned by `user_id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_subjects_for_user(&self, user_id: &UserId)
    -> Result<Vec<Subject>, StorageError>;

    /// Overwrite the user-editable fields of a subject.
    ///
    /// Leaves `completed_topics` alone; use [`SubjectRepository::set_completed_topics`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the subject does not exist.
    async fn update_subject(&self, subject: &Subject) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the subject does not exist.
    async fn set_completed_topics(&self, id: SubjectId, count: u32) -> Result<(), StorageError>;

    /// Delete a subject together with its topics and quizzes.
    ///
    /// Sessions that referenced the subject keep their history with the
    /// reference cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the subject does not exist.
    async fn delete_subject(&self, id: SubjectId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn insert_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError>;

    /// Topics of a subject in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_topics_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Topic>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the topic does not exist.
    async fn update_topic(&self, topic: &Topic) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the topic does not exist.
    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait StudySessionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(
        &self,
        session: NewStudySessionRecord,
    ) -> Result<StudySessionId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_session(&self, id: StudySessionId) -> Result<Option<StudySession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn update_session(&self, session: &StudySession) -> Result<(), StorageError>;

    /// Oldest session of `user_id` that has not been ended.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn active_session(&self, user_id: &UserId)
    -> Result<Option<StudySession>, StorageError>;

    /// Most recently created completed sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn recent_completed(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySession>, StorageError>;

    /// Completed sessions that started at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// Quizzes of a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quizzes_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn insert_attempt(
        &self,
        attempt: NewQuizAttemptRecord,
    ) -> Result<QuizAttemptId, StorageError>;

    /// Attempts for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts_for_quiz(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    next_id: u64,
    profiles: HashMap<ProfileId, Profile>,
    subjects: HashMap<SubjectId, Subject>,
    topics: HashMap<TopicId, Topic>,
    sessions: HashMap<StudySessionId, StudySession>,
    quizzes: HashMap<QuizId, Quiz>,
    attempts: HashMap<QuizAttemptId, QuizAttempt>,
}

impl Tables {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids are drawn from one counter, so insertion order matches id order.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn sorted_by_id<K: Ord + Copy, V: Clone>(
    rows: impl Iterator<Item = (K, V)>,
) -> Vec<V> {
    let mut rows: Vec<(K, V)> = rows.collect();
    rows.sort_by_key(|(k, _)| *k);
    rows.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn insert_profile(&self, profile: NewProfileRecord) -> Result<ProfileId, StorageError> {
        let mut guard = self.lock()?;
        if guard.profiles.values().any(|p| p.user_id == profile.user_id) {
            return Err(StorageError::Conflict);
        }
        let id = ProfileId::new(guard.allocate());
        guard.profiles.insert(id, profile.into_profile(id));
        Ok(id)
    }

    async fn profile_for_user(&self, user_id: &UserId) -> Result<Option<Profile>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .profiles
            .values()
            .find(|p| &p.user_id == user_id)
            .cloned())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .profiles
            .get_mut(&profile.id)
            .ok_or(StorageError::NotFound)?;
        *slot = profile.clone();
        Ok(())
    }
}

#[async_trait]
impl SubjectRepository for InMemoryRepository {
    async fn insert_subject(&self, subject: NewSubjectRecord) -> Result<SubjectId, StorageError> {
        let mut guard = self.lock()?;
        let id = SubjectId::new(guard.allocate());
        guard.subjects.insert(id, subject.into_subject(id));
        Ok(id)
    }

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError> {
        Ok(self.lock()?.subjects.get(&id).cloned())
    }

    async fn list_subjects_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Subject>, StorageError> {
        let guard = self.lock()?;
        Ok(sorted_by_id(
            guard
                .subjects
                .iter()
                .filter(|(_, s)| &s.user_id == user_id)
                .map(|(k, v)| (*k, v.clone())),
        ))
    }

    async fn update_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .subjects
            .get_mut(&subject.id)
            .ok_or(StorageError::NotFound)?;
        let completed = slot.completed_topics;
        *slot = subject.clone();
        slot.completed_topics = completed;
        Ok(())
    }

    async fn set_completed_topics(&self, id: SubjectId, count: u32) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.subjects.get_mut(&id).ok_or(StorageError::NotFound)?;
        slot.completed_topics = count;
        Ok(())
    }

    async fn delete_subject(&self, id: SubjectId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.subjects.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        guard.topics.retain(|_, t| t.subject_id != id);

        let removed: Vec<QuizId> = guard
            .quizzes
            .values()
            .filter(|q| q.subject_id == id)
            .map(|q| q.id)
            .collect();
        guard.quizzes.retain(|_, q| q.subject_id != id);
        guard.attempts.retain(|_, a| !removed.contains(&a.quiz_id));

        for session in guard.sessions.values_mut() {
            if session.subject_id == Some(id) {
                session.subject_id = None;
                session.topic_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn insert_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.subjects.contains_key(&topic.subject_id) {
            return Err(StorageError::NotFound);
        }
        let id = TopicId::new(guard.allocate());
        guard.topics.insert(id, topic.into_topic(id));
        Ok(id)
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        Ok(self.lock()?.topics.get(&id).cloned())
    }

    async fn list_topics_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Topic>, StorageError> {
        let guard = self.lock()?;
        Ok(sorted_by_id(
            guard
                .topics
                .iter()
                .filter(|(_, t)| t.subject_id == subject_id)
                .map(|(k, v)| (*k, v.clone())),
        ))
    }

    async fn update_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .topics
            .get_mut(&topic.id)
            .ok_or(StorageError::NotFound)?;
        *slot = topic.clone();
        Ok(())
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.topics.remove(&id).ok_or(StorageError::NotFound)?;
        for session in guard.sessions.values_mut() {
            if session.topic_id == Some(id) {
                session.topic_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StudySessionRepository for InMemoryRepository {
    async fn insert_session(
        &self,
        session: NewStudySessionRecord,
    ) -> Result<StudySessionId, StorageError> {
        let mut guard = self.lock()?;
        let id = StudySessionId::new(guard.allocate());
        guard.sessions.insert(id, session.into_session(id));
        Ok(id)
    }

    async fn get_session(&self, id: StudySessionId) -> Result<Option<StudySession>, StorageError> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    async fn update_session(&self, session: &StudySession) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .sessions
            .get_mut(&session.id)
            .ok_or(StorageError::NotFound)?;
        *slot = session.clone();
        Ok(())
    }

    async fn active_session(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StudySession>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .sessions
            .values()
            .filter(|s| &s.user_id == user_id && !s.completed)
            .min_by_key(|s| s.id)
            .cloned())
    }

    async fn recent_completed(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySession>, StorageError> {
        let guard = self.lock()?;
        let mut rows = sorted_by_id(
            guard
                .sessions
                .iter()
                .filter(|(_, s)| &s.user_id == user_id && s.completed)
                .map(|(k, v)| (*k, v.clone())),
        );
        rows.reverse();
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<StudySession> = guard
            .sessions
            .values()
            .filter(|s| &s.user_id == user_id && s.completed && s.start_time >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.start_time, s.id));
        Ok(rows)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.subjects.contains_key(&quiz.subject_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuizId::new(guard.allocate());
        guard.quizzes.insert(id, quiz.into_quiz(id));
        Ok(id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.lock()?;
        let mut rows = sorted_by_id(
            guard
                .quizzes
                .iter()
                .filter(|(_, q)| q.subject_id == subject_id)
                .map(|(k, v)| (*k, v.clone())),
        );
        rows.reverse();
        Ok(rows)
    }

    async fn insert_attempt(
        &self,
        attempt: NewQuizAttemptRecord,
    ) -> Result<QuizAttemptId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&attempt.quiz_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuizAttemptId::new(guard.allocate());
        guard.attempts.insert(id, attempt.into_attempt(id));
        Ok(id)
    }

    async fn list_attempts_for_quiz(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self.lock()?;
        let mut rows = sorted_by_id(
            guard
                .attempts
                .iter()
                .filter(|(_, a)| a.quiz_id == quiz_id)
                .map(|(k, v)| (*k, v.clone())),
        );
        rows.reverse();
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub sessions: Arc<dyn StudySessionRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            profiles: Arc::new(repo.clone()),
            subjects: Arc::new(repo.clone()),
            topics: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            quizzes: Arc::new(repo),
        }
    }
}
