//! Ownership checks shared by the services.
//!
//! A record owned by someone else is indistinguishable from a missing one.

use study_core::model::{Profile, Quiz, QuizAttempt, StudySession, Subject, Topic, UserId};

pub(crate) trait Owned {
    fn owner(&self) -> &UserId;
}

macro_rules! owned_by_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Owned for $ty {
                fn owner(&self) -> &UserId {
                    &self.user_id
                }
            }
        )+
    };
}

owned_by_field!(Profile, Subject, Topic, StudySession, Quiz, QuizAttempt);

/// Keep `record` only if `caller` owns it.
pub(crate) fn owned_by<T: Owned>(record: Option<T>, caller: &UserId) -> Option<T> {
    record.filter(|r| r.owner() == caller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Difficulty, Level, SubjectId};
    use study_core::time::fixed_now;

    #[test]
    fn foreign_records_are_hidden() {
        let subject = Subject {
            id: SubjectId::new(1),
            user_id: UserId::new("owner").unwrap(),
            name: "History".into(),
            description: None,
            difficulty: Difficulty::Easy,
            exam_date: None,
            total_topics: 0,
            completed_topics: 0,
            priority: Level::Low,
            created_at: fixed_now(),
        };
        let stranger = UserId::new("stranger").unwrap();
        let owner = UserId::new("owner").unwrap();
        assert!(owned_by(Some(subject.clone()), &stranger).is_none());
        assert!(owned_by(Some(subject), &owner).is_some());
        assert!(owned_by::<Subject>(None, &owner).is_none());
    }
}
