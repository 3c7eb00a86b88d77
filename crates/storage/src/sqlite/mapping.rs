use study_core::model::{
    Difficulty, ExplanationDepth, Level, ProfileId, QuizAttemptId, QuizId, StudySessionId,
    SubjectId, TopicId, UserId,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn profile_id_from_i64(v: i64) -> Result<ProfileId, StorageError> {
    Ok(ProfileId::new(i64_to_u64("profile_id", v)?))
}

pub(crate) fn subject_id_from_i64(v: i64) -> Result<SubjectId, StorageError> {
    Ok(SubjectId::new(i64_to_u64("subject_id", v)?))
}

pub(crate) fn topic_id_from_i64(v: i64) -> Result<TopicId, StorageError> {
    Ok(TopicId::new(i64_to_u64("topic_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<StudySessionId, StorageError> {
    Ok(StudySessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn attempt_id_from_i64(v: i64) -> Result<QuizAttemptId, StorageError> {
    Ok(QuizAttemptId::new(i64_to_u64("attempt_id", v)?))
}

pub(crate) fn user_id_from(raw: String) -> Result<UserId, StorageError> {
    UserId::new(raw).ok_or_else(|| StorageError::Serialization("blank user_id".into()))
}

pub(crate) fn parse_level(raw: &str) -> Result<Level, StorageError> {
    Level::parse(raw).map_err(ser)
}

pub(crate) fn parse_difficulty(raw: &str) -> Result<Difficulty, StorageError> {
    Difficulty::parse(raw).map_err(ser)
}

pub(crate) fn parse_depth(raw: &str) -> Result<ExplanationDepth, StorageError> {
    ExplanationDepth::parse(raw).map_err(ser)
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    i64::from(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(matches!(
            subject_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(topic_id_from_i64(9).unwrap(), TopicId::new(9));
    }

    #[test]
    fn unknown_level_text_is_a_serialization_error() {
        assert_eq!(parse_level("high").unwrap(), Level::High);
        assert!(matches!(parse_level("extreme"), Err(StorageError::Serialization(_))));
    }
}
