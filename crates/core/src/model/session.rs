use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{StudySessionId, SubjectId, TopicId, UserId};
use crate::model::level::Level;
use crate::model::subject::normalize_optional;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("session already ended")]
    AlreadyEnded,

    #[error("end time is before start time")]
    InvalidTimeRange,
}

/// A block of tracked study time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: StudySessionId,
    pub user_id: UserId,
    pub subject_id: Option<SubjectId>,
    pub topic_id: Option<TopicId>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes between start and end, set when the session ends.
    pub duration: Option<u32>,
    pub focus_level: Option<Level>,
    pub fatigue_level: Option<Level>,
    pub interaction_count: u32,
    pub breaks_count: u32,
    pub completed: bool,
    pub notes: Option<String>,
}

/// Activity counters and self-ratings reported while a session runs.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionActivityPatch {
    pub interaction_count: Option<u32>,
    pub breaks_count: Option<u32>,
    pub focus_level: Option<Level>,
    pub fatigue_level: Option<Level>,
}

impl StudySession {
    pub fn apply_activity(&mut self, patch: SessionActivityPatch) {
        if let Some(count) = patch.interaction_count {
            self.interaction_count = count;
        }
        if let Some(count) = patch.breaks_count {
            self.breaks_count = count;
        }
        if let Some(level) = patch.focus_level {
            self.focus_level = Some(level);
        }
        if let Some(level) = patch.fatigue_level {
            self.fatigue_level = Some(level);
        }
    }

    /// Close the session at `now`, returning its length in minutes.
    ///
    /// The end time is written once; a second call fails.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::AlreadyEnded` if the session has an end time,
    /// or `StudySessionError::InvalidTimeRange` if `now` precedes the start.
    pub fn end(
        &mut self,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<u32, StudySessionError> {
        if self.completed || self.end_time.is_some() {
            return Err(StudySessionError::AlreadyEnded);
        }
        let duration = duration_minutes(self.start_time, now)?;
        self.end_time = Some(now);
        self.duration = Some(duration);
        self.completed = true;
        self.notes = normalize_optional(notes);
        Ok(duration)
    }
}

/// `round((end - start) / 60000)` minutes.
///
/// # Errors
///
/// Returns `StudySessionError::InvalidTimeRange` if `end` is before `start`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn duration_minutes(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u32, StudySessionError> {
    let millis = (end - start).num_milliseconds();
    if millis < 0 {
        return Err(StudySessionError::InvalidTimeRange);
    }
    let minutes = (millis as f64 / 60_000.0).round();
    Ok(minutes.min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn session() -> StudySession {
        StudySession {
            id: StudySessionId::new(1),
            user_id: UserId::new("u1").unwrap(),
            subject_id: None,
            topic_id: None,
            start_time: fixed_now(),
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

    #[test]
    fn duration_rounds_to_nearest_minute() {
        let start = fixed_now();
        assert_eq!(duration_minutes(start, start + Duration::seconds(89)), Ok(1));
        assert_eq!(duration_minutes(start, start + Duration::seconds(90)), Ok(2));
        assert_eq!(duration_minutes(start, start), Ok(0));
    }

    #[test]
    fn ending_marks_completed_and_is_final() {
        let mut s = session();
        let end = fixed_now() + Duration::minutes(45);
        assert_eq!(s.end(end, Some("  good run ".into())), Ok(45));
        assert!(s.completed);
        assert_eq!(s.end_time, Some(end));
        assert_eq!(s.notes.as_deref(), Some("good run"));

        let again = s.end(end + Duration::minutes(5), None);
        assert_eq!(again, Err(StudySessionError::AlreadyEnded));
        assert_eq!(s.end_time, Some(end));
        assert_eq!(s.duration, Some(45));
    }

    #[test]
    fn ending_before_start_is_rejected() {
        let mut s = session();
        let err = s.end(fixed_now() - Duration::minutes(1), None).unwrap_err();
        assert_eq!(err, StudySessionError::InvalidTimeRange);
        assert!(!s.completed);
    }

    #[test]
    fn activity_patch_sets_only_present_fields() {
        let mut s = session();
        s.apply_activity(SessionActivityPatch {
            interaction_count: Some(12),
            focus_level: Some(Level::High),
            ..SessionActivityPatch::default()
        });
        assert_eq!(s.interaction_count, 12);
        assert_eq!(s.focus_level, Some(Level::High));
        assert_eq!(s.fatigue_level, None);
        assert_eq!(s.breaks_count, 0);
    }
}
