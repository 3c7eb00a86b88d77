use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SubjectId, TopicId, UserId};
use crate::model::level::Difficulty;
use crate::model::subject::normalize_optional;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic name cannot be empty")]
    EmptyName,

    #[error("estimated hours must be a non-negative number, got {0}")]
    InvalidEstimatedHours(f64),
}

/// Mastery score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct MasteryLevel(u8);

impl MasteryLevel {
    pub const MAX: u8 = 100;

    /// Clamp an arbitrary score into range, rounding to the nearest point.
    ///
    /// Non-finite input is treated as 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamped(raw: f64) -> Self {
        if !raw.is_finite() {
            return Self(0);
        }
        Self(raw.round().clamp(0.0, f64::from(Self::MAX)) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// A unit of study under a subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub subject_id: SubjectId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub completed: bool,
    pub last_studied: Option<DateTime<Utc>>,
    pub mastery_level: MasteryLevel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDraft {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
}

impl TopicDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` for a blank name or negative / non-finite hours.
    pub fn validate(mut self) -> Result<Self, TopicError> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return Err(TopicError::EmptyName);
        }
        if !self.estimated_hours.is_finite() || self.estimated_hours < 0.0 {
            return Err(TopicError::InvalidEstimatedHours(self.estimated_hours));
        }
        self.name = trimmed.to_string();
        self.description = normalize_optional(self.description);
        Ok(self)
    }
}

/// Progress update for a topic. Absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgressPatch {
    pub completed: Option<bool>,
    pub mastery_level: Option<f64>,
}

impl Topic {
    /// Apply a progress update and stamp `last_studied`.
    pub fn apply_progress(&mut self, patch: TopicProgressPatch, now: DateTime<Utc>) {
        self.last_studied = Some(now);
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(raw) = patch.mastery_level {
            self.mastery_level = MasteryLevel::clamped(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn mastery_is_clamped_to_range() {
        assert_eq!(MasteryLevel::clamped(150.0).value(), 100);
        assert_eq!(MasteryLevel::clamped(-10.0).value(), 0);
        assert_eq!(MasteryLevel::clamped(42.4).value(), 42);
        assert_eq!(MasteryLevel::clamped(f64::NAN).value(), 0);
    }

    #[test]
    fn progress_update_stamps_last_studied() {
        let mut topic = Topic {
            id: TopicId::new(1),
            subject_id: SubjectId::new(1),
            user_id: UserId::new("u1").unwrap(),
            name: "Limits".into(),
            description: None,
            difficulty: Difficulty::Easy,
            estimated_hours: 2.0,
            completed: false,
            last_studied: None,
            mastery_level: MasteryLevel::default(),
            created_at: fixed_now(),
        };

        topic.apply_progress(
            TopicProgressPatch {
                completed: None,
                mastery_level: Some(150.0),
            },
            fixed_now(),
        );

        assert!(!topic.completed);
        assert_eq!(topic.mastery_level.value(), 100);
        assert_eq!(topic.last_studied, Some(fixed_now()));
    }

    #[test]
    fn draft_rejects_negative_hours() {
        let err = TopicDraft {
            name: "Limits".into(),
            description: None,
            difficulty: Difficulty::Easy,
            estimated_hours: -1.0,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, TopicError::InvalidEstimatedHours(-1.0));
    }
}
