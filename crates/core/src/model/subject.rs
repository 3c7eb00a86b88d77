use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SubjectId, UserId};
use crate::model::level::{Difficulty, Level};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,
}

/// A subject on a user's syllabus.
///
/// `completed_topics` is derived from the subject's topics and only written by
/// progress recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub exam_date: Option<DateTime<Utc>>,
    pub total_topics: u32,
    pub completed_topics: u32,
    pub priority: Level,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub exam_date: Option<DateTime<Utc>>,
    pub total_topics: u32,
    pub priority: Level,
}

impl SubjectDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` if the name is blank.
    pub fn validate(mut self) -> Result<Self, SubjectError> {
        self.name = validate_name(&self.name)?;
        self.description = normalize_optional(self.description);
        Ok(self)
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub exam_date: Option<DateTime<Utc>>,
    pub total_topics: Option<u32>,
    pub priority: Option<Level>,
}

impl Subject {
    /// Apply the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` if a blank name is supplied.
    pub fn apply_patch(&mut self, patch: SubjectPatch) -> Result<(), SubjectError> {
        if let Some(name) = patch.name.as_deref() {
            self.name = validate_name(name)?;
        }
        if patch.description.is_some() {
            self.description = normalize_optional(patch.description);
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(exam_date) = patch.exam_date {
            self.exam_date = Some(exam_date);
        }
        if let Some(total) = patch.total_topics {
            self.total_topics = total;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        Ok(())
    }

    /// Share of planned topics completed, in percent. Zero when no topics are planned.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        percentage(self.completed_topics, self.total_topics)
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
#[must_use]
pub fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

/// Display order for a subject list: priority high to low, then nearest exam
/// when both subjects have one, otherwise oldest first.
#[must_use]
pub fn compare_for_listing(a: &Subject, b: &Subject) -> Ordering {
    if a.priority != b.priority {
        return b.priority.cmp(&a.priority);
    }
    if let (Some(x), Some(y)) = (a.exam_date, b.exam_date) {
        return x.cmp(&y);
    }
    a.created_at.cmp(&b.created_at)
}

fn validate_name(raw: &str) -> Result<String, SubjectError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SubjectError::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn subject(id: u64, priority: Level) -> Subject {
        Subject {
            id: SubjectId::new(id),
            user_id: UserId::new("u1").unwrap(),
            name: format!("Subject {id}"),
            description: None,
            difficulty: Difficulty::Medium,
            exam_date: None,
            total_topics: 10,
            completed_topics: 3,
            priority,
            created_at: fixed_now() + Duration::minutes(i64::try_from(id).unwrap()),
        }
    }

    #[test]
    fn progress_is_thirty_percent() {
        assert!((subject(1, Level::Low).progress_percentage() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_is_zero_without_planned_topics() {
        let mut s = subject(1, Level::Low);
        s.total_topics = 0;
        assert_eq!(s.progress_percentage(), 0.0);
    }

    #[test]
    fn listing_order_prefers_priority_then_exam_then_age() {
        let mut soon = subject(3, Level::Medium);
        soon.exam_date = Some(fixed_now() + Duration::days(2));
        let mut later = subject(2, Level::Medium);
        later.exam_date = Some(fixed_now() + Duration::days(9));
        let high = subject(4, Level::High);
        let old_low = subject(1, Level::Low);
        let new_low = subject(5, Level::Low);

        let mut list = vec![new_low, later, old_low, high, soon];
        list.sort_by(compare_for_listing);
        let ids: Vec<u64> = list.iter().map(|s| s.id.value()).collect();
        assert_eq!(ids, vec![4, 3, 2, 1, 5]);
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut s = subject(1, Level::Low);
        s.apply_patch(SubjectPatch {
            total_topics: Some(12),
            ..SubjectPatch::default()
        })
        .unwrap();
        assert_eq!(s.total_topics, 12);
        assert_eq!(s.name, "Subject 1");
        assert_eq!(s.priority, Level::Low);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let mut s = subject(1, Level::Low);
        let err = s
            .apply_patch(SubjectPatch {
                name: Some("  ".into()),
                ..SubjectPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, SubjectError::EmptyName);
    }
}
