//! Subject progress derived from its topics.

use serde::Serialize;

use crate::model::{Subject, Topic, TopicId, percentage};

/// Count completed topics, reading `changed` by its new state instead of the
/// stored one.
///
/// Callers recounting right after a write pass the written topic here so that a
/// stale read of that same row cannot skew the total.
#[must_use]
pub fn count_completed(topics: &[Topic], changed: Option<(TopicId, bool)>) -> u32 {
    let count = topics
        .iter()
        .filter(|topic| match changed {
            Some((id, completed)) if topic.id == id => completed,
            _ => topic.completed,
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Detailed progress for one subject, computed from its actual topics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject: Subject,
    pub topics: Vec<Topic>,
    pub completed_topics: u32,
    pub total_topics: u32,
    pub progress_percentage: f64,
    pub average_mastery: f64,
}

impl SubjectProgress {
    #[must_use]
    pub fn from_topics(subject: Subject, topics: Vec<Topic>) -> Self {
        let completed_topics = count_completed(&topics, None);
        let total_topics = u32::try_from(topics.len()).unwrap_or(u32::MAX);
        let average_mastery = if topics.is_empty() {
            0.0
        } else {
            let sum: f64 = topics
                .iter()
                .map(|t| f64::from(t.mastery_level.value()))
                .sum();
            sum / f64::from(total_topics)
        };

        Self {
            subject,
            topics,
            completed_topics,
            total_topics,
            progress_percentage: percentage(completed_topics, total_topics),
            average_mastery,
        }
    }
}

/// Roll-up across all of a user's subjects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectOverview {
    pub total_subjects: u32,
    pub subjects_with_progress: u32,
    /// Mean of per-subject progress percentages.
    pub average_progress: f64,
}

impl SubjectOverview {
    #[must_use]
    pub fn from_subjects(subjects: &[Subject]) -> Self {
        let total_subjects = u32::try_from(subjects.len()).unwrap_or(u32::MAX);
        let subjects_with_progress = u32::try_from(
            subjects
                .iter()
                .filter(|s| s.completed_topics > 0)
                .count(),
        )
        .unwrap_or(u32::MAX);
        let average_progress = if subjects.is_empty() {
            0.0
        } else {
            subjects
                .iter()
                .map(Subject::progress_percentage)
                .sum::<f64>()
                / f64::from(total_subjects)
        };

        Self {
            total_subjects,
            subjects_with_progress,
            average_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Level, MasteryLevel, SubjectId, UserId};
    use crate::time::fixed_now;

    fn topic(id: u64, completed: bool, mastery: f64) -> Topic {
        Topic {
            id: TopicId::new(id),
            subject_id: SubjectId::new(1),
            user_id: UserId::new("u1").unwrap(),
            name: format!("Topic {id}"),
            description: None,
            difficulty: Difficulty::Medium,
            estimated_hours: 1.0,
            completed,
            last_studied: None,
            mastery_level: MasteryLevel::clamped(mastery),
            created_at: fixed_now(),
        }
    }

    fn subject(total: u32, completed: u32) -> Subject {
        Subject {
            id: SubjectId::new(1),
            user_id: UserId::new("u1").unwrap(),
            name: "Maths".into(),
            description: None,
            difficulty: Difficulty::Hard,
            exam_date: None,
            total_topics: total,
            completed_topics: completed,
            priority: Level::High,
            created_at: fixed_now(),
        }
    }

    #[test]
    fn changed_topic_counts_by_new_state() {
        let topics = vec![topic(1, false, 0.0), topic(2, true, 0.0), topic(3, false, 0.0)];
        assert_eq!(count_completed(&topics, None), 1);
        assert_eq!(count_completed(&topics, Some((TopicId::new(1), true))), 2);
        assert_eq!(count_completed(&topics, Some((TopicId::new(2), false))), 0);
    }

    #[test]
    fn progress_uses_actual_topics() {
        let topics = vec![topic(1, true, 80.0), topic(2, false, 40.0), topic(3, true, 90.0), topic(4, false, 10.0)];
        let progress = SubjectProgress::from_topics(subject(10, 2), topics);
        assert_eq!(progress.completed_topics, 2);
        assert_eq!(progress.total_topics, 4);
        assert!((progress.progress_percentage - 50.0).abs() < f64::EPSILON);
        assert!((progress.average_mastery - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_subject_has_zero_progress() {
        let progress = SubjectProgress::from_topics(subject(0, 0), Vec::new());
        assert_eq!(progress.progress_percentage, 0.0);
        assert_eq!(progress.average_mastery, 0.0);
    }

    #[test]
    fn overview_averages_subject_progress() {
        let overview = SubjectOverview::from_subjects(&[subject(10, 3), subject(4, 0), subject(0, 0)]);
        assert_eq!(overview.total_subjects, 3);
        assert_eq!(overview.subjects_with_progress, 1);
        assert!((overview.average_progress - 10.0).abs() < 1e-9);
        assert_eq!(SubjectOverview::from_subjects(&[]).average_progress, 0.0);
    }
}
