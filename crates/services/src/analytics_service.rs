use std::sync::Arc;

use chrono::FixedOffset;
use storage::repository::StudySessionRepository;
use study_core::analytics::{DEFAULT_WINDOW_DAYS, StudyAnalytics, fold_sessions, window_start};
use study_core::model::UserId;
use study_core::time::offset_from_minutes;

use crate::Clock;
use crate::error::AnalyticsError;

/// Folds a caller's recent completed sessions into summary statistics.
#[derive(Clone)]
pub struct AnalyticsService {
    clock: Clock,
    sessions: Arc<dyn StudySessionRepository>,
    default_offset: FixedOffset,
}

impl AnalyticsService {
    /// `default_offset` decides which local day a session falls on unless the
    /// request carries its own offset.
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn StudySessionRepository>,
        default_offset: FixedOffset,
    ) -> Self {
        Self {
            clock,
            sessions,
            default_offset,
        }
    }

    /// Statistics over the last `days` days (7 when absent or 0).
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidOffset` for an offset of a day or more.
    /// Returns `AnalyticsError::InvalidWindow` if the window reaches past the supported date range.
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn study_analytics(
        &self,
        caller: &UserId,
        days: Option<u32>,
        offset_minutes: Option<i32>,
    ) -> Result<StudyAnalytics, AnalyticsError> {
        let offset = match offset_minutes {
            Some(minutes) => {
                offset_from_minutes(minutes).ok_or(AnalyticsError::InvalidOffset(minutes))?
            }
            None => self.default_offset,
        };
        let days = match days {
            None | Some(0) => DEFAULT_WINDOW_DAYS,
            Some(days) => days,
        };
        let since =
            window_start(self.clock.now(), days).ok_or(AnalyticsError::InvalidWindow(days))?;
        let sessions = self.sessions.completed_since(caller, since).await?;
        Ok(fold_sessions(&sessions, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{InMemoryRepository, NewStudySessionRecord};
    use study_core::model::Level;
    use study_core::time::fixed_now;

    async fn finished(
        repo: &InMemoryRepository,
        user: &UserId,
        start_offset: Duration,
        minutes: i64,
        focus: Option<Level>,
    ) {
        let start = fixed_now() + start_offset;
        let id = repo
            .insert_session(NewStudySessionRecord {
                user_id: user.clone(),
                subject_id: None,
                topic_id: None,
                start_time: start,
            })
            .await
            .unwrap();
        let mut session = repo.get_session(id).await.unwrap().unwrap();
        session.focus_level = focus;
        session.end(start + Duration::minutes(minutes), None).unwrap();
        repo.update_session(&session).await.unwrap();
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn empty_history_yields_zeroes() {
        let repo = Arc::new(InMemoryRepository::new());
        let svc = AnalyticsService::new(Clock::fixed(fixed_now()), repo, utc());
        let stats = svc
            .study_analytics(&UserId::new("me").unwrap(), None, None)
            .await
            .unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.average_session_length, 0.0);
    }

    #[tokio::test]
    async fn window_excludes_old_and_foreign_sessions() {
        let repo = Arc::new(InMemoryRepository::new());
        let me = UserId::new("me").unwrap();
        let other = UserId::new("other").unwrap();
        finished(&repo, &me, Duration::days(-10), 60, None).await;
        finished(&repo, &me, Duration::days(-2), 30, Some(Level::High)).await;
        finished(&repo, &me, Duration::hours(-3), 20, Some(Level::Low)).await;
        finished(&repo, &other, Duration::hours(-1), 90, None).await;

        let svc = AnalyticsService::new(Clock::fixed(fixed_now()), repo, utc());
        let stats = svc.study_analytics(&me, None, None).await.unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_study_time, 50);
        assert_eq!(stats.daily_stats.len(), 2);
        assert_eq!(stats.focus_distribution.high, 1);
        assert_eq!(stats.focus_distribution.low, 1);

        let wide = svc.study_analytics(&me, Some(30), None).await.unwrap();
        assert_eq!(wide.total_sessions, 3);
    }

    #[tokio::test]
    async fn zero_days_uses_the_default_window() {
        let repo = Arc::new(InMemoryRepository::new());
        let me = UserId::new("me").unwrap();
        finished(&repo, &me, Duration::days(-2), 25, None).await;

        let svc = AnalyticsService::new(Clock::fixed(fixed_now()), repo, utc());
        let stats = svc.study_analytics(&me, Some(0), None).await.unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_study_time, 25);
    }

    #[tokio::test]
    async fn oversized_window_is_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        let svc = AnalyticsService::new(Clock::fixed(fixed_now()), repo, utc());
        let err = svc
            .study_analytics(&UserId::new("me").unwrap(), Some(u32::MAX), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidWindow(u32::MAX)));
    }

    #[tokio::test]
    async fn out_of_range_offset_is_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        let svc = AnalyticsService::new(Clock::fixed(fixed_now()), repo, utc());
        let err = svc
            .study_analytics(&UserId::new("me").unwrap(), None, Some(24 * 60))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidOffset(1440)));
    }
}
