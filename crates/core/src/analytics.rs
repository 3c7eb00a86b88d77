//! Study-time analytics folded from completed sessions.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::model::{Level, StudySession};

/// Window used when the caller does not ask for one.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Counts of low / medium / high ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelDistribution {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl LevelDistribution {
    fn record(&mut self, level: Level) {
        let slot = match level {
            Level::High => &mut self.high,
            Level::Medium => &mut self.medium,
            Level::Low => &mut self.low,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Totals for one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStat {
    /// Local date, e.g. `Mon Jan 15 2024`.
    pub date: String,
    pub sessions: u32,
    /// Minutes studied.
    pub duration: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyAnalytics {
    pub total_sessions: u32,
    /// Minutes.
    pub total_study_time: u64,
    /// Minutes per session; 0 without sessions.
    pub average_session_length: f64,
    pub daily_stats: Vec<DailyStat>,
    pub focus_distribution: LevelDistribution,
    pub fatigue_distribution: LevelDistribution,
}

/// Earliest start time included in a window of `days` ending at `now`.
///
/// Returns `None` when the start would fall outside the representable date range.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(days)).and_then(|span| now.checked_sub_signed(span))
}

/// Local date label used for daily grouping.
#[must_use]
pub fn day_label(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%a %b %d %Y").to_string()
}

/// Fold sessions into summary statistics.
///
/// Sessions are expected to be the caller's completed sessions inside the
/// window; missing durations count as 0. Days appear in chronological order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fold_sessions(sessions: &[StudySession], offset: FixedOffset) -> StudyAnalytics {
    let mut ordered: Vec<&StudySession> = sessions.iter().collect();
    ordered.sort_by_key(|s| (s.start_time, s.id));

    let mut out = StudyAnalytics::default();
    for session in ordered {
        let minutes = u64::from(session.duration.unwrap_or(0));
        out.total_sessions = out.total_sessions.saturating_add(1);
        out.total_study_time = out.total_study_time.saturating_add(minutes);

        let label = day_label(session.start_time, offset);
        match out.daily_stats.iter_mut().find(|d| d.date == label) {
            Some(day) => {
                day.sessions = day.sessions.saturating_add(1);
                day.duration = day.duration.saturating_add(minutes);
            }
            None => out.daily_stats.push(DailyStat {
                date: label,
                sessions: 1,
                duration: minutes,
            }),
        }

        if let Some(level) = session.focus_level {
            out.focus_distribution.record(level);
        }
        if let Some(level) = session.fatigue_level {
            out.fatigue_distribution.record(level);
        }
    }

    if out.total_sessions > 0 {
        out.average_session_length = out.total_study_time as f64 / f64::from(out.total_sessions);
    }
    out
}
