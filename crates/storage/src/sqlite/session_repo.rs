use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{StudySession, StudySessionId, UserId};

use super::SqliteRepository;
use super::mapping::{
    bool_to_i64, conn, id_to_i64, parse_level, ser, session_id_from_i64, subject_id_from_i64,
    topic_id_from_i64, u32_from_i64, user_id_from,
};
use crate::repository::{NewStudySessionRecord, StorageError, StudySessionRepository};

const SESSION_COLUMNS: &str = "id, user_id, subject_id, topic_id, start_time, end_time, duration, focus_level, fatigue_level, interaction_count, breaks_count, completed, notes";

#[async_trait::async_trait]
impl StudySessionRepository for SqliteRepository {
    async fn insert_session(
        &self,
        session: NewStudySessionRecord,
    ) -> Result<StudySessionId, StorageError> {
        let subject_id = session
            .subject_id
            .map(|id| id_to_i64("subject_id", id.value()))
            .transpose()?;
        let topic_id = session
            .topic_id
            .map(|id| id_to_i64("topic_id", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO study_sessions (user_id, subject_id, topic_id, start_time, interaction_count, breaks_count, completed)
            VALUES (?1, ?2, ?3, ?4, 0, 0, 0)
            ",
        )
        .bind(session.user_id.as_str())
        .bind(subject_id)
        .bind(topic_id)
        .bind(session.start_time)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        session_id_from_i64(res.last_insert_rowid())
    }

    async fn get_session(&self, id: StudySessionId) -> Result<Option<StudySession>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = ?1"
        ))
        .bind(id_to_i64("session_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn update_session(&self, session: &StudySession) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE study_sessions
            SET end_time = ?2, duration = ?3, focus_level = ?4, fatigue_level = ?5,
                interaction_count = ?6, breaks_count = ?7, completed = ?8, notes = ?9
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("session_id", session.id.value())?)
        .bind(session.end_time)
        .bind(session.duration.map(i64::from))
        .bind(session.focus_level.map(|l| l.as_str()))
        .bind(session.fatigue_level.map(|l| l.as_str()))
        .bind(i64::from(session.interaction_count))
        .bind(i64::from(session.breaks_count))
        .bind(bool_to_i64(session.completed))
        .bind(session.notes.as_deref())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn active_session(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StudySession>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions
             WHERE user_id = ?1 AND completed = 0
             ORDER BY id ASC LIMIT 1"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn recent_completed(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySession>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions
             WHERE user_id = ?1 AND completed = 1
             ORDER BY id DESC LIMIT ?2"
        ))
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(session_from_row).collect()
    }

    async fn completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<StudySession>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions
             WHERE user_id = ?1 AND completed = 1 AND start_time >= ?2
             ORDER BY start_time ASC, id ASC"
        ))
        .bind(user_id.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(session_from_row).collect()
    }
}

fn session_from_row(row: &SqliteRow) -> Result<StudySession, StorageError> {
    let focus: Option<String> = row.try_get("focus_level").map_err(ser)?;
    let fatigue: Option<String> = row.try_get("fatigue_level").map_err(ser)?;
    let duration: Option<i64> = row.try_get("duration").map_err(ser)?;
    let completed: i64 = row.try_get("completed").map_err(ser)?;

    Ok(StudySession {
        id: session_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        subject_id: row
            .try_get::<Option<i64>, _>("subject_id")
            .map_err(ser)?
            .map(subject_id_from_i64)
            .transpose()?,
        topic_id: row
            .try_get::<Option<i64>, _>("topic_id")
            .map_err(ser)?
            .map(topic_id_from_i64)
            .transpose()?,
        start_time: row.try_get("start_time").map_err(ser)?,
        end_time: row.try_get("end_time").map_err(ser)?,
        duration: duration.map(|d| u32_from_i64("duration", d)).transpose()?,
        focus_level: focus.as_deref().map(parse_level).transpose()?,
        fatigue_level: fatigue.as_deref().map(parse_level).transpose()?,
        interaction_count: u32_from_i64(
            "interaction_count",
            row.try_get("interaction_count").map_err(ser)?,
        )?,
        breaks_count: u32_from_i64("breaks_count", row.try_get("breaks_count").map_err(ser)?)?,
        completed: completed != 0,
        notes: row.try_get("notes").map_err(ser)?,
    })
}
