use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{Subject, SubjectId, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, id_to_i64, parse_difficulty, parse_level, ser, subject_id_from_i64, u32_from_i64,
    user_id_from,
};
use crate::repository::{NewSubjectRecord, StorageError, SubjectRepository};

const SUBJECT_COLUMNS: &str = "id, user_id, name, description, difficulty, exam_date, total_topics, completed_topics, priority, created_at";

#[async_trait::async_trait]
impl SubjectRepository for SqliteRepository {
    async fn insert_subject(&self, subject: NewSubjectRecord) -> Result<SubjectId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO subjects (user_id, name, description, difficulty, exam_date, total_topics, completed_topics, priority, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
            ",
        )
        .bind(subject.user_id.as_str())
        .bind(subject.name)
        .bind(subject.description)
        .bind(subject.difficulty.as_str())
        .bind(subject.exam_date)
        .bind(i64::from(subject.total_topics))
        .bind(subject.priority.as_str())
        .bind(subject.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        subject_id_from_i64(res.last_insert_rowid())
    }

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?1"))
            .bind(id_to_i64("subject_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(subject_from_row).transpose()
    }

    async fn list_subjects_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Subject>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE user_id = ?1 ORDER BY id ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(subject_from_row).collect()
    }

    async fn update_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE subjects
            SET name = ?2, description = ?3, difficulty = ?4, exam_date = ?5, total_topics = ?6, priority = ?7
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("subject_id", subject.id.value())?)
        .bind(&subject.name)
        .bind(subject.description.as_deref())
        .bind(subject.difficulty.as_str())
        .bind(subject.exam_date)
        .bind(i64::from(subject.total_topics))
        .bind(subject.priority.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_completed_topics(&self, id: SubjectId, count: u32) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE subjects SET completed_topics = ?2 WHERE id = ?1")
            .bind(id_to_i64("subject_id", id.value())?)
            .bind(i64::from(count))
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_subject(&self, id: SubjectId) -> Result<(), StorageError> {
        // Topics, quizzes and attempts cascade; sessions are detached by the
        // foreign keys.
        let res = sqlx::query("DELETE FROM subjects WHERE id = ?1")
            .bind(id_to_i64("subject_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

fn subject_from_row(row: &SqliteRow) -> Result<Subject, StorageError> {
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let priority: String = row.try_get("priority").map_err(ser)?;
    Ok(Subject {
        id: subject_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        difficulty: parse_difficulty(&difficulty)?,
        exam_date: row.try_get("exam_date").map_err(ser)?,
        total_topics: u32_from_i64("total_topics", row.try_get("total_topics").map_err(ser)?)?,
        completed_topics: u32_from_i64(
            "completed_topics",
            row.try_get("completed_topics").map_err(ser)?,
        )?,
        priority: parse_level(&priority)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
