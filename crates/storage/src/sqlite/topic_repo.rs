use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{MasteryLevel, SubjectId, Topic, TopicId};

use super::SqliteRepository;
use super::mapping::{
    bool_to_i64, conn, id_to_i64, parse_difficulty, ser, subject_id_from_i64, topic_id_from_i64,
    user_id_from,
};
use crate::repository::{NewTopicRecord, StorageError, TopicRepository};

const TOPIC_COLUMNS: &str = "id, subject_id, user_id, name, description, difficulty, estimated_hours, completed, last_studied, mastery_level, created_at";

#[async_trait::async_trait]
impl TopicRepository for SqliteRepository {
    async fn insert_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO topics (subject_id, user_id, name, description, difficulty, estimated_hours, completed, mastery_level, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7)
            ",
        )
        .bind(id_to_i64("subject_id", topic.subject_id.value())?)
        .bind(topic.user_id.as_str())
        .bind(topic.name)
        .bind(topic.description)
        .bind(topic.difficulty.as_str())
        .bind(topic.estimated_hours)
        .bind(topic.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => conn(other),
        })?;

        topic_id_from_i64(res.last_insert_rowid())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query(&format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?1"))
            .bind(id_to_i64("topic_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(topic_from_row).transpose()
    }

    async fn list_topics_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE subject_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_to_i64("subject_id", subject_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(topic_from_row).collect()
    }

    async fn update_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE topics
            SET name = ?2, description = ?3, difficulty = ?4, estimated_hours = ?5,
                completed = ?6, last_studied = ?7, mastery_level = ?8
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("topic_id", topic.id.value())?)
        .bind(&topic.name)
        .bind(topic.description.as_deref())
        .bind(topic.difficulty.as_str())
        .bind(topic.estimated_hours)
        .bind(bool_to_i64(topic.completed))
        .bind(topic.last_studied)
        .bind(i64::from(topic.mastery_level.value()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM topics WHERE id = ?1")
            .bind(id_to_i64("topic_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn topic_from_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let completed: i64 = row.try_get("completed").map_err(ser)?;
    let mastery: i64 = row.try_get("mastery_level").map_err(ser)?;
    Ok(Topic {
        id: topic_id_from_i64(row.try_get("id").map_err(ser)?)?,
        subject_id: subject_id_from_i64(row.try_get("subject_id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        difficulty: parse_difficulty(&difficulty)?,
        estimated_hours: row.try_get("estimated_hours").map_err(ser)?,
        completed: completed != 0,
        last_studied: row.try_get("last_studied").map_err(ser)?,
        mastery_level: MasteryLevel::clamped(mastery as f64),
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
