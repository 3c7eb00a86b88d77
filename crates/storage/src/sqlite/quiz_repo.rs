use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{
    AttemptAnswer, Quiz, QuizAttempt, QuizAttemptId, QuizId, QuizQuestion, SubjectId,
};

use super::SqliteRepository;
use super::mapping::{
    attempt_id_from_i64, conn, id_to_i64, parse_difficulty, quiz_id_from_i64, ser,
    subject_id_from_i64, topic_id_from_i64, u32_from_i64, user_id_from,
};
use crate::repository::{NewQuizAttemptRecord, NewQuizRecord, QuizRepository, StorageError};

const QUIZ_COLUMNS: &str = "id, user_id, subject_id, topic_id, title, difficulty, questions, created_at";
const ATTEMPT_COLUMNS: &str =
    "id, user_id, quiz_id, score, total_questions, time_spent, answers, completed_at";

fn missing_parent(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        other => conn(other),
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let questions = serde_json::to_string(&quiz.questions).map_err(ser)?;
        let topic_id = quiz
            .topic_id
            .map(|id| id_to_i64("topic_id", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (user_id, subject_id, topic_id, title, difficulty, questions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(quiz.user_id.as_str())
        .bind(id_to_i64("subject_id", quiz.subject_id.value())?)
        .bind(topic_id)
        .bind(quiz.title)
        .bind(quiz.difficulty.as_str())
        .bind(questions)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        quiz_id_from_i64(res.last_insert_rowid())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1"))
            .bind(id_to_i64("quiz_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(quiz_from_row).transpose()
    }

    async fn list_quizzes_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE subject_id = ?1 ORDER BY id DESC"
        ))
        .bind(id_to_i64("subject_id", subject_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(quiz_from_row).collect()
    }

    async fn insert_attempt(
        &self,
        attempt: NewQuizAttemptRecord,
    ) -> Result<QuizAttemptId, StorageError> {
        let answers = serde_json::to_string(&attempt.answers).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO quiz_attempts (user_id, quiz_id, score, total_questions, time_spent, answers, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(attempt.user_id.as_str())
        .bind(id_to_i64("quiz_id", attempt.quiz_id.value())?)
        .bind(i64::from(attempt.score))
        .bind(i64::from(attempt.total_questions))
        .bind(i64::from(attempt.time_spent))
        .bind(answers)
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        attempt_id_from_i64(res.last_insert_rowid())
    }

    async fn list_attempts_for_quiz(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE quiz_id = ?1 ORDER BY id DESC"
        ))
        .bind(id_to_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(attempt_from_row).collect()
    }
}

fn quiz_from_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let questions: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuizQuestion> = serde_json::from_str(&questions).map_err(ser)?;

    Ok(Quiz {
        id: quiz_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        subject_id: subject_id_from_i64(row.try_get("subject_id").map_err(ser)?)?,
        topic_id: row
            .try_get::<Option<i64>, _>("topic_id")
            .map_err(ser)?
            .map(topic_id_from_i64)
            .transpose()?,
        title: row.try_get("title").map_err(ser)?,
        difficulty: parse_difficulty(&difficulty)?,
        questions,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

fn attempt_from_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    let answers: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<AttemptAnswer> = serde_json::from_str(&answers).map_err(ser)?;

    Ok(QuizAttempt {
        id: attempt_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?,
        score: u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        time_spent: u32_from_i64("time_spent", row.try_get("time_spent").map_err(ser)?)?,
        answers,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}
