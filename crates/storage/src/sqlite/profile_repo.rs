use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{Profile, ProfileId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, parse_depth, parse_level, profile_id_from_i64, ser, u32_from_i64, user_id_from};
use crate::repository::{NewProfileRecord, ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn insert_profile(&self, profile: NewProfileRecord) -> Result<ProfileId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO profiles (user_id, name, study_intensity, preferred_difficulty, daily_study_hours, break_frequency, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(profile.user_id.as_str())
        .bind(profile.name)
        .bind(profile.study_intensity.as_str())
        .bind(profile.preferred_difficulty.as_str())
        .bind(profile.daily_study_hours)
        .bind(i64::from(profile.break_frequency))
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        profile_id_from_i64(res.last_insert_rowid())
    }

    async fn profile_for_user(&self, user_id: &UserId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, study_intensity, preferred_difficulty, daily_study_hours, break_frequency, created_at
            FROM profiles WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE profiles
            SET name = ?2, study_intensity = ?3, preferred_difficulty = ?4, daily_study_hours = ?5, break_frequency = ?6
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("profile_id", profile.id.value())?)
        .bind(&profile.name)
        .bind(profile.study_intensity.as_str())
        .bind(profile.preferred_difficulty.as_str())
        .bind(profile.daily_study_hours)
        .bind(i64::from(profile.break_frequency))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

fn profile_from_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    let intensity: String = row.try_get("study_intensity").map_err(ser)?;
    let depth: String = row.try_get("preferred_difficulty").map_err(ser)?;
    Ok(Profile {
        id: profile_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id: user_id_from(row.try_get("user_id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        study_intensity: parse_level(&intensity)?,
        preferred_difficulty: parse_depth(&depth)?,
        daily_study_hours: row.try_get("daily_study_hours").map_err(ser)?,
        break_frequency: u32_from_i64("break_frequency", row.try_get("break_frequency").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
