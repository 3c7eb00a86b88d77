use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ProfileId, UserId};
use crate::model::level::{ExplanationDepth, Level};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("profile name cannot be empty")]
    EmptyName,

    #[error("daily study hours must be in (0, 24], got {0}")]
    InvalidDailyHours(f64),

    #[error("break frequency must be > 0 minutes")]
    InvalidBreakFrequency,
}

/// Study preferences for a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub name: String,
    pub study_intensity: Level,
    pub preferred_difficulty: ExplanationDepth,
    pub daily_study_hours: f64,
    pub break_frequency: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a profile is first created.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub name: String,
    pub study_intensity: Level,
    pub preferred_difficulty: ExplanationDepth,
    pub daily_study_hours: f64,
    pub break_frequency: u32,
}

impl ProfileDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` when the name is blank or a numeric preference is out of range.
    pub fn validate(mut self) -> Result<Self, ProfileError> {
        self.name = validate_name(&self.name)?;
        validate_hours(self.daily_study_hours)?;
        validate_break_frequency(self.break_frequency)?;
        Ok(self)
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub study_intensity: Option<Level>,
    pub preferred_difficulty: Option<ExplanationDepth>,
    pub daily_study_hours: Option<f64>,
    pub break_frequency: Option<u32>,
}

impl Profile {
    /// Apply the fields present in `patch`.
    ///
    /// Validation happens before any field is written, so a failed patch leaves
    /// the profile unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if a supplied value is invalid.
    pub fn apply_patch(&mut self, patch: ProfilePatch) -> Result<(), ProfileError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        if let Some(hours) = patch.daily_study_hours {
            validate_hours(hours)?;
        }
        if let Some(minutes) = patch.break_frequency {
            validate_break_frequency(minutes)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(intensity) = patch.study_intensity {
            self.study_intensity = intensity;
        }
        if let Some(depth) = patch.preferred_difficulty {
            self.preferred_difficulty = depth;
        }
        if let Some(hours) = patch.daily_study_hours {
            self.daily_study_hours = hours;
        }
        if let Some(minutes) = patch.break_frequency {
            self.break_frequency = minutes;
        }
        Ok(())
    }
}

fn validate_name(raw: &str) -> Result<String, ProfileError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn validate_hours(hours: f64) -> Result<(), ProfileError> {
    if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
        return Err(ProfileError::InvalidDailyHours(hours));
    }
    Ok(())
}

fn validate_break_frequency(minutes: u32) -> Result<(), ProfileError> {
    if minutes == 0 {
        return Err(ProfileError::InvalidBreakFrequency);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn profile() -> Profile {
        Profile {
            id: ProfileId::new(1),
            user_id: UserId::new("u1").unwrap(),
            name: "Ada".into(),
            study_intensity: Level::Medium,
            preferred_difficulty: ExplanationDepth::Medium,
            daily_study_hours: 2.0,
            break_frequency: 25,
            created_at: fixed_now(),
        }
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut p = profile();
        p.apply_patch(ProfilePatch {
            study_intensity: Some(Level::High),
            ..ProfilePatch::default()
        })
        .unwrap();
        assert_eq!(p.study_intensity, Level::High);
        assert_eq!(p.name, "Ada");
        assert_eq!(p.break_frequency, 25);
    }

    #[test]
    fn invalid_patch_leaves_profile_untouched() {
        let mut p = profile();
        let err = p
            .apply_patch(ProfilePatch {
                name: Some("Grace".into()),
                daily_study_hours: Some(30.0),
                ..ProfilePatch::default()
            })
            .unwrap_err();
        assert_eq!(err, ProfileError::InvalidDailyHours(30.0));
        assert_eq!(p.name, "Ada");
    }

    #[test]
    fn draft_trims_name() {
        let draft = ProfileDraft {
            name: "  Ada ".into(),
            study_intensity: Level::Low,
            preferred_difficulty: ExplanationDepth::Easy,
            daily_study_hours: 1.5,
            break_frequency: 10,
        }
        .validate()
        .unwrap();
        assert_eq!(draft.name, "Ada");
    }
}
