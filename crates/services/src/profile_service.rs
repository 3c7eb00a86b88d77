use std::sync::Arc;

use storage::repository::{NewProfileRecord, ProfileRepository, StorageError};
use study_core::model::{Profile, ProfileDraft, ProfilePatch, UserId};

use crate::Clock;
use crate::error::ProfileServiceError;

/// Reads and writes the caller's study profile.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { clock, profiles }
    }

    /// The caller's profile, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if repository access fails.
    pub async fn current(&self, caller: &UserId) -> Result<Option<Profile>, ProfileServiceError> {
        Ok(self.profiles.profile_for_user(caller).await?)
    }

    /// Create the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::AlreadyExists` if the caller has a profile,
    /// `ProfileServiceError::Validation` for invalid fields, or
    /// `ProfileServiceError::Storage` if persistence fails.
    pub async fn create(
        &self,
        caller: &UserId,
        draft: ProfileDraft,
    ) -> Result<Profile, ProfileServiceError> {
        let draft = draft.validate().map_err(study_core::Error::from)?;
        let record = NewProfileRecord::from_draft(caller.clone(), draft, self.clock.now());
        match self.profiles.insert_profile(record).await {
            Ok(_) => {}
            Err(StorageError::Conflict) => return Err(ProfileServiceError::AlreadyExists),
            Err(other) => return Err(other.into()),
        }
        self.profiles
            .profile_for_user(caller)
            .await?
            .ok_or(ProfileServiceError::NotFound)
    }

    /// Apply a partial update to the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotFound` if the caller has no profile,
    /// `ProfileServiceError::Validation` for invalid fields, or
    /// `ProfileServiceError::Storage` if persistence fails.
    pub async fn update(
        &self,
        caller: &UserId,
        patch: ProfilePatch,
    ) -> Result<Profile, ProfileServiceError> {
        let mut profile = self
            .profiles
            .profile_for_user(caller)
            .await?
            .ok_or(ProfileServiceError::NotFound)?;
        profile
            .apply_patch(patch)
            .map_err(study_core::Error::from)?;
        self.profiles.update_profile(&profile).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use study_core::model::{ExplanationDepth, Level};
    use study_core::time::fixed_clock;

    fn service() -> ProfileService {
        ProfileService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    fn draft() -> ProfileDraft {
        ProfileDraft {
            name: "  Grace ".into(),
            study_intensity: Level::Medium,
            preferred_difficulty: ExplanationDepth::Easy,
            daily_study_hours: 2.0,
            break_frequency: 25,
        }
    }

    #[tokio::test]
    async fn create_then_conflict() {
        let svc = service();
        let caller = UserId::new("grace").unwrap();

        assert!(svc.current(&caller).await.unwrap().is_none());
        let profile = svc.create(&caller, draft()).await.unwrap();
        assert_eq!(profile.name, "Grace");

        let err = svc.create(&caller, draft()).await.unwrap_err();
        assert!(matches!(err, ProfileServiceError::AlreadyExists));
    }

    #[tokio::test]
    async fn update_requires_existing_profile() {
        let svc = service();
        let caller = UserId::new("grace").unwrap();

        let err = svc
            .update(&caller, ProfilePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileServiceError::NotFound));

        svc.create(&caller, draft()).await.unwrap();
        let updated = svc
            .update(
                &caller,
                ProfilePatch {
                    study_intensity: Some(Level::High),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.study_intensity, Level::High);
        assert_eq!(updated.break_frequency, 25);
    }

    #[tokio::test]
    async fn invalid_hours_are_rejected() {
        let svc = service();
        let caller = UserId::new("grace").unwrap();
        let mut bad = draft();
        bad.daily_study_hours = 30.0;
        let err = svc.create(&caller, bad).await.unwrap_err();
        assert!(matches!(err, ProfileServiceError::Validation(_)));
    }
}
