use services::{AppServices, AppServicesError, Clock};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

impl AppState {
    /// Open storage and wire services from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the completion client cannot be initialized.
    pub async fn new(config: &Config) -> Result<Self, AppServicesError> {
        let services = AppServices::new_sqlite(
            &config.db_url,
            Clock::System,
            config.utc_offset,
            config.completion.clone(),
        )
        .await?;

        Ok(Self::from_services(services))
    }

    #[must_use]
    pub fn from_services(services: AppServices) -> Self {
        Self { services }
    }
}
