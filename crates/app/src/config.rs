use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use chrono::FixedOffset;
use services::{CompletionError, ai::CompletionConfig};
use study_core::time::offset_from_minutes;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_DB_URL: &str = "sqlite://study.sqlite3";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {raw:?}: {reason}")]
    Invalid {
        key: &'static str,
        raw: String,
        reason: String,
    },

    #[error("STUDY_UTC_OFFSET_MINUTES must be within a day, got {0}")]
    OffsetOutOfRange(i32),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Server settings read from `STUDY_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub bind: SocketAddr,
    /// Offset used to group sessions into local days when a request gives none.
    pub utc_offset: FixedOffset,
    /// `None` leaves the AI endpoints disabled.
    pub completion: Option<CompletionConfig>,
}

impl Config {
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn load() -> Result<Self, ConfigError> {
        let db_url = normalize_sqlite_url(
            var("STUDY_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
        );
        let bind = try_load("STUDY_BIND", DEFAULT_BIND)?;
        let minutes: i32 = try_load("STUDY_UTC_OFFSET_MINUTES", "0")?;
        let utc_offset =
            offset_from_minutes(minutes).ok_or(ConfigError::OffsetOutOfRange(minutes))?;

        let completion = CompletionConfig::from_env()?;
        match &completion {
            Some(config) => info!(model = config.model(), "AI features enabled"),
            None => warn!("STUDY_AI_API_KEY not set, AI features disabled"),
        }

        Ok(Self {
            db_url,
            bind,
            utc_offset,
            completion,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        raw,
    })
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_become_absolute() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/study.db".into()),
            "sqlite:///tmp/study.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/lib/study.db".into()),
            "sqlite:///var/lib/study.db"
        );

        let relative = normalize_sqlite_url("data/study.db".into());
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("data/study.db"));
    }
}
