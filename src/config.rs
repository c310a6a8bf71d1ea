//! Configuration for Timbre studio

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Default provider request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credits seeded into a newly created account
const DEFAULT_STARTING_CREDITS: i64 = 100;

/// Maximum input text length accepted for generation
pub const MAX_TEXT_CHARS: usize = 5000;

/// Timbre studio configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// TTS provider base URL (e.g., `https://tts.example.com`)
    pub provider_url: String,

    /// Bearer token for the TTS provider
    pub provider_api_key: String,

    /// Bounded wait for a single provider call
    pub request_timeout: Duration,

    /// Path to data directory (database)
    pub data_dir: PathBuf,

    /// Credits granted when an account is first created
    pub starting_credits: i64,

    /// Local user id for CLI sessions
    pub user: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `TIMBRE_PROVIDER_URL` (required), `TIMBRE_PROVIDER_API_KEY`
    /// (required), `TIMBRE_DATA_DIR`, `TIMBRE_REQUEST_TIMEOUT_SECS`,
    /// `TIMBRE_STARTING_CREDITS`, and `TIMBRE_USER`.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or no data
    /// directory can be resolved.
    pub fn from_env() -> Result<Self> {
        let provider_url = std::env::var("TIMBRE_PROVIDER_URL")
            .map_err(|_| Error::Config("TIMBRE_PROVIDER_URL is required".to_string()))?;

        let provider_api_key = std::env::var("TIMBRE_PROVIDER_API_KEY")
            .map_err(|_| Error::Config("TIMBRE_PROVIDER_API_KEY is required".to_string()))?;

        let request_timeout = std::env::var("TIMBRE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                Duration::from_secs,
            );

        let starting_credits = std::env::var("TIMBRE_STARTING_CREDITS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STARTING_CREDITS);

        let data_dir = std::env::var("TIMBRE_DATA_DIR").map_or_else(
            |_| default_data_dir(),
            |dir| Ok(PathBuf::from(dir)),
        )?;

        let user = std::env::var("TIMBRE_USER").unwrap_or_else(|_| "local".to_string());

        Ok(Self {
            provider_url,
            provider_api_key,
            request_timeout,
            data_dir,
            starting_credits,
            user,
        })
    }

    /// Path to the `SQLite` database file
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("timbre.db")
    }
}

/// Resolve the platform data directory
fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("dev", "timbre", "timbre")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Config("could not resolve a data directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_is_under_data_dir() {
        let config = Config {
            provider_url: "https://tts.example.com".to_string(),
            provider_api_key: "key".to_string(),
            request_timeout: Duration::from_secs(30),
            data_dir: PathBuf::from("/tmp/timbre"),
            starting_credits: 100,
            user: "local".to_string(),
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/timbre/timbre.db"));
    }
}
