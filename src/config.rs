use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use directories::ProjectDirs;
use tracing::{info, warn};
use url::Url;

use crate::api::error::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Startup configuration, resolved once and passed to whatever needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        let raw_url = var("SURVEY_API_URL").unwrap_or_else(|| {
            info!("SURVEY_API_URL not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        Ok(Self {
            api_base_url: Self::normalize_base_url(&raw_url)?,
            timeout_secs: try_load("SURVEY_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            data_dir: var("SURVEY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        })
    }

    /// Validates the base URL and strips trailing slashes.
    pub fn normalize_base_url(raw: &str) -> Result<String, Error> {
        let trimmed = raw.trim();
        Url::parse(trimmed).map_err(|e| Error::Config(format!("invalid API URL '{trimmed}': {e}")))?;
        Ok(trimmed.trim_end_matches('/').to_string())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}; using default: {default}");
            default
        }),
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("org", "survey-vote", "survey-vote")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            warn!("No platform data directory available, using temp dir");
            env::temp_dir().join("survey-vote")
        })
}
