//! Environment-driven runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;

use site_triage_history::DEFAULT_HISTORY_LIMIT;
use site_triage_vision::{DEFAULT_VISION_ENDPOINT, DEFAULT_VISION_MODEL, VisionConfig};
use thiserror::Error;
use tracing::Level;

use crate::logging::LoggingConfig;

/// Storage root used when `SITE_TRIAGE_STORAGE_DIR` is unset.
pub const DEFAULT_STORAGE_DIR: &str = "storage";

/// Longest thumbnail edge used when `SITE_TRIAGE_THUMBNAIL_MAX` is unset.
pub const DEFAULT_THUMBNAIL_MAX_EDGE: u32 = 1024;

/// Environment variable names.
pub mod keys {
    /// Storage root for images and history.
    pub const STORAGE_DIR: &str = "SITE_TRIAGE_STORAGE_DIR";
    /// Log level.
    pub const LOG_LEVEL: &str = "SITE_TRIAGE_LOG_LEVEL";
    /// JSON log output toggle.
    pub const LOG_JSON: &str = "SITE_TRIAGE_LOG_JSON";
    /// Vision model identifier.
    pub const VISION_MODEL: &str = "SITE_TRIAGE_VISION_MODEL";
    /// Vision service base URL.
    pub const VISION_ENDPOINT: &str = "SITE_TRIAGE_VISION_ENDPOINT";
    /// Vision service API key.
    pub const VISION_API_KEY: &str = "SITE_TRIAGE_VISION_API_KEY";
    /// Maximum retained history entries.
    pub const HISTORY_LIMIT: &str = "SITE_TRIAGE_HISTORY_LIMIT";
    /// Longest thumbnail edge in pixels.
    pub const THUMBNAIL_MAX: &str = "SITE_TRIAGE_THUMBNAIL_MAX";
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root for `images/` and `history.json`.
    pub storage_dir: PathBuf,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Vision client settings.
    pub vision: VisionConfig,
    /// Maximum retained history entries.
    pub history_limit: usize,
    /// Longest thumbnail edge in pixels.
    pub thumbnail_max_edge: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            logging: LoggingConfig::default(),
            vision: VisionConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            thumbnail_max_edge: DEFAULT_THUMBNAIL_MAX_EDGE,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the raw value of
    /// one variable or `None` when unset.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let level = match get(keys::LOG_LEVEL) {
            Some(raw) => Level::from_str(&raw).map_err(|_| invalid(keys::LOG_LEVEL, &raw))?,
            None => Level::INFO,
        };
        let json = match get(keys::LOG_JSON) {
            Some(raw) => parse_flag(keys::LOG_JSON, &raw)?,
            None => false,
        };

        Ok(Self {
            storage_dir: get(keys::STORAGE_DIR)
                .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from),
            logging: LoggingConfig { level, json },
            vision: VisionConfig {
                endpoint: get(keys::VISION_ENDPOINT)
                    .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
                model: get(keys::VISION_MODEL).unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
                api_key: get(keys::VISION_API_KEY),
            },
            history_limit: parse_positive(keys::HISTORY_LIMIT, get(keys::HISTORY_LIMIT))?
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
            thumbnail_max_edge: parse_positive(keys::THUMBNAIL_MAX, get(keys::THUMBNAIL_MAX))?
                .unwrap_or(DEFAULT_THUMBNAIL_MAX_EDGE),
        })
    }
}

/// Parses an on/off flag.
///
/// `1`, `true`, `on`, `yes` enable; `0`, `false`, `off`, `no` disable
/// (case-insensitive).
fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

fn parse_positive<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(invalid(key, &raw)),
    }
}

fn invalid(key: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending raw value.
        value: String,
    },
}
