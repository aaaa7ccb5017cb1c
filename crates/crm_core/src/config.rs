//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Collect process settings consumed by auth, file storage and logging.
//! - Parse environment text into typed values with explicit errors.
//!
//! # Invariants
//! - Unset variables fall back to `EnvironmentConfig::default()`.
//! - Malformed values are rejected instead of silently defaulted.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_IS_SIGN_UP_DISABLED: &str = "IS_SIGN_UP_DISABLED";
pub const ENV_STORAGE_LOCAL_PATH: &str = "STORAGE_LOCAL_PATH";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_FRONT_BASE_URL: &str = "FRONT_BASE_URL";

const DEFAULT_STORAGE_LOCAL_PATH: &str = ".local-storage";
const DEFAULT_FRONT_BASE_URL: &str = "http://localhost:3001";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Rejects creation of brand-new workspaces when set.
    pub is_sign_up_disabled: bool,
    /// Root directory for uploaded files.
    pub storage_local_path: PathBuf,
    /// Log level passed to `init_logging`; `None` uses the build default.
    pub log_level: Option<String>,
    /// Front-end origin used to build record show-page links.
    pub front_base_url: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            is_sign_up_disabled: false,
            storage_local_path: PathBuf::from(DEFAULT_STORAGE_LOCAL_PATH),
            log_level: None,
            front_base_url: DEFAULT_FRONT_BASE_URL.to_string(),
        }
    }
}

impl EnvironmentConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_IS_SIGN_UP_DISABLED) {
            config.is_sign_up_disabled = parse_bool(ENV_IS_SIGN_UP_DISABLED, &raw)?;
        }
        if let Some(raw) = non_blank(lookup(ENV_STORAGE_LOCAL_PATH)) {
            config.storage_local_path = PathBuf::from(raw);
        }
        config.log_level = non_blank(lookup(ENV_LOG_LEVEL));
        if let Some(raw) = non_blank(lookup(ENV_FRONT_BASE_URL)) {
            config.front_base_url = raw.trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    /// Effective log level for this process.
    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| crate::logging::default_log_level())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Configuration parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBoolean { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBoolean { key, value } => {
                write!(f, "`{key}` must be a boolean, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}
