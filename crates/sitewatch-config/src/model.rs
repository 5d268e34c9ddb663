//! Resolved configuration types.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{self, ConfigFormat};

/// Default seconds between the starts of two check cycles.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
/// Default number of consecutive failures before a target is down.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 1;

/// A fully resolved config snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker_name: Option<String>,
    pub telegram: TelegramConfig,
    #[serde(rename = "global_defaults")]
    pub defaults: GlobalDefaults,
    pub targets: Vec<TargetConfig>,
}

/// Telegram Bot API credentials.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Values applied to targets that leave a field unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalDefaults {
    pub interval_seconds: u64,
    pub timeout_seconds: f64,
    pub failure_threshold: u32,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl GlobalDefaults {
    /// Cycle interval, measured from one cycle start to the next.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// One monitored HTTP(S) endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetConfig {
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub timeout_seconds: f64,
    pub failure_threshold: u32,
}

impl TargetConfig {
    /// Request timeout for this target.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    /// Key identifying this target's state across cycles.
    pub fn key(&self) -> TargetKey {
        TargetKey {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

/// Composite (name, url) identity of a target.
///
/// Two entries with the same name but different URLs (or the reverse)
/// are distinct targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub name: String,
    pub url: String,
}

impl AppConfig {
    /// Read, parse and validate a config file.
    ///
    /// The format is picked from the file extension. Calling this again
    /// on the same path returns a fresh snapshot and never touches
    /// previously returned ones.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        loader::parse(&content, ConfigFormat::from_path(path))
    }

    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        loader::parse(s, ConfigFormat::Json)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        loader::parse(s, ConfigFormat::Toml)
    }

    /// Serialize the resolved snapshot in the shape `load` accepts.
    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
