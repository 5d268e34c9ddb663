//! Raw document parsing and validation into `AppConfig`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, GlobalDefaults, TargetConfig, TelegramConfig};

/// Serialization format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension. Anything that is not
    /// `.toml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    telegram: Option<RawTelegram>,
    checker_name: Option<String>,
    global_defaults: Option<RawDefaults>,
    targets: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTelegram {
    bot_token: Option<Scalar>,
    chat_id: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDefaults {
    interval_seconds: Option<Number>,
    timeout_seconds: Option<f64>,
    failure_threshold: Option<Number>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTarget {
    name: Option<String>,
    url: Option<String>,
    enabled: Option<bool>,
    timeout_seconds: Option<f64>,
    failure_threshold: Option<Number>,
}

/// Chat ids are often written as bare integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
}

impl Scalar {
    fn into_trimmed(self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Integer(n) => n.to_string(),
        }
    }
}

/// Whole-number fields may be written as `60` or `60.0`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn whole(self, field: &str) -> ConfigResult<i64> {
        match self {
            Number::Int(n) => Ok(n),
            // NaN and infinities have a NaN fraction and fall through.
            Number::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            Number::Float(f) => Err(ConfigError::invalid(format!(
                "{field} must be a whole number, got {f}"
            ))),
        }
    }
}

pub(crate) fn parse(content: &str, format: ConfigFormat) -> ConfigResult<AppConfig> {
    let raw: RawConfig = match format {
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
    };
    validate(raw)
}

fn validate(raw: RawConfig) -> ConfigResult<AppConfig> {
    let telegram = validate_telegram(raw.telegram.unwrap_or_default())?;

    let checker_name = raw
        .checker_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let defaults = validate_defaults(raw.global_defaults.unwrap_or_default())?;

    let items = match raw.targets {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ConfigError::invalid("targets must be a non-empty list")),
    };

    let targets = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_target(index, item, &defaults))
        .collect::<ConfigResult<Vec<_>>>()?;

    Ok(AppConfig {
        checker_name,
        telegram,
        defaults,
        targets,
    })
}

fn validate_telegram(raw: RawTelegram) -> ConfigResult<TelegramConfig> {
    let bot_token = raw.bot_token.map(Scalar::into_trimmed).unwrap_or_default();
    let chat_id = raw.chat_id.map(Scalar::into_trimmed).unwrap_or_default();
    if bot_token.is_empty() || chat_id.is_empty() {
        return Err(ConfigError::invalid(
            "telegram.bot_token and telegram.chat_id are required",
        ));
    }
    Ok(TelegramConfig { bot_token, chat_id })
}

fn validate_defaults(raw: RawDefaults) -> ConfigResult<GlobalDefaults> {
    let base = GlobalDefaults::default();
    let interval_seconds = match raw.interval_seconds {
        Some(v) => positive_int("global_defaults.interval_seconds", v)?,
        None => base.interval_seconds,
    };
    let timeout_seconds = match raw.timeout_seconds {
        Some(v) => positive_secs("global_defaults.timeout_seconds", v)?,
        None => base.timeout_seconds,
    };
    let failure_threshold = match raw.failure_threshold {
        Some(v) => positive_threshold("global_defaults.failure_threshold", v)?,
        None => base.failure_threshold,
    };
    Ok(GlobalDefaults {
        interval_seconds,
        timeout_seconds,
        failure_threshold,
    })
}

fn validate_target(
    index: usize,
    item: serde_json::Value,
    defaults: &GlobalDefaults,
) -> ConfigResult<TargetConfig> {
    if !item.is_object() {
        return Err(ConfigError::invalid(format!(
            "targets[{index}] must be an object"
        )));
    }
    let raw: RawTarget = serde_json::from_value(item)
        .map_err(|e| ConfigError::invalid(format!("targets[{index}]: {e}")))?;

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("target-{}", index + 1));

    let url = validate_url(raw.url.as_deref().unwrap_or_default().trim())?;

    let timeout_seconds = match raw.timeout_seconds {
        Some(v) => positive_secs(&format!("targets[{index}].timeout_seconds"), v)?,
        None => defaults.timeout_seconds,
    };
    let failure_threshold = match raw.failure_threshold {
        Some(v) => positive_threshold(&format!("targets[{index}].failure_threshold"), v)?,
        None => defaults.failure_threshold,
    };

    Ok(TargetConfig {
        name,
        url,
        enabled: raw.enabled.unwrap_or(true),
        timeout_seconds,
        failure_threshold,
    })
}

/// Accept only absolute http/https URLs with a host.
fn validate_url(value: &str) -> ConfigResult<String> {
    let parsed = Url::parse(value).map_err(|_| invalid_url(value))?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    if !matches!(parsed.scheme(), "http" | "https") || !has_host {
        return Err(invalid_url(value));
    }
    Ok(value.to_string())
}

fn invalid_url(value: &str) -> ConfigError {
    ConfigError::invalid(format!("invalid URL: {value:?}"))
}

fn positive_int(field: &str, value: Number) -> ConfigResult<u64> {
    let value = value.whole(field)?;
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::invalid(format!("{field} must be > 0, got {value}")))
}

fn positive_threshold(field: &str, value: Number) -> ConfigResult<u32> {
    let value = value.whole(field)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::invalid(format!("{field} must be in 1..={}, got {value}", u32::MAX)))
}

fn positive_secs(field: &str, value: f64) -> ConfigResult<f64> {
    // Must also fit a `Duration`, which rejects NaN and infinities.
    if value > 0.0 && Duration::try_from_secs_f64(value).is_ok() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(format!("{field} must be > 0, got {value}")))
    }
}
