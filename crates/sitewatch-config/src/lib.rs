//! sitewatch-config — typed, validated configuration snapshots.
//!
//! The config document lists the monitored targets, global defaults, and
//! the Telegram credentials used for alerts. Loading resolves all defaults
//! up front, so an `AppConfig` is a plain value: two snapshots loaded from
//! an unchanged file compare equal, which is how the monitor detects
//! hot-reload changes.
//!
//! ```text
//! {
//!   "telegram": { "bot_token": "...", "chat_id": "..." },
//!   "checker_name": "eu-1",
//!   "global_defaults": { "interval_seconds": 60, "timeout_seconds": 5, "failure_threshold": 1 },
//!   "targets": [ { "name": "api", "url": "https://api.example.com/health" } ]
//! }
//! ```

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigFormat;
pub use model::*;
