//! Telegram Bot API sink.
//!
//! Posts `{"chat_id", "text"}` to `<base>/bot<token>/sendMessage`. A
//! message counts as delivered only when the request succeeds, the status
//! is 2xx, and the response body carries `"ok": true`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use sitewatch_config::TelegramConfig;

use crate::error::{NotifyError, NotifyResult};
use crate::sink::{BoxFuture, NotificationSink};

/// Public Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of an error body kept in `NotifyError::Status`.
const MAX_BODY_IN_ERROR: usize = 256;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends alerts to one Telegram chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    /// Contains the bot token; never log it.
    endpoint: String,
    chat_id: String,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_api_base(config, TELEGRAM_API_BASE)
    }

    /// Create a notifier against a different Bot API base URL
    /// (self-hosted Bot API server, tests).
    pub fn with_api_base(config: &TelegramConfig, api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        }
    }

    /// Deliver one message, returning the typed failure reason.
    pub async fn try_send(&self, text: &str) -> NotifyResult<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
            // The request URL embeds the bot token.
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_BODY_IN_ERROR),
            });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| NotifyError::Malformed(e.to_string()))?;
        if !parsed.ok {
            return Err(NotifyError::Rejected(
                parsed
                    .description
                    .unwrap_or_else(|| "ok=false".to_string()),
            ));
        }
        Ok(())
    }
}

impl NotificationSink for TelegramNotifier {
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.try_send(text).await {
                Ok(()) => {
                    debug!(chat_id = %self.chat_id, "telegram message sent");
                    true
                }
                Err(e) => {
                    error!(chat_id = %self.chat_id, error = %e, "failed to send telegram message");
                    false
                }
            }
        })
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
