//! Notification delivery errors.

use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Reasons a notification was not delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rejected by api: {0}")]
    Rejected(String),

    #[error("malformed api response: {0}")]
    Malformed(String),
}
