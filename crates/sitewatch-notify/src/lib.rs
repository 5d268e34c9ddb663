//! sitewatch-notify — outbound alert delivery.
//!
//! A `NotificationSink` takes alert text and reports whether it was
//! delivered. Sinks never fail the caller: delivery errors are logged and
//! surface only as `false`. Lost alerts are not retried or queued.

pub mod error;
pub mod sink;
pub mod telegram;

pub use error::{NotifyError, NotifyResult};
pub use sink::{BoxFuture, NotificationSink};
pub use telegram::TelegramNotifier;
