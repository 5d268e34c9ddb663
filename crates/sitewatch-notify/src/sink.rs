//! The notification sink abstraction.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Delivers alert text to a single preconfigured destination.
///
/// Implementations must not panic on delivery failure; they log and
/// resolve to `false` instead.
pub trait NotificationSink: Send + Sync {
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, bool>;
}
