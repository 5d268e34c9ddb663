//! sitewatch-health — availability checking and alerting.
//!
//! Turns a noisy stream of per-poll pass/fail results into a small set of
//! edge-triggered alerts: one DOWN when a target crosses its failure
//! threshold, one RECOVERED on the first success after that.
//!
//! # Architecture
//!
//! ```text
//! Monitor (one cycle at a time, start-to-start interval)
//!   ├── AppConfig reload (best-effort, keeps last valid snapshot)
//!   └── AvailabilityChecker
//!       ├── Probe (HttpProbe: one GET per target, spawned per cycle)
//!       ├── TargetState per (name, url) — consecutive failures, is_down
//!       └── NotificationSink (DOWN / RECOVERED text)
//! ```

pub mod checker;
pub mod monitor;
pub mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use checker::{AvailabilityChecker, CycleReport, TargetState, Transition};
pub use monitor::{Monitor, NotifierFactory};
pub use probe::{FailureKind, HttpProbe, Probe, ProbeResult};
