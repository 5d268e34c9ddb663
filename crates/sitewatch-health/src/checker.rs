//! Debounced availability tracking.
//!
//! Each target is UP or DOWN. While UP, failures are counted; reaching the
//! target's `failure_threshold` flips it DOWN and fires one alert. The
//! first success afterwards flips it back UP and fires one recovery alert.
//! Failures while already DOWN only grow the counter.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use sitewatch_config::{TargetConfig, TargetKey};
use sitewatch_notify::NotificationSink;

use crate::probe::{FailureKind, Probe, ProbeResult};

/// Alert-worthy outcome of recording one probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// UP → DOWN: the failure threshold was just reached.
    WentDown,
    /// DOWN → UP.
    Recovered,
}

/// Per-target state, created on first check and kept for the process
/// lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetState {
    /// Reset to 0 by any success.
    pub consecutive_failures: u32,
    /// Debounced alert flag.
    pub is_down: bool,
}

impl TargetState {
    /// Record a probe result against `failure_threshold`.
    pub fn record(&mut self, result: &ProbeResult, failure_threshold: u32) -> Transition {
        if result.is_ok() {
            self.consecutive_failures = 0;
            if self.is_down {
                self.is_down = false;
                return Transition::Recovered;
            }
            return Transition::None;
        }

        // Not capped while DOWN; saturation only guards overflow.
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if !self.is_down && self.consecutive_failures >= failure_threshold {
            self.is_down = true;
            return Transition::WentDown;
        }
        Transition::None
    }
}

/// Counts for one pass over the enabled targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub failed: usize,
    pub went_down: usize,
    pub recovered: usize,
}

impl CycleReport {
    fn record(&mut self, result: &ProbeResult, transition: Transition) {
        self.checked += 1;
        if !result.is_ok() {
            self.failed += 1;
        }
        match transition {
            Transition::WentDown => self.went_down += 1,
            Transition::Recovered => self.recovered += 1,
            Transition::None => {}
        }
    }
}

/// Probes targets, tracks their state, and sends transition alerts.
pub struct AvailabilityChecker {
    notifier: Arc<dyn NotificationSink>,
    probe: Arc<dyn Probe>,
    states: HashMap<TargetKey, TargetState>,
    /// Prefix for alert text when several instances share a chat.
    checker_name: Option<String>,
}

impl AvailabilityChecker {
    pub fn new(notifier: Arc<dyn NotificationSink>, probe: Arc<dyn Probe>) -> Self {
        Self {
            notifier,
            probe,
            states: HashMap::new(),
            checker_name: None,
        }
    }

    pub fn with_checker_name(mut self, checker_name: Option<String>) -> Self {
        self.checker_name = checker_name;
        self
    }

    /// Replace the alert sink. Target state is kept.
    pub fn set_notifier(&mut self, notifier: Arc<dyn NotificationSink>) {
        self.notifier = notifier;
    }

    /// Takes effect for alerts sent from the next check on.
    pub fn set_checker_name(&mut self, checker_name: Option<String>) {
        self.checker_name = checker_name;
    }

    pub fn checker_name(&self) -> Option<&str> {
        self.checker_name.as_deref()
    }

    pub fn state(&self, key: &TargetKey) -> Option<TargetState> {
        self.states.get(key).copied()
    }

    /// Number of targets with recorded state.
    pub fn tracked_targets(&self) -> usize {
        self.states.len()
    }

    /// Run one cycle over the enabled targets.
    ///
    /// Probes run concurrently; results are applied and alerts sent in
    /// config order. A failing probe task only affects its own target.
    pub async fn check_targets(&mut self, targets: &[TargetConfig]) -> CycleReport {
        let enabled: Vec<&TargetConfig> = targets.iter().filter(|t| t.enabled).collect();
        let mut report = CycleReport::default();
        if enabled.is_empty() {
            warn!("no enabled targets in config");
            return report;
        }

        let pending: Vec<_> = enabled.iter().map(|t| self.spawn_probe(t)).collect();
        for (target, handle) in enabled.into_iter().zip(pending) {
            let result = join_probe(handle).await;
            let transition = self.apply(target, &result).await;
            report.record(&result, transition);
        }
        report
    }

    /// Check a single target. Disabled targets are skipped without a probe.
    pub async fn check_target(&mut self, target: &TargetConfig) -> Transition {
        if !target.enabled {
            return Transition::None;
        }
        let result = join_probe(self.spawn_probe(target)).await;
        self.apply(target, &result).await
    }

    fn spawn_probe(&self, target: &TargetConfig) -> JoinHandle<ProbeResult> {
        let probe = self.probe.clone();
        let target = target.clone();
        tokio::spawn(async move { probe.probe(&target).await })
    }

    /// Feed one probe result through the target's state machine and send
    /// the resulting alert, if any.
    async fn apply(&mut self, target: &TargetConfig, result: &ProbeResult) -> Transition {
        let state = self.states.entry(target.key()).or_default();
        let transition = state.record(result, target.failure_threshold);
        let failures = state.consecutive_failures;

        if !result.is_ok() {
            warn!(
                name = %target.name,
                url = %target.url,
                reason = %result.reason(),
                failures,
                threshold = target.failure_threshold,
                "[FAIL] {} ({}): {} (failures {}/{})",
                target.name,
                target.url,
                result.reason(),
                failures,
                target.failure_threshold,
            );
        }

        let text = match transition {
            Transition::None => return transition,
            Transition::WentDown => {
                let text = self.alert_text(format!(
                    "[DOWN] {} is unavailable: {}. Reason: {}. Failures: {}/{}",
                    target.name,
                    target.url,
                    result.reason(),
                    failures,
                    target.failure_threshold,
                ));
                error!(name = %target.name, url = %target.url, "{text}");
                text
            }
            Transition::Recovered => {
                let text = self.alert_text(format!(
                    "[RECOVERED] {} is back online: {}",
                    target.name, target.url,
                ));
                info!(name = %target.name, url = %target.url, "{text}");
                text
            }
        };

        if !self.notifier.send(&text).await {
            warn!(name = %target.name, url = %target.url, "alert not delivered");
        }
        transition
    }

    fn alert_text(&self, message: String) -> String {
        match &self.checker_name {
            Some(name) => format!("[{name}] {message}"),
            None => message,
        }
    }
}

/// Turn a crashed or cancelled probe task into a failed check.
async fn join_probe(handle: JoinHandle<ProbeResult>) -> ProbeResult {
    match handle.await {
        Ok(result) => result,
        Err(e) => ProbeResult::Failed {
            kind: FailureKind::Internal,
            message: e.to_string(),
        },
    }
}
