//! In-memory probe and sink doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use sitewatch_config::TargetConfig;
use sitewatch_notify::{BoxFuture, NotificationSink};

use crate::probe::{FailureKind, Probe, ProbeResult};

/// Sink that stores every message and answers with a fixed result.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, bool> {
        self.messages.lock().unwrap().push(text.to_string());
        let delivered = !self.fail;
        Box::pin(async move { delivered })
    }
}

/// Probe that replays queued results per URL; healthy once a queue runs dry.
#[derive(Default)]
pub struct ScriptedProbe {
    queued: Mutex<HashMap<String, VecDeque<ProbeResult>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, url: &str, results: impl IntoIterator<Item = ProbeResult>) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(results);
    }

    /// URLs probed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Probe for ScriptedProbe {
    fn probe<'a>(&'a self, target: &'a TargetConfig) -> BoxFuture<'a, ProbeResult> {
        self.calls.lock().unwrap().push(target.url.clone());
        let result = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&target.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(ProbeResult::Healthy);
        Box::pin(async move { result })
    }
}

/// Probe that panics, to exercise the per-target boundary.
pub struct PanickingProbe;

impl Probe for PanickingProbe {
    fn probe<'a>(&'a self, target: &'a TargetConfig) -> BoxFuture<'a, ProbeResult> {
        Box::pin(async move { explode(&target.url) })
    }
}

fn explode(url: &str) -> ProbeResult {
    panic!("probe exploded for {url}")
}

pub fn status(code: u16) -> ProbeResult {
    ProbeResult::Unhealthy { status: code }
}

pub fn timeout() -> ProbeResult {
    ProbeResult::Failed {
        kind: FailureKind::Timeout,
        message: "operation timed out".to_string(),
    }
}

pub fn target(name: &str, url: &str, failure_threshold: u32) -> TargetConfig {
    TargetConfig {
        name: name.to_string(),
        url: url.to_string(),
        enabled: true,
        timeout_seconds: 1.0,
        failure_threshold,
    }
}
