//! Monitor — the periodic check loop.
//!
//! Runs one cycle at a time. Before each cycle the config file is reloaded;
//! a bad file is logged and the last valid snapshot stays in use. Cycles
//! start `interval_seconds` apart (start to start): a slow cycle shortens
//! the following wait but never causes cycles to queue up.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use sitewatch_config::{AppConfig, TelegramConfig};
use sitewatch_notify::NotificationSink;

use crate::checker::{AvailabilityChecker, CycleReport};
use crate::probe::Probe;

/// Builds a sink for a (re)loaded set of Telegram credentials.
pub type NotifierFactory =
    Arc<dyn Fn(&TelegramConfig) -> Arc<dyn NotificationSink> + Send + Sync>;

/// Drives the checker on the configured interval.
pub struct Monitor {
    config_path: PathBuf,
    config: AppConfig,
    checker: AvailabilityChecker,
    notifier_factory: NotifierFactory,
}

impl Monitor {
    /// Create a monitor from an already-loaded config.
    ///
    /// The checker gets its sink from `notifier_factory` and its name from
    /// `config`, so it starts consistent with the snapshot.
    pub fn new(
        config_path: impl Into<PathBuf>,
        config: AppConfig,
        probe: Arc<dyn Probe>,
        notifier_factory: NotifierFactory,
    ) -> Self {
        let checker = AvailabilityChecker::new(notifier_factory(&config.telegram), probe)
            .with_checker_name(config.checker_name.clone());
        Self {
            config_path: config_path.into(),
            config,
            checker,
            notifier_factory,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn checker(&self) -> &AvailabilityChecker {
        &self.checker
    }

    /// Re-read the config file. Returns whether a new snapshot was adopted.
    pub fn reload(&mut self) -> bool {
        let fresh = match AppConfig::load(&self.config_path) {
            Ok(fresh) => fresh,
            Err(e) => {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "failed to reload config, using previous valid config"
                );
                return false;
            }
        };

        if fresh == self.config {
            return false;
        }

        if fresh.telegram != self.config.telegram {
            self.checker
                .set_notifier((self.notifier_factory)(&fresh.telegram));
            info!("notifier config reloaded");
        }
        if fresh.checker_name != self.config.checker_name {
            self.checker.set_checker_name(fresh.checker_name.clone());
            info!(checker_name = ?fresh.checker_name, "checker name reloaded");
        }

        self.config = fresh;
        info!(
            path = %self.config_path.display(),
            targets = self.config.targets.len(),
            interval_secs = self.config.defaults.interval_seconds,
            "config reloaded"
        );
        true
    }

    /// Reload and run a single cycle.
    pub async fn run_once(&mut self) -> CycleReport {
        self.reload();
        let report = self.checker.check_targets(&self.config.targets).await;
        debug!(
            checked = report.checked,
            failed = report.failed,
            went_down = report.went_down,
            recovered = report.recovered,
            "check cycle finished"
        );
        report
    }

    /// Run cycles until `shutdown` fires.
    ///
    /// A stop request interrupts the wait between cycles; a cycle that is
    /// already running is allowed to finish.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.defaults.interval_seconds,
            targets = self.config.targets.len(),
            "monitor started"
        );

        loop {
            let stopped = *shutdown.borrow_and_update();
            if stopped {
                break;
            }

            let started = Instant::now();
            self.run_once().await;

            let wait = self
                .config
                .defaults
                .interval()
                .saturating_sub(started.elapsed());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                // A dropped sender also counts as a stop request.
                _ = shutdown.changed() => {
                    info!("stop signal received, shutting down");
                    break;
                }
            }
        }

        info!("monitor stopped");
    }
}
