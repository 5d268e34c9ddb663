//! Service assembly — wires config, probe, notifier and monitor together
//! and runs until a stop signal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use sitewatch_config::{AppConfig, TelegramConfig};
use sitewatch_health::{HttpProbe, Monitor, NotifierFactory};
use sitewatch_notify::{NotificationSink, TelegramNotifier};

/// Load the config, build the subsystems, and run the monitor loop.
///
/// An invalid config at startup is fatal; later reload failures are not.
pub async fn run_service(config_path: PathBuf, once: bool) -> anyhow::Result<()> {
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let probe = Arc::new(HttpProbe::new().context("failed to build HTTP client")?);
    let factory: NotifierFactory = Arc::new(|cfg: &TelegramConfig| {
        Arc::new(TelegramNotifier::new(cfg)) as Arc<dyn NotificationSink>
    });
    let mut monitor = Monitor::new(config_path, config, probe, factory);

    info!(
        interval_secs = monitor.config().defaults.interval_seconds,
        targets = monitor.config().targets.len(),
        checker_name = ?monitor.config().checker_name,
        "service started"
    );

    if once {
        let report = monitor.run_once().await;
        info!(
            checked = report.checked,
            failed = report.failed,
            "single cycle finished"
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    monitor.run(shutdown_rx).await;
    info!("service stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("stop signal received");
}
