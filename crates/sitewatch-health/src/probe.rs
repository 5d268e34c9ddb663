//! HTTP probe logic.
//!
//! Issues exactly one GET per check. The target's timeout bounds the whole
//! request (connect + response), and an outer timer bounds the probe as a
//! whole so an unreachable target cannot stall a cycle.

use std::error::Error as _;
use std::fmt;
use std::time::Duration;

use reqwest::redirect::Policy;
use tracing::debug;

use sitewatch_config::TargetConfig;
use sitewatch_notify::BoxFuture;

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Slack added on top of the target timeout for the outer timer, so the
/// client gets a chance to report its own timeout first.
const PROBE_GRACE: Duration = Duration::from_secs(1);

/// Why a probe could not produce an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    Redirect,
    Request,
    Body,
    /// The probe task itself failed (panicked or was cancelled).
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "Timeout",
            FailureKind::Connect => "Connect",
            FailureKind::Redirect => "Redirect",
            FailureKind::Request => "Request",
            FailureKind::Body => "Body",
            FailureKind::Internal => "Internal",
        };
        f.write_str(s)
    }
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The final response was exactly 200.
    Healthy,
    /// A response arrived with any other status.
    Unhealthy { status: u16 },
    /// No response: timeout, DNS, refused connection, TLS, ...
    Failed { kind: FailureKind, message: String },
}

impl ProbeResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeResult::Healthy)
    }

    /// Short human-readable classification used in logs and alerts.
    pub fn reason(&self) -> String {
        match self {
            ProbeResult::Healthy => "status_code=200".to_string(),
            ProbeResult::Unhealthy { status } => format!("status_code={status}"),
            ProbeResult::Failed { kind, message } => format!("{kind}: {message}"),
        }
    }
}

/// Checks one target and classifies the outcome. Never errors.
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, target: &'a TargetConfig) -> BoxFuture<'a, ProbeResult>;
}

/// Probe backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("sitewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, target: &TargetConfig) -> ProbeResult {
        let timeout = target.timeout();
        let request = self.client.get(&target.url).timeout(timeout).send();

        match tokio::time::timeout(timeout + PROBE_GRACE, request).await {
            Ok(Ok(resp)) => {
                let status = resp.status().as_u16();
                if status == 200 {
                    ProbeResult::Healthy
                } else {
                    debug!(name = %target.name, url = %target.url, status, "probe got non-200");
                    ProbeResult::Unhealthy { status }
                }
            }
            Ok(Err(e)) => {
                debug!(name = %target.name, url = %target.url, error = %e, "probe request failed");
                ProbeResult::Failed {
                    kind: classify(&e),
                    message: error_chain(e),
                }
            }
            Err(_) => ProbeResult::Failed {
                kind: FailureKind::Timeout,
                message: format!("no response within {:.1}s", timeout.as_secs_f64()),
            },
        }
    }
}

impl Probe for HttpProbe {
    fn probe<'a>(&'a self, target: &'a TargetConfig) -> BoxFuture<'a, ProbeResult> {
        Box::pin(self.get(target))
    }
}

fn classify(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        FailureKind::Connect
    } else if e.is_redirect() {
        FailureKind::Redirect
    } else if e.is_body() || e.is_decode() {
        FailureKind::Body
    } else {
        FailureKind::Request
    }
}

/// Flatten an error and its sources into one line. The URL is dropped
/// because callers already log it next to the reason.
fn error_chain(e: reqwest::Error) -> String {
    let e = e.without_url();
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::Redirect;
    use axum::routing::get;

    use super::*;

    fn target(url: String, timeout_seconds: f64) -> TargetConfig {
        TargetConfig {
            name: "test".to_string(),
            url,
            enabled: true,
            timeout_seconds,
            failure_threshold: 1,
        }
    }

    async fn spawn_site() -> String {
        let app = Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/created", get(|| async { (StatusCode::CREATED, "new") }))
            .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route("/moved", get(|| async { Redirect::temporary("/ok") }))
            .route("/loop", get(|| async { Redirect::temporary("/loop") }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn reasons() {
        assert_eq!(ProbeResult::Healthy.reason(), "status_code=200");
        assert_eq!(ProbeResult::Unhealthy { status: 503 }.reason(), "status_code=503");
        let failed = ProbeResult::Failed {
            kind: FailureKind::Timeout,
            message: "operation timed out".to_string(),
        };
        assert_eq!(failed.reason(), "Timeout: operation timed out");
        assert!(!failed.is_ok());
        assert!(ProbeResult::Healthy.is_ok());
    }

    #[tokio::test]
    async fn status_200_is_healthy() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        let result = probe.probe(&target(format!("{base}/ok"), 2.0)).await;
        assert_eq!(result, ProbeResult::Healthy);
    }

    #[tokio::test]
    async fn other_2xx_is_not_healthy() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        let result = probe.probe(&target(format!("{base}/created"), 2.0)).await;
        assert_eq!(result, ProbeResult::Unhealthy { status: 201 });
    }

    #[tokio::test]
    async fn server_error_is_unhealthy() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        let result = probe.probe(&target(format!("{base}/broken"), 2.0)).await;
        assert_eq!(result.reason(), "status_code=500");
    }

    #[tokio::test]
    async fn redirects_are_followed() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        let result = probe.probe(&target(format!("{base}/moved"), 2.0)).await;
        assert_eq!(result, ProbeResult::Healthy);
    }

    #[tokio::test]
    async fn redirect_loop_fails() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        match probe.probe(&target(format!("{base}/loop"), 2.0)).await {
            ProbeResult::Failed { kind, .. } => assert_eq!(kind, FailureKind::Redirect),
            other => panic!("expected redirect failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let base = spawn_site().await;
        let probe = HttpProbe::new().unwrap();
        match probe.probe(&target(format!("{base}/slow"), 0.2)).await {
            ProbeResult::Failed { kind, .. } => assert_eq!(kind, FailureKind::Timeout),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_port_fails_to_connect() {
        let probe = HttpProbe::new().unwrap();
        match probe.probe(&target("http://127.0.0.1:1/".to_string(), 1.0)).await {
            ProbeResult::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::Connect);
                assert!(!message.is_empty());
            }
            other => panic!("expected connect failure, got {other:?}"),
        }
    }
}
