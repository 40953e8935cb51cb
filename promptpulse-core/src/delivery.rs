//! Fire-and-forget delivery to the metrics collector
//!
//! One bounded-time HTTP POST per record, executed off the critical path on
//! a spawned thread. The pipeline returns control as soon as delivery is
//! dispatched; the binary joins the thread as its very last step so the
//! attempt can finish (or time out) before the process exits.
//!
//! Every outcome is terminal and recorded only in the diagnostic log:
//!
//! - **delivered**: any HTTP response received; body logged, not validated
//! - **remote-rejected**: non-2xx status; status and body logged
//! - **transport-failed**: timeout, DNS, connection refused; kind and
//!   message logged
//!
//! No retry, no backoff, no queueing. Nothing is ever surfaced to the
//! invoking host.

use std::thread;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::diag::DiagnosticLog;

/// Fixed identifying User-Agent for collector requests
pub const USER_AGENT: &str = "promptpulse-metrics-rs";

/// Agent for a single delivery attempt to one endpoint
#[derive(Debug)]
pub struct DeliveryAgent {
    endpoint: String,
    timeout: Duration,
}

/// Join handle for an in-flight delivery
///
/// `wait()` blocks until the attempt completed or timed out. Callers invoke
/// it after all other work, never before; the pipeline itself only
/// dispatches.
#[derive(Debug)]
pub struct DeliveryHandle {
    handle: thread::JoinHandle<()>,
}

impl DeliveryHandle {
    /// Block until the delivery attempt has settled
    pub fn wait(self) {
        let _ = self.handle.join();
    }
}

impl DeliveryAgent {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Dispatch one serialized record in the background.
    ///
    /// Returns immediately; the spawned thread owns the payload and the
    /// diagnostic log handle for the rest of the attempt.
    pub fn dispatch(
        self,
        payload: String,
        diag: DiagnosticLog,
        timestamp: String,
    ) -> DeliveryHandle {
        let handle = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    diag.line(
                        &timestamp,
                        &format!("ERROR: failed to start delivery runtime ({})", e),
                    );
                    return;
                }
            };

            runtime.block_on(send(
                &self.endpoint,
                self.timeout,
                payload,
                &diag,
                &timestamp,
            ));
        });

        DeliveryHandle { handle }
    }
}

/// Issue the single POST and log the terminal outcome
async fn send(
    endpoint: &str,
    timeout: Duration,
    payload: String,
    diag: &DiagnosticLog,
    timestamp: &str,
) {
    diag.line(timestamp, &format!("API request: POST {}", endpoint));
    diag.line(
        timestamp,
        &format!(
            r#"Headers: {{"Content-Type": "application/json", "User-Agent": "{}"}}"#,
            USER_AGENT
        ),
    );
    diag.line(timestamp, &format!("Payload: {}", payload));

    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            diag.line(timestamp, &format!("ERROR: failed to build HTTP client ({})", e));
            return;
        }
    };

    match client
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(could not read body)".to_string());

            if status.is_success() {
                diag.line(
                    timestamp,
                    &format!("Response: HTTP {} - {}", status.as_u16(), body),
                );
            } else {
                diag.line(
                    timestamp,
                    &format!("ERROR: HTTP {} - {}", status.as_u16(), body),
                );
                tracing::warn!(status = status.as_u16(), "collector rejected metric record");
            }
        }
        Err(e) => {
            let kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connect"
            } else {
                "request"
            };
            diag.line(
                timestamp,
                &format!("ERROR: failed to send ({}: {})", kind, e),
            );
            tracing::warn!(error = %e, "metric delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_transport_failure_is_swallowed_and_logged() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("telemetry.log");
        let diag = DiagnosticLog::new(Some(log_path.clone()), true);

        // Nothing listens on the discard port; connection is refused fast.
        let agent = DeliveryAgent::new(
            "http://127.0.0.1:9/events".to_string(),
            Duration::from_secs(2),
        );
        let handle = agent.dispatch(
            r#"{"type":"slash_command"}"#.to_string(),
            diag,
            "2026-01-02T03:04:05Z".to_string(),
        );
        handle.wait();

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("API request: POST http://127.0.0.1:9/events"));
        assert!(logged.contains(
            r#"Headers: {"Content-Type": "application/json", "User-Agent": "promptpulse-metrics-rs"}"#
        ));
        assert!(logged.contains(r#"Payload: {"type":"slash_command"}"#));
        assert!(logged.contains("ERROR: failed to send ("));
    }

    #[test]
    fn test_dispatch_is_silent_without_verbosity() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("telemetry.log");
        let diag = DiagnosticLog::new(Some(log_path.clone()), false);

        let agent =
            DeliveryAgent::new("http://127.0.0.1:9/events".to_string(), Duration::from_secs(2));
        agent
            .dispatch("{}".to_string(), diag, "2026-01-02T03:04:05Z".to_string())
            .wait();

        assert!(!log_path.exists());
    }
}
