//! Configuration for the telemetry pipeline
//!
//! Configuration is read from the environment, once per invocation:
//!
//! - `PROMPTPULSE_COLLECTOR_URL` replaces the default collector base URL;
//!   both metric kinds append their fixed sub-path to it.
//! - `PROMPTPULSE_STATE_DIR` selects the storage root for the identity
//!   marker and the diagnostic log. When absent, local telemetry storage is
//!   fully disabled for the invocation.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the collector base URL
pub const COLLECTOR_URL_ENV: &str = "PROMPTPULSE_COLLECTOR_URL";

/// Environment variable selecting the storage root
pub const STATE_DIR_ENV: &str = "PROMPTPULSE_STATE_DIR";

/// Default collector base URL
pub const DEFAULT_COLLECTOR_URL: &str = "https://telemetry.promptpulse.dev/ingest";

/// Sub-path for per-event metrics
pub const EVENTS_PATH: &str = "/events";

/// Sub-path for session metrics
pub const SESSIONS_PATH: &str = "/sessions";

/// Diagnostic log file name inside the storage root
pub const DIAG_LOG_FILE: &str = "telemetry.log";

/// Identity marker file name inside the storage root
pub const IDENTITY_FILE: &str = ".installation_id";

/// Bounded total wait for one delivery attempt (connect + response)
const NETWORK_TIMEOUT_SECS: u64 = 2;

/// Per-invocation pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Collector base URL (without the metric-kind sub-path)
    pub collector_base_url: String,

    /// Storage root for the identity marker and diagnostic log.
    /// `None` disables local telemetry storage entirely.
    pub state_dir: Option<PathBuf>,

    /// Total timeout for a single delivery attempt
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector_base_url: DEFAULT_COLLECTOR_URL.to_string(),
            state_dir: None,
            timeout: Duration::from_secs(NETWORK_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build configuration from the environment
    pub fn from_env() -> Self {
        let collector_base_url = std::env::var(COLLECTOR_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_string());

        let state_dir = std::env::var_os(STATE_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Self {
            collector_base_url,
            state_dir,
            timeout: Duration::from_secs(NETWORK_TIMEOUT_SECS),
        }
    }

    /// Endpoint for per-event metric records
    pub fn events_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.collector_base_url.trim_end_matches('/'),
            EVENTS_PATH
        )
    }

    /// Endpoint for session metric records
    pub fn sessions_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.collector_base_url.trim_end_matches('/'),
            SESSIONS_PATH
        )
    }

    /// Resolve the storage root, creating it if necessary.
    ///
    /// Returns `None` when no root is configured or it cannot be created;
    /// the pipeline then continues without local log or identity.
    pub fn resolve_state_dir(&self) -> Option<PathBuf> {
        let dir = self.state_dir.as_ref()?;
        std::fs::create_dir_all(dir).ok()?;
        Some(dir.clone())
    }

    /// Diagnostic log path inside a resolved storage root
    pub fn diag_log_path(state_dir: &Path) -> PathBuf {
        state_dir.join(DIAG_LOG_FILE)
    }
}
