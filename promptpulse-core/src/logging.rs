//! Logging infrastructure for promptpulse
//!
//! Engineering logs are written to a daily-rolled file inside the storage
//! root. This is separate from the diagnostic log ([`crate::diag`]), which
//! records outbound payloads and delivery outcomes for auditing.
//!
//! Hook binaries run silently: nothing is ever written to stdout or stderr.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Error, Result};

/// Initialize the logging system
///
/// Sets up tracing with:
/// - File output under the storage root
/// - Daily log rotation
/// - Log level via RUST_LOG, defaulting to warn
pub fn init(state_dir: &Path) -> Result<LoggingGuard> {
    // Create the storage root if it doesn't exist
    std::fs::create_dir_all(state_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, state_dir, "promptpulse.log");

    // Non-blocking writer so a slow disk never delays the pipeline
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize logging: {}", e)))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}
