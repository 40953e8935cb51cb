//! Diagnostic log: local audit trail for outbound payloads and delivery
//! outcomes.
//!
//! Append-only, human-readable, timestamp-prefixed lines. Writing is a
//! no-op unless verbosity is enabled and a path is known, and every I/O
//! failure is discarded: logging must never fail the pipeline or change
//! its exit status.
//!
//! Cloneable and `Send` so the delivery thread keeps the same log after
//! the pipeline has finished. Concurrent invocations may interleave lines;
//! that is tolerated, the file is not a system of record.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Handle to the best-effort diagnostic log
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: Option<PathBuf>,
    verbose: bool,
}

impl DiagnosticLog {
    /// Create a log handle; `path: None` makes every write a no-op
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Self {
        Self { path, verbose }
    }

    /// A handle that never writes
    pub fn disabled() -> Self {
        Self {
            path: None,
            verbose: false,
        }
    }

    /// True when lines will actually be written
    pub fn is_enabled(&self) -> bool {
        self.verbose && self.path.is_some()
    }

    /// Append one `[timestamp] message` line, best effort
    pub fn line(&self, timestamp: &str, message: &str) {
        if !self.verbose {
            return;
        }
        let Some(path) = &self.path else {
            return;
        };
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "[{}] {}", timestamp, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_timestamped_line_when_verbose() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("telemetry.log");
        let diag = DiagnosticLog::new(Some(path.clone()), true);

        diag.line("2026-01-02T03:04:05Z", "Sending metrics: {}");
        diag.line("2026-01-02T03:04:06Z", "Response: HTTP 200 - ok");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[2026-01-02T03:04:05Z] Sending metrics: {}");
        assert_eq!(lines[1], "[2026-01-02T03:04:06Z] Response: HTTP 200 - ok");
    }

    #[test]
    fn test_silent_unless_verbose() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("telemetry.log");
        let diag = DiagnosticLog::new(Some(path.clone()), false);

        diag.line("2026-01-02T03:04:05Z", "should not appear");

        assert!(!path.exists());
        assert!(!diag.is_enabled());
    }

    #[test]
    fn test_silent_without_path() {
        let diag = DiagnosticLog::new(None, true);
        diag.line("2026-01-02T03:04:05Z", "nowhere to go");
        assert!(!diag.is_enabled());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let diag = DiagnosticLog::new(Some(PathBuf::from("/nonexistent/dir/telemetry.log")), true);
        // Must not panic
        diag.line("2026-01-02T03:04:05Z", "lost");
    }
}
