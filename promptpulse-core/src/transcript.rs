//! Session transcript aggregation
//!
//! Reduces an append-only JSONL transcript (one JSON object per line) to a
//! [`SessionAggregate`] in a single streaming pass.
//!
//! # Error Handling
//!
//! The scan is designed to be resilient and recover from errors:
//!
//! - **Malformed JSON lines**: skipped, scan continues. The aggregate is
//!   identical to one computed over the transcript with those lines removed.
//! - **Missing file**: zero-valued aggregate plus one diagnostic entry.
//! - **Missing fields**: sensible defaults via `#[serde(default)]`.
//! - **Malformed timestamps**: duration degrades to 0, never propagated.
//!
//! Memory is O(1) beyond the running aggregate; the file is streamed, not
//! loaded wholesale.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::DateTime;
use serde::Deserialize;

use crate::diag::DiagnosticLog;
use crate::record::utc_timestamp;

/// Session statistics accumulated over one transcript scan
///
/// All counters start at zero and only ever increase during a scan. The
/// aggregate is recomputed from scratch on every session end; no state is
/// carried between invocations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionAggregate {
    pub turn_count: u64,
    pub user_message_count: u64,
    pub assistant_message_count: u64,

    pub total_tool_calls: u64,
    pub bash_call_count: u64,
    pub file_read_count: u64,
    pub file_edit_count: u64,
    pub file_write_count: u64,
    pub grep_call_count: u64,
    pub glob_call_count: u64,
    pub web_fetch_call_count: u64,
    pub web_search_call_count: u64,

    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,

    /// Sticky: set by the first erroneous entry, never cleared
    pub had_errors: bool,

    /// First non-empty timestamp seen
    pub start_timestamp: Option<String>,
    /// Last non-empty timestamp seen (may equal start)
    pub end_timestamp: Option<String>,
}

// ============================================
// Raw JSONL record types (serde deserialization)
// ============================================

/// One transcript line.
///
/// Uses `#[serde(default)]` liberally to handle missing fields gracefully.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawEntry {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    timestamp: Option<String>,
    message: Option<RawMessage>,
    tool_use_result: Option<serde_json::Value>,
}

/// Message content stays an opaque `Value`: the list is inspected element
/// by element so one odd entry (a bare string, a block with the wrong field
/// type) never discards the rest of the line's blocks.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    content: Option<serde_json::Value>,
    usage: Option<RawUsage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

/// Scan a transcript into a session aggregate.
///
/// Never fails: an unreadable file yields a zero-valued aggregate and a
/// diagnostic entry.
pub fn aggregate(transcript_path: &Path, diag: &DiagnosticLog) -> SessionAggregate {
    let mut agg = SessionAggregate::default();

    let file = match File::open(transcript_path) {
        Ok(f) => f,
        Err(e) => {
            diag.line(
                &utc_timestamp(),
                &format!(
                    "ERROR: transcript not readable: {}: {}",
                    transcript_path.display(),
                    e
                ),
            );
            tracing::debug!(
                path = %transcript_path.display(),
                error = %e,
                "transcript missing, returning zero aggregate"
            );
            return agg;
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let entry: RawEntry = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed transcript line");
                continue;
            }
        };

        agg.apply(&entry);
    }

    agg
}

impl SessionAggregate {
    /// Session duration in whole seconds, clamped to >= 0.
    ///
    /// Malformed or missing timestamps degrade to 0.
    pub fn duration_secs(&self) -> i64 {
        let (Some(start), Some(end)) = (&self.start_timestamp, &self.end_timestamp) else {
            return 0;
        };
        let (Ok(start), Ok(end)) = (
            DateTime::parse_from_rfc3339(start),
            DateTime::parse_from_rfc3339(end),
        ) else {
            return 0;
        };
        (end - start).num_seconds().max(0)
    }

    fn apply(&mut self, entry: &RawEntry) {
        // Timestamp tracking: first non-empty starts the session, every
        // subsequent non-empty one becomes the end.
        if let Some(ts) = entry.timestamp.as_deref().filter(|ts| !ts.is_empty()) {
            if self.start_timestamp.is_none() {
                self.start_timestamp = Some(ts.to_string());
            }
            self.end_timestamp = Some(ts.to_string());
        }

        match entry.entry_type.as_deref() {
            Some("user") => {
                self.user_message_count += 1;
                // User messages are the proxy for turns
                self.turn_count += 1;
            }
            Some("assistant") => {
                self.assistant_message_count += 1;

                if let Some(message) = &entry.message {
                    if let Some(usage) = &message.usage {
                        self.total_input_tokens += usage.input_tokens.unwrap_or(0);
                        self.total_output_tokens += usage.output_tokens.unwrap_or(0);
                        self.cache_creation_tokens += usage.cache_creation_input_tokens.unwrap_or(0);
                        self.cache_read_tokens += usage.cache_read_input_tokens.unwrap_or(0);
                    }

                    if let Some(blocks) = message.content.as_ref().and_then(|c| c.as_array()) {
                        for block in blocks {
                            if block.get("type").and_then(|v| v.as_str()) == Some("tool_use") {
                                let name =
                                    block.get("name").and_then(|v| v.as_str()).unwrap_or("");
                                self.count_tool_use(name);
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        if entry_has_error(entry) {
            self.had_errors = true;
        }
    }

    /// Bump the total and, when recognized, the per-tool bucket.
    ///
    /// Tool names outside the fixed allow-list count toward the total only.
    fn count_tool_use(&mut self, tool_name: &str) {
        self.total_tool_calls += 1;
        match tool_name {
            "Bash" => self.bash_call_count += 1,
            "Read" => self.file_read_count += 1,
            "Edit" => self.file_edit_count += 1,
            "Write" => self.file_write_count += 1,
            "Grep" => self.grep_call_count += 1,
            "Glob" => self.glob_call_count += 1,
            "WebFetch" => self.web_fetch_call_count += 1,
            "WebSearch" => self.web_search_call_count += 1,
            _ => {}
        }
    }
}

/// An entry is erroneous if its tool-use result carries a truthy
/// `is_error`, or the first element of its message content does.
///
/// Truthy covers more than JSON `true`: collectors have seen `1` and
/// non-empty strings in the wild, so any non-empty, non-zero, non-false
/// value counts.
fn entry_has_error(entry: &RawEntry) -> bool {
    let result_error = entry
        .tool_use_result
        .as_ref()
        .and_then(|v| v.get("is_error"))
        .map(is_truthy)
        .unwrap_or(false);
    if result_error {
        return true;
    }

    entry
        .message
        .as_ref()
        .and_then(|m| m.content.as_ref())
        .and_then(|c| c.as_array())
        .and_then(|blocks| blocks.first())
        .and_then(|first| first.get("is_error"))
        .map(is_truthy)
        .unwrap_or(false)
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
