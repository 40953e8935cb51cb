//! Outbound metric record construction
//!
//! Records are built once per invocation, immutable, and sent at most once.
//! Field names match the collector's wire contract.
//!
//! ## Integrity tag
//!
//! The `mac` field is a hex SHA-256 digest over `session_id` concatenated
//! with the record timestamp. It lets the collector spot obviously forged
//! or replayed payloads; there is no shared secret involved, so it is a
//! weak anti-replay hint, not an authentication guarantee.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::event::MetricIntent;
use crate::transcript::SessionAggregate;

/// Engine identifier sent with every record
pub const ENGINE: &str = "claude";

/// Record schema version
pub const SCHEMA_VERSION: &str = "1.0";

/// Current time, UTC, second precision, RFC3339
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Hex SHA-256 digest over session id + timestamp
pub fn integrity_tag(session_id: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(timestamp.as_bytes());
    hex::encode(hasher.finalize())
}

/// Lowercased platform family (`linux`, `darwin`, `windows`, ...)
///
/// macOS is reported as `darwin` to match what existing collector
/// dashboards expect from `platform.system()`-style values.
pub fn os_family() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Per-event metric record (slash command or skill invocation)
#[derive(Debug, Clone, Serialize)]
pub struct EventMetricRecord {
    #[serde(rename = "type")]
    pub metric_type: &'static str,
    pub name: String,
    pub engine: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub session_id: String,
    pub os: String,
    pub mac: String,
    pub prompt_length: usize,
    /// Persistent anonymous installation identifier (null when unavailable)
    pub user_id: Option<String>,
}

impl EventMetricRecord {
    /// Build a record from a classified intent
    pub fn build(
        intent: &MetricIntent,
        session_id: &str,
        user_id: Option<String>,
        timestamp: &str,
    ) -> Self {
        Self {
            metric_type: intent.kind.as_str(),
            name: intent.name.clone(),
            engine: ENGINE,
            version: SCHEMA_VERSION,
            timestamp: timestamp.to_string(),
            session_id: session_id.to_string(),
            os: os_family(),
            mac: integrity_tag(session_id, timestamp),
            prompt_length: intent.prompt_length,
            user_id,
        }
    }
}

/// Session-level metric record built from a transcript aggregate
///
/// Token-usage fields are omitted from the wire payload entirely when zero
/// (privacy minimization, not just "send zero").
#[derive(Debug, Clone, Serialize)]
pub struct SessionMetricRecord {
    pub session_id: String,
    pub user_id: Option<String>,
    pub os: String,
    pub engine: &'static str,

    pub start_timestamp: String,
    pub end_timestamp: String,
    pub session_duration: i64,
    pub exit_reason: String,

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

    pub had_errors: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
}

impl SessionMetricRecord {
    /// Build a record from a transcript aggregate.
    ///
    /// Missing transcript timestamps fall back to the record's own
    /// timestamp; the derived duration then stays zero.
    pub fn build(
        agg: &SessionAggregate,
        session_id: &str,
        user_id: Option<String>,
        exit_reason: &str,
        timestamp: &str,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_id,
            os: os_family(),
            engine: ENGINE,
            start_timestamp: agg
                .start_timestamp
                .clone()
                .unwrap_or_else(|| timestamp.to_string()),
            end_timestamp: agg
                .end_timestamp
                .clone()
                .unwrap_or_else(|| timestamp.to_string()),
            session_duration: agg.duration_secs(),
            exit_reason: exit_reason.to_string(),
            turn_count: agg.turn_count,
            user_message_count: agg.user_message_count,
            assistant_message_count: agg.assistant_message_count,
            total_tool_calls: agg.total_tool_calls,
            bash_call_count: agg.bash_call_count,
            file_read_count: agg.file_read_count,
            file_edit_count: agg.file_edit_count,
            file_write_count: agg.file_write_count,
            grep_call_count: agg.grep_call_count,
            glob_call_count: agg.glob_call_count,
            web_fetch_call_count: agg.web_fetch_call_count,
            web_search_call_count: agg.web_search_call_count,
            had_errors: agg.had_errors,
            total_input_tokens: nonzero(agg.total_input_tokens),
            total_output_tokens: nonzero(agg.total_output_tokens),
            cache_creation_tokens: nonzero(agg.cache_creation_tokens),
            cache_read_tokens: nonzero(agg.cache_read_tokens),
        }
    }
}

fn nonzero(value: u64) -> Option<u64> {
    if value > 0 {
        Some(value)
    } else {
        None
    }
}
