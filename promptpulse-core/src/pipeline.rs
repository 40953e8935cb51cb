//! Pipeline drivers: one per invocation kind
//!
//! Each driver walks the same states: resolve storage → read input →
//! classify or aggregate → build record → log → dispatch → return.
//!
//! Storage resolution never fails the pipeline; a missing storage root
//! degrades to "no local log, no identity". Only a malformed input payload
//! or a missing correlation field is fatal. Dispatch is attempted exactly
//! once when a record exists, and the driver returns without awaiting its
//! outcome.

use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::delivery::{DeliveryAgent, DeliveryHandle};
use crate::diag::DiagnosticLog;
use crate::error::{Error, Result};
use crate::event::{LifecycleEvent, SESSION_END_EVENT};
use crate::identity::IdentityStore;
use crate::record::{utc_timestamp, EventMetricRecord, SessionMetricRecord};
use crate::transcript;

/// What an invocation produced
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Event did not match; zero side effects, exit 0
    Skipped,
    /// A record was dispatched; join the handle last, then exit 0
    Dispatched(DeliveryHandle),
}

/// Local resources resolved from the storage root, all optional
struct Storage {
    diag: DiagnosticLog,
    identity: Option<String>,
}

fn resolve_storage(config: &Config, verbose: bool) -> Storage {
    match config.resolve_state_dir() {
        Some(dir) => Storage {
            diag: DiagnosticLog::new(Some(Config::diag_log_path(&dir)), verbose),
            identity: IdentityStore::new(&dir).get_or_create(),
        },
        None => Storage {
            diag: DiagnosticLog::disabled(),
            identity: None,
        },
    }
}

fn read_event(input: impl Read) -> Result<LifecycleEvent> {
    serde_json::from_reader(input).map_err(|_| Error::MalformedInput)
}

fn require<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    field
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingField(name))
}

/// Drive one per-event invocation (slash command / skill metrics).
///
/// Returns `Skipped` for events that produce no metric; fatal errors are
/// `MalformedInput` and `MissingField("session_id")`.
pub fn run_event(input: impl Read, config: &Config, verbose: bool) -> Result<PipelineOutcome> {
    let storage = resolve_storage(config, verbose);

    let event = read_event(input)?;
    let session_id = require(event.session_id.as_deref(), "session_id")?;

    let Some(intent) = event.classify() else {
        return Ok(PipelineOutcome::Skipped);
    };

    let timestamp = utc_timestamp();
    let record = EventMetricRecord::build(&intent, session_id, storage.identity, &timestamp);
    let payload = serde_json::to_string(&record)?;

    // Log happens-before dispatch: the payload line exists even if
    // delivery later fails.
    storage
        .diag
        .line(&timestamp, &format!("Sending metrics: {}", payload));

    let agent = DeliveryAgent::new(config.events_endpoint(), config.timeout);
    Ok(PipelineOutcome::Dispatched(agent.dispatch(
        payload,
        storage.diag,
        timestamp,
    )))
}

/// Drive one session-end invocation (transcript aggregation).
///
/// Both `session_id` and `transcript_path` are required before the event
/// kind is checked; any other event kind is a silent success. Aggregation
/// failures degrade to a zero-valued aggregate and never escalate.
pub fn run_session(input: impl Read, config: &Config, verbose: bool) -> Result<PipelineOutcome> {
    let storage = resolve_storage(config, verbose);

    let event = read_event(input)?;
    let session_id = require(event.session_id.as_deref(), "session_id")?;
    let transcript_path = require(event.transcript_path.as_deref(), "transcript_path")?;

    if event.hook_event_name.as_deref() != Some(SESSION_END_EVENT) {
        return Ok(PipelineOutcome::Skipped);
    }

    let exit_reason = event.reason.as_deref().unwrap_or("other");
    let agg = transcript::aggregate(Path::new(transcript_path), &storage.diag);

    let timestamp = utc_timestamp();
    let record = SessionMetricRecord::build(
        &agg,
        session_id,
        storage.identity,
        exit_reason,
        &timestamp,
    );
    let payload = serde_json::to_string(&record)?;

    storage
        .diag
        .line(&timestamp, &format!("Sending session metrics: {}", payload));

    let agent = DeliveryAgent::new(config.sessions_endpoint(), config.timeout);
    Ok(PipelineOutcome::Dispatched(agent.dispatch(
        payload,
        storage.diag,
        timestamp,
    )))
}
