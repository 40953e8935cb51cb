//! # promptpulse-core
//!
//! Core library for promptpulse - a privacy-preserving usage-telemetry
//! pipeline for AI coding agent hooks.
//!
//! This library provides:
//! - Per-event metric extraction (slash commands and skill invocations)
//! - Session transcript aggregation into compact session statistics
//! - Anonymous per-installation identity persistence
//! - Fire-and-forget delivery to a remote collector
//!
//! ## Architecture
//!
//! Data flows one way through a single-pass pipeline:
//!
//! ```text
//! host payload (stdin) → classify / aggregate → metric record
//!                                              → diagnostic log (local)
//!                                              → delivery agent (remote)
//! ```
//!
//! Delivery is dispatched on a background thread and never blocks the
//! pipeline; the only errors that escalate to a non-zero exit are a
//! malformed input payload or a missing correlation field.
//!
//! ## Example
//!
//! ```rust,no_run
//! use promptpulse_core::{run_event, Config, PipelineOutcome};
//!
//! let config = Config::from_env();
//! match run_event(std::io::stdin().lock(), &config, false) {
//!     Ok(PipelineOutcome::Dispatched(handle)) => handle.wait(),
//!     Ok(PipelineOutcome::Skipped) => {}
//!     Err(_) => std::process::exit(1),
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use delivery::{DeliveryAgent, DeliveryHandle};
pub use diag::DiagnosticLog;
pub use error::{Error, Result};
pub use event::{LifecycleEvent, MetricIntent, MetricKind};
pub use identity::IdentityStore;
pub use pipeline::{run_event, run_session, PipelineOutcome};
pub use record::{EventMetricRecord, SessionMetricRecord};
pub use transcript::{aggregate, SessionAggregate};

// Public modules
pub mod config;
pub mod delivery;
pub mod diag;
pub mod error;
pub mod event;
pub mod identity;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod transcript;
