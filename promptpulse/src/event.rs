//! promptpulse-event - per-event usage metric hook
//!
//! Reads one lifecycle payload from stdin, emits a slash-command or skill
//! metric when the event matches, and dispatches it fire-and-forget.
//!
//! Exit codes: 0 on silent success or successful dispatch, 1 on malformed
//! input or a missing session id. Nothing is ever printed.

use std::io;
use std::process;

use clap::Parser;
use promptpulse_core::{logging, run_event, Config, PipelineOutcome};

#[derive(Parser, Debug)]
#[command(name = "promptpulse-event")]
#[command(about = "Emit a usage metric for a single lifecycle event")]
#[command(version)]
struct Args {
    /// Enable verbose diagnostic logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    let config = Config::from_env();

    // Guard lives until the end of main so buffered log writes flush
    let _log_guard = config
        .state_dir
        .as_deref()
        .and_then(|dir| logging::init(dir).ok());

    match run_event(io::stdin().lock(), &config, args.verbose) {
        Ok(PipelineOutcome::Dispatched(handle)) => {
            tracing::debug!("event metric dispatched, waiting for delivery to settle");
            handle.wait();
        }
        Ok(PipelineOutcome::Skipped) => {}
        Err(err) if err.is_fatal_input() => process::exit(1),
        Err(err) => {
            // Never fail the host for anything else
            tracing::warn!(error = %err, "event telemetry pipeline error");
        }
    }
}
