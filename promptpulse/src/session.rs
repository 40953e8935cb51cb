//! promptpulse-session - session-end usage metric hook
//!
//! Reads a session-end payload from stdin, reduces the session transcript
//! to aggregate statistics, and dispatches one session metric record
//! fire-and-forget.
//!
//! Exit codes: 0 on silent success or successful dispatch, 1 on malformed
//! input or missing session id / transcript path. Nothing is ever printed.

use std::io;
use std::process;

use clap::Parser;
use promptpulse_core::{logging, run_session, Config, PipelineOutcome};

#[derive(Parser, Debug)]
#[command(name = "promptpulse-session")]
#[command(about = "Emit session-level usage metrics from a transcript")]
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

    match run_session(io::stdin().lock(), &config, args.verbose) {
        Ok(PipelineOutcome::Dispatched(handle)) => {
            tracing::debug!("session metric dispatched, waiting for delivery to settle");
            handle.wait();
        }
        Ok(PipelineOutcome::Skipped) => {}
        Err(err) if err.is_fatal_input() => process::exit(1),
        Err(err) => {
            // Never fail the host for anything else
            tracing::warn!(error = %err, "session telemetry pipeline error");
        }
    }
}
