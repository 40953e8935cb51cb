//! Error types for promptpulse-core

use thiserror::Error;

/// Main error type for the promptpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input payload was not a valid JSON object
    #[error("malformed input payload")]
    MalformedInput,

    /// Input payload lacks a required correlation field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the errors that terminate an invocation with exit code 1.
    ///
    /// Everything else is degraded-continue: the pipeline absorbs it and
    /// keeps going with reduced fidelity.
    pub fn is_fatal_input(&self) -> bool {
        matches!(self, Error::MalformedInput | Error::MissingField(_))
    }
}

/// Result type alias for promptpulse-core
pub type Result<T> = std::result::Result<T, Error>;
