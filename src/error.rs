//! Error types for the engine bridge.
//!
//! Everything that can go wrong between accepting a request and returning
//! an envelope lands in [`EngineError`]. Handlers convert these into
//! `{success: false, error}` responses; nothing here should ever panic the
//! serving process.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving the Go engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// A file the engine needs (executable, config, model) is absent
    #[error("required engine file not found: {path}")]
    MissingResource { path: PathBuf },

    /// The engine process failed to launch or to answer the handshake
    #[error("engine failed to start: {message}")]
    Startup { message: String },

    /// The engine answered with a `?` failure line or broke response framing
    #[error("engine protocol error: {message}")]
    Protocol { message: String },

    /// Engine output that should be structured did not parse
    #[error("unparseable engine output: {message}")]
    Parse { message: String },

    /// An exchange did not complete within the configured deadline
    #[error("engine did not respond within {seconds}s")]
    Timeout { seconds: u64 },

    /// Stream error talking to the engine process
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine bridge operations
pub type EngineResult<T> = Result<T, EngineError>;
