//! Error types for startup and configuration paths.
//!
//! The request-time surfaces stay infallible on purpose: recording is
//! fail-open and the query API degrades instead of erroring.

use std::io;

use thiserror::Error;

/// Result type alias for media-perf
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Job subsystem (Redis) error
    #[error("Job subsystem error: {0}")]
    Redis(#[from] redis::RedisError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
