//! Error types for the nameline system
//!
//! This module defines all error types used throughout the crate.
//!
//! Note that an unknown hostname is not an error on the wire: the registry
//! answers such queries with an empty `VALUE` and the client surfaces that
//! as [`Error::UnresolvedHostname`] only once it has a decoded reply in hand.

use thiserror::Error;

/// Result type alias for nameline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the nameline system
#[derive(Error, Debug)]
pub enum Error {
    /// Wire payload that does not decode as any known message shape
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// No reply from the registry within the query timeout
    #[error("registry query timed out")]
    QueryTimeout,

    /// Socket or connection level failure
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The registry answered, but with an empty value
    #[error("hostname not resolvable: {0}")]
    UnresolvedHostname(String),

    /// The downstream compute call exceeded its timeout
    #[error("downstream call timed out")]
    DownstreamTimeout,

    /// The downstream compute call completed with a non-success status
    #[error("downstream returned status {0}")]
    DownstreamStatus(u16),

    /// Incomplete or malformed structured input
    #[error("invalid input: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed-message error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
