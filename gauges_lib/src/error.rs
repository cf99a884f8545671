//! Error types for the Gauges API client.
//!
//! HTTP failures (401, 404, 422, ...) are not errors here: they come back as a
//! normal [`Response`](crate::Response). These variants cover what goes wrong
//! before a response exists, or when a caller asks for a typed view.

use thiserror::Error;

/// Base error type for Gauges operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport could not complete the round-trip (DNS, TLS, connect, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to encode request body: {0}")]
    Serialization(String),

    /// A typed view over a response body did not match its shape.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Credentials: {0}")]
    Credentials(String),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
