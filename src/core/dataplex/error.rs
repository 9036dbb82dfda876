//! Dataplex client error types.

use thiserror::Error;

/// Result type for Dataplex client operations.
pub type DataplexResult<T> = Result<T, DataplexError>;

/// Errors that can occur while talking to the Dataplex API.
#[derive(Debug, Error)]
pub enum DataplexError {
    /// The request never produced a response (connect, TLS, timeout...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A long-running operation finished with an error status.
    #[error("Operation {name} failed: {message}")]
    OperationFailed { name: String, message: String },

    /// A long-running operation did not finish in time.
    #[error("Operation {name} did not complete within {waited_secs}s")]
    OperationTimeout { name: String, waited_secs: u64 },

    /// The caller's credentials could not be used.
    #[error("{0}")]
    Auth(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientInit(String),
}

impl DataplexError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an authorization error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// The message reported by the remote service, if there is one.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::OperationFailed { message, .. }
                if !message.is_empty() =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}
