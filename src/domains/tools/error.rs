//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The caller could not be authorized against the data source.
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "unauthorized" error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The message without the category prefix, as shown to tool callers.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::InvalidArguments(msg)
            | Self::Unauthorized(msg)
            | Self::ExecutionFailed(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_drops_category_prefix() {
        let err = ToolError::unauthorized("error parsing access token: bad header");
        assert_eq!(err.to_string(), "Authorization failed: error parsing access token: bad header");
        assert_eq!(err.message(), "error parsing access token: bad header");

        let err = ToolError::invalid_arguments("location parameter is required");
        assert_eq!(err.message(), "location parameter is required");
    }
}
