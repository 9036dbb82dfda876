//! Caller authorization.
//!
//! When the Dataplex source runs with client authorization enabled, every
//! tool call carries the caller's own `Authorization` header, and the
//! bearer token inside it is used to build a per-call client.

use thiserror::Error;

/// Errors raised while reading a caller's credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header accompanied the call.
    #[error("no authorization header was provided")]
    Missing,

    /// The header is not of the form `Bearer <token>`.
    #[error("authorization header must be in the format 'Bearer <token>'")]
    Malformed,
}

/// Raw value of a caller's `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    /// Extract the token from a `Bearer <token>` header value.
    pub fn parse_bearer_token(&self) -> Result<&str, AuthError> {
        let mut parts = self.0.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None)
                if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
            {
                Ok(token)
            }
            _ => Err(AuthError::Malformed),
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}
