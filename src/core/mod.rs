//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, caller authorization, the
//! Dataplex client, server lifecycle management, and transport layer
//! abstractions.

pub mod auth;
pub mod config;
pub mod dataplex;
pub mod error;
pub mod server;
pub mod transport;

pub use auth::{AccessToken, AuthError};
pub use config::Config;
pub use dataplex::{DataplexError, DataplexSource};
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
