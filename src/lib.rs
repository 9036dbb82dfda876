//! Data Scan MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server that exposes
//! Google Cloud Dataplex data scans over BigQuery tables as MCP tools.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   caller authorization, the Dataplex client and the main server
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: MCP tools that can be executed by clients
//!
//! # Example
//!
//! ```rust,no_run
//! use datascan_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
