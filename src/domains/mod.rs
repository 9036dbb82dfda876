//! Domains module containing business logic organized by bounded contexts.
//!
//! Each subdomain represents a specific area of functionality within the MCP
//! server. The only one today is `tools`.

pub mod tools;
