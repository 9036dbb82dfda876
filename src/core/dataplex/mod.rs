//! Dataplex data scan client.
//!
//! - `types` - request and response shapes of the `dataScans` REST API
//! - `client` - the `DataScanApi` seam, its reqwest implementation, and
//!   the pagination / long-running operation helpers built on top of it
//! - `source` - the configured source handing out (per-caller) clients
//! - `error` - client error type

mod client;
mod error;
mod source;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::{DataScanApi, DataplexClient, list_all_data_scans, wait_for_operation};
pub use error::{DataplexError, DataplexResult};
pub use source::{ClientCreator, DataplexSource, HttpClientCreator};
