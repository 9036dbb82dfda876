//! Dataplex data scan tools module.
//!
//! This module provides tools over Dataplex data scans of BigQuery tables:
//! - `list_data_scans`: List the data scans of a project location
//! - `get_data_scan_info`: Fetch one scan and its data profile result
//! - `data_profile`: Create (and run) a data profile scan for a table
//!
//! Each tool has handlers for both HTTP and STDIO/TCP transports.

pub mod common;
pub mod data_profile;
pub mod get_data_scan_info;
pub mod list_data_scans;

pub use data_profile::{DataProfileParams, DataProfileTool};
pub use get_data_scan_info::{GetDataScanInfoParams, GetDataScanInfoTool};
pub use list_data_scans::{ListDataScansParams, ListDataScansTool};
