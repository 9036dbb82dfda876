//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod datascan;

pub use datascan::{
    DataProfileParams, DataProfileTool, GetDataScanInfoParams, GetDataScanInfoTool,
    ListDataScansParams, ListDataScansTool,
};
