//! Utility functions and helpers
//!
//! This module contains time zone handling and timestamp formatting.

pub mod time;

pub use time::{file_date_suffix, format_timestamp, Zone, FILE_DATE_FORMAT, TIMESTAMP_FORMAT};
