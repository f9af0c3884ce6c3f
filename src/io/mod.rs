//! # I/O Module
//!
//! ## Sub-modules
//! - `rtab`: gene presence/absence table reader (plain or gzip)
//! - `report`: statistics and TSV writers for the output directory

pub mod report;
pub mod rtab;

pub use report::write_report;
pub use rtab::{parse_rtab, read_rtab};
