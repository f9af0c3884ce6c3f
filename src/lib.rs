//! # Pangrowth Library
//!
//! Pan-genome and core-genome accumulation curves with Heaps' law fitting
//! and open/closed classification.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: Bit-packed genome x gene presence matrix
//! - `error`: Error types and result aliases
//! - `io`: Presence/absence table reader and report writers
//! - `model`: Accumulation, core-genome sampling, curve fitting, classification
//! - `pipelines`: High-level workflow orchestration
//! - `utils`: Telemetry and threading helpers

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use data::PresenceMatrix;
pub use error::{PangrowthError, Result};
pub use io::{read_rtab, write_report};
pub use model::{AccumulationCurve, Aggregate, CoreSamplePoints, FitParams, PanGenomeStatus};
pub use pipelines::{AnalysisOptions, AnalysisPipeline, AnalysisReport, FitFailurePolicy};
