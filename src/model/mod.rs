//! # Model Module
//!
//! The resampling and curve-fitting engine.
//!
//! ## Sub-modules
//! - `curve`: Heaps' law and exponential decay response curves
//! - `fit`: Levenberg-Marquardt least squares against a curve model
//! - `accumulation`: pan-genome accumulation over random genome orders
//! - `core_genome`: core-genome size over random genome subsets
//! - `classify`: averaging of fits and the open/closed call
//!
//! Every stochastic function takes an explicit `&mut impl Rng`; nothing here
//! touches a global RNG.

pub mod accumulation;
pub mod classify;
pub mod core_genome;
pub mod curve;
pub mod fit;

pub use accumulation::{accumulate, simulate, AccumulationCurve, CurvePoint};
pub use classify::{aggregate, Aggregate, PanGenomeStatus};
pub use core_genome::{
    sample_core_genome, sample_subset_size, CorePoint, CoreSamplePoints, CoreSamplingPlan,
    DrawCount,
};
pub use curve::{exponential_decay, heaps_law, CurveModel, ExponentialDecay, HeapsLaw};
pub use fit::{fit_curve, fit_heaps_law, fit_heaps_law_with, Fit, FitError, FitOptions, FitParams};
