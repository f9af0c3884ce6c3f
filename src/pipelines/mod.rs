//! # Pipeline Module
//!
//! High-level orchestration of the pan-genome and core-genome workflows.
//! Coordinates seeding, parallel iteration, fitting and aggregation.

pub mod analysis;
pub mod core_genome;
pub mod pangenome;

pub use analysis::{AnalysisPipeline, AnalysisReport};
pub use core_genome::{CoreGenomeAnalysis, CoreGenomePipeline};
pub use pangenome::{IterationFit, PanGenomeAnalysis, PanGenomePipeline, SkippedIteration};

use std::fmt;
use std::str::FromStr;

use crate::error::{PangrowthError, Result};
use crate::model::core_genome::CoreSamplingPlan;

/// What to do when a pan-genome iteration's curve fit fails
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FitFailurePolicy {
    /// Stop the whole run with the fit error
    #[default]
    Abort,
    /// Drop the iteration, count it, and average over the rest
    Skip,
}

impl FromStr for FitFailurePolicy {
    type Err = PangrowthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(PangrowthError::config(format!(
                "unknown fit failure policy '{}', expected 'abort' or 'skip'",
                other
            ))),
        }
    }
}

impl fmt::Display for FitFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        })
    }
}

/// Library-level knobs for one analysis run
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Pan-genome permutations (T)
    pub iterations: usize,
    /// Master seed; every iteration and subset size derives its own stream
    pub seed: u64,
    /// Core-genome repeats and inner draws
    pub core: CoreSamplingPlan,
    pub on_fit_failure: FitFailurePolicy,
    /// Fewest successful fits accepted under [`FitFailurePolicy::Skip`]
    pub min_valid_iterations: usize,
}

impl AnalysisOptions {
    /// Reference defaults: core repeats equal to `iterations`, abort on failure
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self {
            iterations,
            seed,
            core: CoreSamplingPlan::new(iterations),
            on_fit_failure: FitFailurePolicy::Abort,
            min_valid_iterations: 1,
        }
    }

    /// Check counts before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PangrowthError::degenerate(
                "iteration count must be at least 1",
            ));
        }
        if self.min_valid_iterations == 0 {
            return Err(PangrowthError::config(
                "minimum valid iterations must be at least 1",
            ));
        }
        if self.min_valid_iterations > self.iterations {
            return Err(PangrowthError::config(format!(
                "minimum valid iterations ({}) exceeds iteration count ({})",
                self.min_valid_iterations, self.iterations
            )));
        }
        self.core.validate()
    }
}
