//! # Configuration
//!
//! ## Role
//! CLI argument parsing and validation. [`Config::analysis_options`] turns the
//! parsed flags into the library's [`AnalysisOptions`], so nothing below the
//! binary depends on clap.
//!
//! ## Example CLI
//! ```bash
//! pangrowth -f gene_presence_absence.Rtab -i 100 -o results --seed 7 --write-points
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::error::{PangrowthError, Result};
use crate::model::core_genome::{CoreSamplingPlan, DrawCount};
use crate::pipelines::{AnalysisOptions, FitFailurePolicy};

/// Pan-genome growth curves and Heaps' law openness classification
#[derive(Parser, Debug, Clone)]
#[command(name = "pangrowth", version, about)]
pub struct Config {
    /// Gene presence/absence table (.Rtab, optionally .gz)
    #[arg(short = 'f', long = "input-file", value_name = "PATH")]
    pub input_file: PathBuf,

    /// Number of random genome orders (pan-genome iterations)
    #[arg(short = 'i', long, default_value_t = 10)]
    pub iterations: usize,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Master random seed; drawn at random and logged when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub nthreads: Option<usize>,

    /// Core-genome estimates per subset size (default: --iterations)
    #[arg(long)]
    pub core_repeats: Option<usize>,

    /// Subsets averaged per core-genome estimate (default: the subset size)
    #[arg(long)]
    pub core_draws: Option<usize>,

    /// What to do when an iteration's fit fails: abort or skip
    #[arg(long, default_value = "abort")]
    pub on_fit_failure: FitFailurePolicy,

    /// Fewest successful iterations accepted when skipping failed fits
    #[arg(long, default_value_t = 1)]
    pub min_valid_iterations: usize,

    /// Also write every curve point as TSV
    #[arg(long)]
    pub write_points: bool,

    /// Seconds between progress heartbeats (0 disables)
    #[arg(long, default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// Emit span timings
    #[arg(long)]
    pub profile: bool,
}

impl Config {
    /// Parse command line arguments and validate
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.input_file.exists() {
            return Err(PangrowthError::FileNotFound {
                path: self.input_file.clone(),
            });
        }
        if self.iterations == 0 {
            return Err(PangrowthError::config("--iterations must be at least 1"));
        }
        if self.nthreads == Some(0) {
            return Err(PangrowthError::config("--nthreads must be at least 1"));
        }
        if self.core_repeats == Some(0) {
            return Err(PangrowthError::config("--core-repeats must be at least 1"));
        }
        if self.core_draws == Some(0) {
            return Err(PangrowthError::config("--core-draws must be at least 1"));
        }
        if self.min_valid_iterations == 0 || self.min_valid_iterations > self.iterations {
            return Err(PangrowthError::config(format!(
                "--min-valid-iterations must be between 1 and --iterations ({})",
                self.iterations
            )));
        }
        Ok(())
    }

    /// Get number of threads to use
    pub fn nthreads(&self) -> usize {
        self.nthreads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// The configured seed, or a fresh one from the OS-seeded thread RNG
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Library options for a run driven by `seed`
    pub fn analysis_options(&self, seed: u64) -> AnalysisOptions {
        let draws = self.core_draws.map_or(DrawCount::SubsetSize, DrawCount::Fixed);
        let mut options = AnalysisOptions::new(self.iterations, seed);
        options.core = CoreSamplingPlan::new(self.core_repeats.unwrap_or(self.iterations))
            .with_draws(draws);
        options.on_fit_failure = self.on_fit_failure;
        options.min_valid_iterations = self.min_valid_iterations;
        options
    }
}
