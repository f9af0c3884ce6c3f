//! # Core-Genome Pipeline
//!
//! Estimates the expected number of genes shared by random genome subsets of
//! every size `k = 1..=G`, then fits Heaps' law to the per-size means. Each
//! subset size runs on its own RNG stream, so sizes are sampled in parallel.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, info_span, instrument};

use crate::data::PresenceMatrix;
use crate::error::{PangrowthError, Result};
use crate::model::core_genome::{sample_subset_size, CoreSamplePoints, CoreSamplingPlan};
use crate::model::fit::{fit_heaps_law_with, FitOptions, FitParams};
use crate::utils::telemetry::TelemetryBlackboard;
use crate::utils::threading::subset_size_rng;

/// Core-genome estimates and the curve fitted to their means
#[derive(Clone, Debug)]
pub struct CoreGenomeAnalysis {
    pub points: CoreSamplePoints,
    pub fit: FitParams,
}

pub struct CoreGenomePipeline {
    plan: CoreSamplingPlan,
    seed: u64,
    fit_options: FitOptions,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl CoreGenomePipeline {
    pub fn new(
        plan: CoreSamplingPlan,
        seed: u64,
        telemetry: Option<Arc<TelemetryBlackboard>>,
    ) -> Self {
        Self {
            plan,
            seed,
            fit_options: FitOptions::default(),
            telemetry,
        }
    }

    pub fn with_fit_options(mut self, fit_options: FitOptions) -> Self {
        self.fit_options = fit_options;
        self
    }

    #[instrument(skip_all, fields(repeats = self.plan.repeats, n_genomes = matrix.n_genomes()))]
    pub fn run(&self, matrix: &PresenceMatrix) -> Result<CoreGenomeAnalysis> {
        self.plan.validate()?;
        let n_genomes = matrix.n_genomes();
        if n_genomes <= 1 {
            return Err(PangrowthError::degenerate(format!(
                "need at least 2 genomes to fit the core-genome curve, found {}",
                n_genomes
            )));
        }
        if let Some(t) = &self.telemetry {
            t.begin_subset_sizes(n_genomes);
        }

        let samples = info_span!("core_sampling").in_scope(|| {
            (1..=n_genomes)
                .into_par_iter()
                .map(|k| {
                    let mut rng = subset_size_rng(self.seed, k);
                    let values = sample_subset_size(matrix, k, &self.plan, &mut rng)?;
                    if let Some(t) = &self.telemetry {
                        t.subset_size_done();
                    }
                    Ok((k, values))
                })
                .collect::<Result<Vec<_>>>()
        })?;
        let points = CoreSamplePoints::from_samples(samples);

        let (xs, ys): (Vec<f64>, Vec<f64>) = points
            .means()
            .into_iter()
            .map(|(k, mean)| (k as f64, mean))
            .unzip();
        let fit = fit_heaps_law_with(&xs, &ys, &self.fit_options)
            .map_err(|e| PangrowthError::fit(format!("core-genome: {}", e)))?;

        info!(
            k = fit.k,
            gamma = fit.alpha,
            points = points.len(),
            "core-genome fit"
        );
        Ok(CoreGenomeAnalysis { points, fit })
    }
}
