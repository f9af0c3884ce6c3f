//! # Pan-Genome Pipeline
//!
//! Orchestrates the pan-genome side of the analysis:
//! 1. For each of T iterations (parallel), seed a private RNG from the master
//!    seed and the iteration index
//! 2. Simulate one accumulation curve over a random genome order
//! 3. Fit Heaps' law to the curve
//! 4. Apply the fit-failure policy in iteration order
//! 5. Average the surviving fits and classify the pan-genome
//!
//! Iterations share only the read-only matrix, so the output for a given
//! seed does not depend on the number of worker threads.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, info_span, instrument, warn};

use crate::data::PresenceMatrix;
use crate::error::{PangrowthError, Result};
use crate::model::accumulation::{simulate, AccumulationCurve};
use crate::model::classify::{aggregate, Aggregate, PanGenomeStatus};
use crate::model::fit::{fit_heaps_law_with, FitError, FitOptions, FitParams};
use crate::pipelines::{AnalysisOptions, FitFailurePolicy};
use crate::utils::telemetry::TelemetryBlackboard;
use crate::utils::threading::iteration_rng;

/// Fit of one successful iteration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationFit {
    /// 0-based iteration index
    pub iteration: usize,
    pub params: FitParams,
}

/// An iteration dropped under [`FitFailurePolicy::Skip`]
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedIteration {
    /// 0-based iteration index
    pub iteration: usize,
    pub error: FitError,
}

/// Everything the pan-genome side produces
#[derive(Clone, Debug)]
pub struct PanGenomeAnalysis {
    /// One curve per iteration, in iteration order (skipped ones included)
    pub curves: Vec<AccumulationCurve>,
    /// Successful fits, in iteration order
    pub fits: Vec<IterationFit>,
    /// Iterations whose fit failed and were dropped
    pub skipped: Vec<SkippedIteration>,
    /// Mean parameters and the open/closed call
    pub aggregate: Aggregate,
}

impl PanGenomeAnalysis {
    /// Iterations that contributed to the averages (T')
    pub fn iterations_used(&self) -> usize {
        self.fits.len()
    }

    pub fn iterations_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn status(&self) -> PanGenomeStatus {
        self.aggregate.status
    }
}

/// Pan-genome accumulation pipeline
pub struct PanGenomePipeline {
    options: AnalysisOptions,
    fit_options: FitOptions,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl PanGenomePipeline {
    pub fn new(options: AnalysisOptions, telemetry: Option<Arc<TelemetryBlackboard>>) -> Self {
        Self {
            options,
            fit_options: FitOptions::default(),
            telemetry,
        }
    }

    /// Override the solver tolerances used for every iteration
    pub fn with_fit_options(mut self, fit_options: FitOptions) -> Self {
        self.fit_options = fit_options;
        self
    }

    /// Run all iterations against `matrix`
    #[instrument(skip_all, fields(iterations = self.options.iterations, n_genomes = matrix.n_genomes()))]
    pub fn run(&self, matrix: &PresenceMatrix) -> Result<PanGenomeAnalysis> {
        self.options.validate()?;
        check_genome_count(matrix)?;

        let n_iterations = self.options.iterations;
        let seed = self.options.seed;
        if let Some(t) = &self.telemetry {
            t.begin_iterations(n_iterations);
        }

        let outcomes: Vec<(AccumulationCurve, std::result::Result<FitParams, FitError>)> =
            info_span!("pan_iterations").in_scope(|| {
                (0..n_iterations)
                    .into_par_iter()
                    .map(|i| {
                        let mut rng = iteration_rng(seed, i);
                        let curve = simulate(matrix, &mut rng);
                        let fit = fit_heaps_law_with(&curve.xs(), &curve.ys(), &self.fit_options);
                        if let Some(t) = &self.telemetry {
                            t.iteration_done();
                        }
                        (curve, fit)
                    })
                    .collect()
            });

        let (curves, fits): (Vec<_>, Vec<_>) = outcomes.into_iter().unzip();
        let (fits, skipped) = resolve_fits(
            fits,
            self.options.on_fit_failure,
            self.options.min_valid_iterations,
        )?;

        let params: Vec<FitParams> = fits.iter().map(|f| f.params).collect();
        let aggregate = aggregate(&params)?;
        info!(
            avg_k = aggregate.avg_k,
            avg_gamma = aggregate.avg_alpha,
            used = fits.len(),
            skipped = skipped.len(),
            status = %aggregate.status,
            "pan-genome fit"
        );

        Ok(PanGenomeAnalysis {
            curves,
            fits,
            skipped,
            aggregate,
        })
    }
}

/// A curve needs at least two genomes to have two distinct x values
pub(crate) fn check_genome_count(matrix: &PresenceMatrix) -> Result<()> {
    if matrix.n_genomes() <= 1 {
        return Err(PangrowthError::degenerate(format!(
            "need at least 2 genomes to fit accumulation curves, found {}",
            matrix.n_genomes()
        )));
    }
    Ok(())
}

/// Apply the failure policy to per-iteration fit results, in iteration order.
fn resolve_fits(
    results: Vec<std::result::Result<FitParams, FitError>>,
    policy: FitFailurePolicy,
    min_valid: usize,
) -> Result<(Vec<IterationFit>, Vec<SkippedIteration>)> {
    let total = results.len();
    let mut fits = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (iteration, result) in results.into_iter().enumerate() {
        match result {
            Ok(params) => {
                debug!(iteration, k = params.k, gamma = params.alpha, "iteration fit");
                fits.push(IterationFit { iteration, params });
            }
            Err(error) => match policy {
                FitFailurePolicy::Abort => {
                    return Err(PangrowthError::fit(format!(
                        "iteration {}: {}",
                        iteration + 1,
                        error
                    )));
                }
                FitFailurePolicy::Skip => {
                    warn!(iteration = iteration + 1, %error, "skipping iteration with failed fit");
                    skipped.push(SkippedIteration { iteration, error });
                }
            },
        }
    }

    if fits.len() < min_valid {
        return Err(PangrowthError::degenerate(format!(
            "only {} of {} iterations produced a fit ({} skipped), need at least {}",
            fits.len(),
            total,
            skipped.len(),
            min_valid
        )));
    }
    Ok((fits, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_matrix() -> PresenceMatrix {
        // Every genome carries 5 shared genes plus 3 genes of its own
        let n_genomes = 8;
        let n_genes = 5 + 3 * n_genomes;
        let rows: Vec<Vec<bool>> = (0..n_genomes)
            .map(|g| {
                (0..n_genes)
                    .map(|j| j < 5 || (j - 5) / 3 == g)
                    .collect()
            })
            .collect();
        PresenceMatrix::from_rows(&rows).unwrap()
    }

    fn failure() -> FitError {
        FitError::MaxIterations {
            model: "heaps_law",
            max_iterations: 1,
        }
    }

    #[test]
    fn test_open_pangenome() {
        let m = open_matrix();
        let analysis = PanGenomePipeline::new(AnalysisOptions::new(6, 99), None)
            .run(&m)
            .unwrap();

        assert_eq!(analysis.curves.len(), 6);
        assert_eq!(analysis.iterations_used(), 6);
        assert_eq!(analysis.iterations_skipped(), 0);
        assert_eq!(analysis.status(), PanGenomeStatus::Open);
        for curve in &analysis.curves {
            assert_eq!(curve.final_size(), m.pan_size());
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let m = open_matrix();
        let a = PanGenomePipeline::new(AnalysisOptions::new(5, 1234), None)
            .run(&m)
            .unwrap();
        let b = PanGenomePipeline::new(AnalysisOptions::new(5, 1234), None)
            .run(&m)
            .unwrap();
        assert_eq!(a.curves, b.curves);
        assert_eq!(a.fits, b.fits);
        assert_eq!(a.aggregate, b.aggregate);
    }

    #[test]
    fn test_single_genome_is_degenerate() {
        let m = PresenceMatrix::from_rows(&[vec![true, true]]).unwrap();
        let err = PanGenomePipeline::new(AnalysisOptions::new(3, 0), None)
            .run(&m)
            .unwrap_err();
        assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
    }

    #[test]
    fn test_zero_iterations_is_degenerate() {
        let err = PanGenomePipeline::new(AnalysisOptions::new(0, 0), None)
            .run(&open_matrix())
            .unwrap_err();
        assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
    }

    #[test]
    fn test_abort_policy_propagates_fit_failure() {
        let opts = FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        };
        let err = PanGenomePipeline::new(AnalysisOptions::new(3, 5), None)
            .with_fit_options(opts)
            .run(&open_matrix())
            .unwrap_err();
        assert!(matches!(err, PangrowthError::FitConvergence { .. }));
    }

    #[test]
    fn test_skip_policy_with_all_failures_is_degenerate() {
        let opts = FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        };
        let mut options = AnalysisOptions::new(3, 5);
        options.on_fit_failure = FitFailurePolicy::Skip;
        let err = PanGenomePipeline::new(options, None)
            .with_fit_options(opts)
            .run(&open_matrix())
            .unwrap_err();
        assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
    }

    #[test]
    fn test_resolve_fits_skip_accounting() {
        let results = vec![
            Ok(FitParams::new(10.0, 0.5)),
            Err(failure()),
            Ok(FitParams::new(12.0, 0.3)),
            Err(failure()),
        ];
        let (fits, skipped) = resolve_fits(results, FitFailurePolicy::Skip, 2).unwrap();
        assert_eq!(fits.len(), 2);
        assert_eq!(fits[1].iteration, 2);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].iteration, 1);
        assert_eq!(skipped[1].iteration, 3);
    }

    #[test]
    fn test_resolve_fits_min_valid_threshold() {
        let results = vec![Ok(FitParams::new(10.0, 0.5)), Err(failure()), Err(failure())];
        let err = resolve_fits(results, FitFailurePolicy::Skip, 2).unwrap_err();
        assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
    }

    #[test]
    fn test_resolve_fits_abort_reports_iteration() {
        let results = vec![Ok(FitParams::new(10.0, 0.5)), Err(failure())];
        let err = resolve_fits(results, FitFailurePolicy::Abort, 1).unwrap_err();
        assert!(err.to_string().contains("iteration 2"));
    }

    #[test]
    fn test_telemetry_counts_iterations() {
        let telemetry = TelemetryBlackboard::new();
        PanGenomePipeline::new(AnalysisOptions::new(4, 3), Some(telemetry.clone()))
            .run(&open_matrix())
            .unwrap();
        assert_eq!(telemetry.iterations_done(), 4);
    }
}
