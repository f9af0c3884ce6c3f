//! # Analysis Pipeline
//!
//! Full run over one presence matrix: pan-genome accumulation and fitting,
//! then core-genome sampling and fitting. Produces an [`AnalysisReport`] that
//! the reporting layer writes to disk.

use std::sync::Arc;

use tracing::{info, info_span};

use crate::data::PresenceMatrix;
use crate::error::Result;
use crate::model::classify::PanGenomeStatus;
use crate::model::fit::FitOptions;
use crate::pipelines::core_genome::{CoreGenomeAnalysis, CoreGenomePipeline};
use crate::pipelines::pangenome::{check_genome_count, PanGenomeAnalysis, PanGenomePipeline};
use crate::pipelines::AnalysisOptions;
use crate::utils::telemetry::{Stage, TelemetryBlackboard};

/// Result of a complete analysis run
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    pub n_genomes: usize,
    pub n_genes: usize,
    /// Genome labels from the input table, indexed like curve orders
    pub genome_names: Vec<String>,
    /// Master seed the run was driven by
    pub seed: u64,
    pub pan: PanGenomeAnalysis,
    pub core: CoreGenomeAnalysis,
}

impl AnalysisReport {
    pub fn status(&self) -> PanGenomeStatus {
        self.pan.status()
    }
}

pub struct AnalysisPipeline {
    options: AnalysisOptions,
    fit_options: FitOptions,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl AnalysisPipeline {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            fit_options: FitOptions::default(),
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryBlackboard>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_fit_options(mut self, fit_options: FitOptions) -> Self {
        self.fit_options = fit_options;
        self
    }

    pub fn run(&self, matrix: &PresenceMatrix) -> Result<AnalysisReport> {
        let _span = info_span!("analysis", seed = self.options.seed).entered();

        // Reject degenerate input before any sampling starts
        self.options.validate()?;
        check_genome_count(matrix)?;

        info!(
            n_genomes = matrix.n_genomes(),
            n_genes = matrix.n_genes(),
            pan_size = matrix.pan_size(),
            core_size = matrix.core_size(),
            iterations = self.options.iterations,
            seed = self.options.seed,
            "starting analysis"
        );

        self.stage(Stage::PanGenome);
        let pan = PanGenomePipeline::new(self.options.clone(), self.telemetry.clone())
            .with_fit_options(self.fit_options.clone())
            .run(matrix)?;

        self.stage(Stage::CoreGenome);
        let core = CoreGenomePipeline::new(
            self.options.core,
            self.options.seed,
            self.telemetry.clone(),
        )
        .with_fit_options(self.fit_options.clone())
        .run(matrix)?;

        Ok(AnalysisReport {
            n_genomes: matrix.n_genomes(),
            n_genes: matrix.n_genes(),
            genome_names: matrix.genome_names().to_vec(),
            seed: self.options.seed,
            pan,
            core,
        })
    }

    fn stage(&self, stage: Stage) {
        if let Some(t) = &self.telemetry {
            t.set_stage(stage);
        }
    }
}
