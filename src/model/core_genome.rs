//! # Core-Genome Sampling
//!
//! ## Role
//! Estimate how many genes are shared by all members of a random subset of
//! `k` genomes, for every `k` in `1..=G`.
//!
//! ## Sampling Scheme
//! For each subset size `k` the sampler produces `repeats` estimates:
//! - `k == 1`: each estimate is the gene count of one uniformly drawn genome.
//!   This is a row sum, not an intersection of a single set; the two agree,
//!   but the row sum path is kept as its own case.
//! - `k > 1`: each estimate draws `draws` subsets of `k` distinct genomes,
//!   intersects the presence rows of each subset, and averages the
//!   intersection sizes.
//!
//! The default inner draw count is the subset size itself
//! ([`DrawCount::SubsetSize`]); [`DrawCount::Fixed`] decouples it from `k`.

use rand::seq::index;
use rand::Rng;

use crate::data::PresenceMatrix;
use crate::error::{PangrowthError, Result};

/// Number of subsets drawn per estimate when `k > 1`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DrawCount {
    /// Draw as many subsets as the subset size
    #[default]
    SubsetSize,
    /// Draw a fixed number of subsets for every size
    Fixed(usize),
}

impl DrawCount {
    /// Inner draw count for subsets of size `k`
    pub fn resolve(self, k: usize) -> usize {
        match self {
            DrawCount::SubsetSize => k,
            DrawCount::Fixed(n) => n,
        }
    }
}

/// Outer repeats and inner draws of the core-genome sampler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreSamplingPlan {
    /// Estimates produced per subset size
    pub repeats: usize,
    /// Subsets averaged into each estimate (`k > 1` only)
    pub draws: DrawCount,
}

impl CoreSamplingPlan {
    /// Plan with `repeats` estimates per size and the default draw count
    pub fn new(repeats: usize) -> Self {
        Self {
            repeats,
            draws: DrawCount::SubsetSize,
        }
    }

    pub fn with_draws(mut self, draws: DrawCount) -> Self {
        self.draws = draws;
        self
    }

    /// Reject plans that would produce no estimates
    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 {
            return Err(PangrowthError::degenerate(
                "core-genome sampling needs at least one repeat",
            ));
        }
        if self.draws == DrawCount::Fixed(0) {
            return Err(PangrowthError::degenerate(
                "core-genome sampling needs at least one draw per repeat",
            ));
        }
        Ok(())
    }
}

/// One sampled core-genome estimate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorePoint {
    /// Subset size `k`
    pub genomes: usize,
    /// Average number of genes common to the sampled subsets
    pub common_genes: f64,
}

/// All core-genome estimates, `repeats` per subset size, sizes ascending
#[derive(Clone, Debug, PartialEq)]
pub struct CoreSamplePoints {
    pub points: Vec<CorePoint>,
}

impl CoreSamplePoints {
    /// Assemble points from per-size estimates.
    ///
    /// `samples` holds `(k, estimates)` pairs; they are emitted in `k` order.
    pub fn from_samples(mut samples: Vec<(usize, Vec<f64>)>) -> Self {
        samples.sort_by_key(|(k, _)| *k);
        let points = samples
            .into_iter()
            .flat_map(|(k, values)| {
                values.into_iter().map(move |common_genes| CorePoint {
                    genomes: k,
                    common_genes,
                })
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean estimate for each subset size, sizes ascending.
    ///
    /// This is the series the core-genome curve is fitted to.
    pub fn means(&self) -> Vec<(usize, f64)> {
        let mut means: Vec<(usize, f64, usize)> = Vec::new();
        for p in &self.points {
            match means.last_mut() {
                Some((k, sum, n)) if *k == p.genomes => {
                    *sum += p.common_genes;
                    *n += 1;
                }
                _ => means.push((p.genomes, p.common_genes, 1)),
            }
        }
        means
            .into_iter()
            .map(|(k, sum, n)| (k, sum / n as f64))
            .collect()
    }
}

/// Estimates for a single subset size `k`.
pub fn sample_subset_size<R: Rng + ?Sized>(
    matrix: &PresenceMatrix,
    k: usize,
    plan: &CoreSamplingPlan,
    rng: &mut R,
) -> Result<Vec<f64>> {
    plan.validate()?;
    let n_genomes = matrix.n_genomes();
    if k == 0 || k > n_genomes {
        return Err(PangrowthError::degenerate(format!(
            "subset size {} outside 1..={}",
            k, n_genomes
        )));
    }

    if k == 1 {
        return Ok((0..plan.repeats)
            .map(|_| matrix.row_sum(rng.random_range(0..n_genomes)) as f64)
            .collect());
    }

    let draws = plan.draws.resolve(k);
    Ok((0..plan.repeats)
        .map(|_| {
            let total: usize = (0..draws)
                .map(|_| {
                    let subset = index::sample(rng, n_genomes, k).into_vec();
                    matrix.intersection_size(&subset)
                })
                .sum();
            total as f64 / draws as f64
        })
        .collect())
}

/// Estimates for every subset size `1..=G`, drawn sequentially from `rng`.
pub fn sample_core_genome<R: Rng + ?Sized>(
    matrix: &PresenceMatrix,
    plan: &CoreSamplingPlan,
    rng: &mut R,
) -> Result<CoreSamplePoints> {
    let samples = (1..=matrix.n_genomes())
        .map(|k| sample_subset_size(matrix, k, plan, rng).map(|values| (k, values)))
        .collect::<Result<Vec<_>>>()?;
    Ok(CoreSamplePoints::from_samples(samples))
}
