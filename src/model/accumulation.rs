//! # Pan-Genome Accumulation
//!
//! ## Role
//! Build one pan-genome accumulation curve: add genomes one at a time in a
//! random order and record how many distinct genes have been seen so far.
//!
//! ## Algorithm
//! 1. Shuffle `0..G` uniformly with the caller's RNG.
//! 2. Start from an all-absent union row.
//! 3. For the h-th genome in order, OR its row into the union and record
//!    `(h, popcount(union))`.
//!
//! The union only grows, so `genes` never decreases, and the final point is
//! always [`PresenceMatrix::pan_size`] whatever the order was.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::{union_into, PresenceMatrix};

/// One point of an accumulation curve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurvePoint {
    /// Genomes added so far (1-based)
    pub genomes: usize,
    /// Distinct genes present in the union of those genomes
    pub genes: usize,
}

/// Pan-genome accumulation curve for a single genome order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccumulationCurve {
    /// Genome order used to build the curve
    pub order: Vec<usize>,
    /// One point per genome, `genomes = 1..=G`
    pub points: Vec<CurvePoint>,
}

impl AccumulationCurve {
    /// Number of points (equals the genome count)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Covariates as `f64`, ready for the fitter
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.genomes as f64).collect()
    }

    /// Responses as `f64`, ready for the fitter
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.genes as f64).collect()
    }

    /// Gene count after all genomes were added
    pub fn final_size(&self) -> usize {
        self.points.last().map_or(0, |p| p.genes)
    }
}

/// Accumulate genomes in the given order.
///
/// `order` may be any sequence of valid genome indices; the simulator passes
/// a full permutation.
pub fn accumulate(matrix: &PresenceMatrix, order: &[usize]) -> AccumulationCurve {
    let mut union = matrix.empty_row();
    let mut points = Vec::with_capacity(order.len());

    for (h, &g) in order.iter().enumerate() {
        union_into(&mut union, matrix.genome(g));
        points.push(CurvePoint {
            genomes: h + 1,
            genes: union.count_ones(),
        });
    }

    AccumulationCurve {
        order: order.to_vec(),
        points,
    }
}

/// Uniformly random permutation of `0..n_genomes`
pub fn random_order<R: Rng + ?Sized>(n_genomes: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_genomes).collect();
    order.shuffle(rng);
    order
}

/// One accumulation curve over a fresh random genome order
pub fn simulate<R: Rng + ?Sized>(matrix: &PresenceMatrix, rng: &mut R) -> AccumulationCurve {
    let order = random_order(matrix.n_genomes(), rng);
    accumulate(matrix, &order)
}
