//! # Presence Matrix
//!
//! Genome-major gene presence/absence matrix (genomes x genes), one
//! bit-packed row per genome. Rows are built gene by gene from the input
//! table (which is gene-major) and never change afterwards.

use bitvec::prelude::*;

use crate::error::{PangrowthError, Result};

/// A genome's presence row: bit `j` is set when gene `j` is present.
pub type PresenceRow = BitVec<u64, Lsb0>;

/// OR `row` into `acc` word by word. Both rows must have the same length.
#[inline]
pub fn union_into(acc: &mut PresenceRow, row: &PresenceRow) {
    debug_assert_eq!(acc.len(), row.len());
    for (a, &b) in acc.as_raw_mut_slice().iter_mut().zip(row.as_raw_slice()) {
        *a |= b;
    }
}

/// AND `row` into `acc` word by word. Both rows must have the same length.
#[inline]
pub fn intersect_into(acc: &mut PresenceRow, row: &PresenceRow) {
    debug_assert_eq!(acc.len(), row.len());
    for (a, &b) in acc.as_raw_mut_slice().iter_mut().zip(row.as_raw_slice()) {
        *a &= b;
    }
}

/// Binary presence/absence matrix indexed by (genome, gene).
#[derive(Clone, Debug)]
pub struct PresenceMatrix {
    /// One row per genome, each `n_genes` bits long
    rows: Vec<PresenceRow>,

    /// Number of genes (row length)
    n_genes: usize,

    /// Genome labels, in column order of the input table
    genome_names: Vec<String>,
}

impl PresenceMatrix {
    /// Build a matrix from genome-major boolean rows.
    ///
    /// Genomes are named `genome_<i>`. Rows must all have the same length.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let n_genes = rows.first().map_or(0, Vec::len);
        let mut packed = Vec::with_capacity(rows.len());
        for (g, row) in rows.iter().enumerate() {
            if row.len() != n_genes {
                return Err(PangrowthError::input_shape(
                    g + 1,
                    format!(
                        "genome {} has {} genes, expected {}",
                        g,
                        row.len(),
                        n_genes
                    ),
                ));
            }
            packed.push(row.iter().copied().collect::<PresenceRow>());
        }

        Ok(Self {
            rows: packed,
            n_genes,
            genome_names: (0..rows.len()).map(|g| format!("genome_{}", g)).collect(),
        })
    }

    /// Number of genomes (G)
    pub fn n_genomes(&self) -> usize {
        self.rows.len()
    }

    /// Number of genes (M)
    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    /// Presence row of one genome
    #[inline]
    pub fn genome(&self, g: usize) -> &PresenceRow {
        &self.rows[g]
    }

    /// Number of genes present in genome `g`
    #[inline]
    pub fn row_sum(&self, g: usize) -> usize {
        self.rows[g].count_ones()
    }

    /// Genome labels
    pub fn genome_names(&self) -> &[String] {
        &self.genome_names
    }

    /// An all-absent row of the right length, for use as an accumulator
    pub fn empty_row(&self) -> PresenceRow {
        bitvec![u64, Lsb0; 0; self.n_genes]
    }

    /// Number of genes present in at least one genome (pan-genome size).
    ///
    /// Independent of genome order: this is the last point of every
    /// accumulation curve.
    pub fn pan_size(&self) -> usize {
        let mut union = self.empty_row();
        for row in &self.rows {
            union_into(&mut union, row);
        }
        union.count_ones()
    }

    /// Number of genes present in every genome (core-genome size)
    pub fn core_size(&self) -> usize {
        let all: Vec<usize> = (0..self.n_genomes()).collect();
        self.intersection_size(&all)
    }

    /// Number of genes present in all genomes of `subset`.
    ///
    /// An empty subset has no common genes.
    pub fn intersection_size(&self, subset: &[usize]) -> usize {
        let Some((&first, rest)) = subset.split_first() else {
            return 0;
        };
        let mut common = self.rows[first].clone();
        for &g in rest {
            intersect_into(&mut common, &self.rows[g]);
        }
        common.count_ones()
    }
}

/// Incremental builder that transposes gene-major input into genome rows.
#[derive(Debug)]
pub struct PresenceMatrixBuilder {
    rows: Vec<PresenceRow>,
    genome_names: Vec<String>,
    n_genes: usize,
}

impl PresenceMatrixBuilder {
    /// Start a matrix with the given genome labels (one row per label)
    pub fn new(genome_names: Vec<String>) -> Self {
        Self {
            rows: vec![PresenceRow::new(); genome_names.len()],
            genome_names,
            n_genes: 0,
        }
    }

    /// Number of genomes the builder expects per gene
    pub fn n_genomes(&self) -> usize {
        self.genome_names.len()
    }

    /// Append one gene with its presence flag in every genome.
    ///
    /// `flags` must have exactly one entry per genome.
    pub fn push_gene(&mut self, flags: &[bool]) -> Result<()> {
        if flags.len() != self.rows.len() {
            return Err(PangrowthError::input_shape(
                self.n_genes + 2,
                format!(
                    "expected {} presence flags, found {}",
                    self.rows.len(),
                    flags.len()
                ),
            ));
        }
        for (row, &present) in self.rows.iter_mut().zip(flags) {
            row.push(present);
        }
        self.n_genes += 1;
        Ok(())
    }

    /// Finish the matrix
    pub fn build(self) -> PresenceMatrix {
        PresenceMatrix {
            n_genes: self.n_genes,
            rows: self.rows,
            genome_names: self.genome_names,
        }
    }
}
