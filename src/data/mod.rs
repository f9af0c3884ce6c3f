//! # Data Module
//!
//! In-memory representation of the gene presence/absence table.
//!
//! ## Design
//! - **Genome-major rows:** each genome is one bit-packed row over all genes,
//!   so unions and intersections of genomes are word-wide bit operations.
//! - **Immutable after load:** the matrix is shared by `&` reference across
//!   rayon workers; every simulation keeps its own scratch accumulator.

pub mod matrix;

pub use matrix::{intersect_into, union_into, PresenceMatrix, PresenceMatrixBuilder, PresenceRow};
