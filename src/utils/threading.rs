//! # Threading Configuration
//!
//! Rayon pool setup and the per-unit RNG seeding that keeps parallel runs
//! reproducible: every iteration (and every core-genome subset size) gets
//! its own `StdRng` derived from the master seed, so results do not depend
//! on how rayon schedules the work.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{PangrowthError, Result};

/// Separates the core-genome streams from the pan-genome iteration streams
const CORE_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Create a configured thread pool.
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("pangrowth-worker-{}", i))
        .build()
        .map_err(|e| PangrowthError::config(format!("Failed to create thread pool: {}", e)))
}

/// RNG for pan-genome iteration `iteration`
pub fn iteration_rng(seed: u64, iteration: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(iteration as u64))
}

/// RNG for the core-genome estimates of subset size `k`
pub fn subset_size_rng(seed: u64, k: usize) -> StdRng {
    StdRng::seed_from_u64((seed ^ CORE_STREAM_SALT).wrapping_add(k as u64))
}
