//! # Telemetry Blackboard
//!
//! Thread-safe progress tracking for the accumulation and sampling loops.
//! Uses atomic counters that can be cheaply updated from rayon parallel iterators.
//!
//! The blackboard pattern decouples work execution from progress reporting:
//! - Worker threads bump atomic counters after each unit of work
//! - A background heartbeat thread periodically logs a [`Progress`] snapshot

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::info;

/// Processing stage for high-level progress tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Initializing = 0,
    LoadingData = 1,
    PanGenome = 2,
    CoreGenome = 3,
    WritingOutput = 4,
    Complete = 5,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Initializing => "initializing",
            Stage::LoadingData => "loading table",
            Stage::PanGenome => "pan-genome curves",
            Stage::CoreGenome => "core-genome sampling",
            Stage::WritingOutput => "writing report",
            Stage::Complete => "complete",
        }
    }

    fn from_u64(val: u64) -> Self {
        match val {
            0 => Stage::Initializing,
            1 => Stage::LoadingData,
            2 => Stage::PanGenome,
            3 => Stage::CoreGenome,
            4 => Stage::WritingOutput,
            _ => Stage::Complete,
        }
    }
}

/// Shared progress counters.
///
/// Relaxed ordering throughout: the heartbeat only needs approximate values.
pub struct TelemetryBlackboard {
    stage: AtomicU64,
    iterations_done: AtomicU64,
    total_iterations: AtomicU64,
    subset_sizes_done: AtomicU64,
    total_subset_sizes: AtomicU64,
    /// Nanoseconds since `start_time` at which the current stage began
    stage_started_nanos: AtomicU64,
    start_time: Instant,
}

impl TelemetryBlackboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[inline]
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage as u64, Ordering::Relaxed);
        self.stage_started_nanos
            .store(self.start_time.elapsed().as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        Stage::from_u64(self.stage.load(Ordering::Relaxed))
    }

    /// Start a pan-genome run of `total` iterations
    pub fn begin_iterations(&self, total: usize) {
        self.iterations_done.store(0, Ordering::Relaxed);
        self.total_iterations.store(total as u64, Ordering::Relaxed);
    }

    /// One simulate+fit iteration finished
    #[inline]
    pub fn iteration_done(&self) {
        self.iterations_done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn iterations_done(&self) -> u64 {
        self.iterations_done.load(Ordering::Relaxed)
    }

    /// Start a core-genome sweep over `total` subset sizes
    pub fn begin_subset_sizes(&self, total: usize) {
        self.subset_sizes_done.store(0, Ordering::Relaxed);
        self.total_subset_sizes.store(total as u64, Ordering::Relaxed);
    }

    /// All estimates for one subset size finished
    #[inline]
    pub fn subset_size_done(&self) {
        self.subset_sizes_done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subset_sizes_done(&self) -> u64 {
        self.subset_sizes_done.load(Ordering::Relaxed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Work units of the current stage: iterations while building pan-genome
    /// curves, subset sizes while sampling the core genome.
    pub fn progress(&self) -> Progress {
        let stage = self.stage();
        let (done, total) = match stage {
            Stage::PanGenome => (self.iterations_done(), self.total_iterations.load(Ordering::Relaxed)),
            Stage::CoreGenome => (
                self.subset_sizes_done(),
                self.total_subset_sizes.load(Ordering::Relaxed),
            ),
            _ => (0, 0),
        };
        let now = self.start_time.elapsed().as_nanos() as u64;
        let started = self.stage_started_nanos.load(Ordering::Relaxed);
        Progress {
            stage,
            done,
            total,
            stage_secs: now.saturating_sub(started) as f64 / 1e9,
        }
    }
}

impl Default for TelemetryBlackboard {
    fn default() -> Self {
        Self {
            stage: AtomicU64::new(Stage::Initializing as u64),
            iterations_done: AtomicU64::new(0),
            total_iterations: AtomicU64::new(0),
            subset_sizes_done: AtomicU64::new(0),
            total_subset_sizes: AtomicU64::new(0),
            stage_started_nanos: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

/// Point-in-time view of the current stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    pub done: u64,
    pub total: u64,
    /// Seconds spent in the current stage
    pub stage_secs: f64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        match self.stage {
            Stage::WritingOutput | Stage::Complete => 100.0,
            _ if self.total == 0 => 0.0,
            _ => (self.done as f64 / self.total as f64 * 100.0).min(100.0),
        }
    }

    /// Remaining seconds at the stage's average rate, once a unit has finished
    pub fn eta_secs(&self) -> Option<f64> {
        if self.done == 0 || self.done >= self.total {
            return None;
        }
        let per_unit = self.stage_secs / self.done as f64;
        Some(per_unit * (self.total - self.done) as f64)
    }
}

/// Heartbeat output configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Seconds between progress events
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Handle to the heartbeat thread. Dropping it stops the thread without
/// waiting; [`HeartbeatHandle::shutdown`] stops and joins.
pub struct HeartbeatHandle {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    pub fn spawn(blackboard: Arc<TelemetryBlackboard>, config: HeartbeatConfig) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let interval = Duration::from_secs(config.interval_secs.max(1));

        let handle = thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || {
                // Any message, or the sender going away, ends the loop
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
                    log_progress(&blackboard.progress(), blackboard.elapsed_secs());
                }
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn shutdown(mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn log_progress(progress: &Progress, elapsed_secs: f64) {
    match progress.eta_secs() {
        Some(eta) => info!(
            stage = progress.stage.as_str(),
            done = progress.done,
            total = progress.total,
            elapsed_secs = elapsed_secs.round(),
            eta_secs = eta.round(),
            "progress {:.1}%",
            progress.percent()
        ),
        None => info!(
            stage = progress.stage.as_str(),
            done = progress.done,
            total = progress.total,
            elapsed_secs = elapsed_secs.round(),
            "progress {:.1}%",
            progress.percent()
        ),
    }
}
