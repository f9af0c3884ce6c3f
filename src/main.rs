//! # Pangrowth: Pan-Genome Growth and Openness
//!
//! Simulates pan-genome accumulation over random genome orders, fits Heaps'
//! law, and reports whether the pan-genome is open or closed.
//!
//! ## Usage
//! ```bash
//! pangrowth -f gene_presence_absence.Rtab -i 100 -o results
//!
//! # Reproducible run with point dumps
//! pangrowth -f gene_presence_absence.Rtab -o results --seed 42 --write-points
//!
//! # With profiling output
//! pangrowth -f gene_presence_absence.Rtab -o results --profile
//! ```

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pangrowth::config::Config;
use pangrowth::io::{read_rtab, write_report};
use pangrowth::pipelines::AnalysisPipeline;
use pangrowth::utils::telemetry::{HeartbeatConfig, HeartbeatHandle, Stage, TelemetryBlackboard};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Structured logging to stderr; `--profile` adds span close timings
fn init_tracing(profile: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if profile {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(false)
                    .with_timer(fmt::time::uptime()),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init();
    }
}

fn run() -> Result<()> {
    let start = Instant::now();

    let config = Config::parse_and_validate().context("invalid arguments")?;
    init_tracing(config.profile);

    // Configure thread pool
    let n_threads = config.nthreads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .ok();

    let seed = config.resolve_seed();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        threads = n_threads,
        seed,
        "pangrowth"
    );

    let telemetry = TelemetryBlackboard::new();
    let heartbeat = if config.heartbeat_secs > 0 {
        let cfg = HeartbeatConfig {
            interval_secs: config.heartbeat_secs,
        };
        Some(HeartbeatHandle::spawn(telemetry.clone(), cfg).context("failed to start heartbeat")?)
    } else {
        None
    };

    telemetry.set_stage(Stage::LoadingData);
    let matrix = read_rtab(&config.input_file)
        .with_context(|| format!("failed to load {}", config.input_file.display()))?;

    let report = AnalysisPipeline::new(config.analysis_options(seed))
        .with_telemetry(telemetry.clone())
        .run(&matrix)
        .context("analysis failed")?;

    telemetry.set_stage(Stage::WritingOutput);
    write_report(&config.output_dir, &report, config.write_points).with_context(|| {
        format!("failed to write report to {}", config.output_dir.display())
    })?;

    telemetry.set_stage(Stage::Complete);
    if let Some(hb) = heartbeat {
        hb.shutdown();
    }

    let agg = &report.pan.aggregate;
    info!(
        k = agg.avg_k,
        gamma = agg.avg_alpha,
        iterations_used = report.pan.iterations_used(),
        iterations_skipped = report.pan.iterations_skipped(),
        core_k = report.core.fit.k,
        core_gamma = report.core.fit.alpha,
        "Pan-genome is {}",
        agg.status
    );

    eprintln!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

