//! # Report Writer
//!
//! Writes analysis results into the output directory.
//!
//! ## Files
//! - `pan_genome_statistics.txt`: averaged `k`, `gamma` and the open/closed call
//! - `pan_genome_points.tsv`: every accumulation curve point, with the genome
//!   added at each step (`--write-points`)
//! - `core_genome_points.tsv`: every core-genome estimate (`--write-points`)
//! - `fit_parameters.tsv`: per-iteration pan fits, their mean, and the core fit
//! - `fitted_curves.tsv`: mean pan curve and core curve evaluated at `1..=G`
//!
//! Floats use Rust's shortest round-trip formatting.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::model::accumulation::AccumulationCurve;
use crate::model::classify::Aggregate;
use crate::model::core_genome::CoreSamplePoints;
use crate::model::fit::FitParams;
use crate::pipelines::{AnalysisReport, IterationFit};

pub const STATISTICS_FILE: &str = "pan_genome_statistics.txt";
pub const PAN_POINTS_FILE: &str = "pan_genome_points.tsv";
pub const CORE_POINTS_FILE: &str = "core_genome_points.tsv";
pub const FIT_PARAMETERS_FILE: &str = "fit_parameters.tsv";
pub const FITTED_CURVES_FILE: &str = "fitted_curves.tsv";

fn create(path: &Path) -> Result<BufWriter<File>> {
    debug!(path = %path.display(), "writing");
    Ok(BufWriter::new(File::create(path)?))
}

/// `k = ..`, `gamma = ..`, `Pan-genome is open|closed`
pub fn write_statistics(dir: &Path, aggregate: &Aggregate) -> Result<PathBuf> {
    let path = dir.join(STATISTICS_FILE);
    let mut out = create(&path)?;
    writeln!(out, "k = {}", aggregate.avg_k)?;
    writeln!(out, "gamma = {}", aggregate.avg_alpha)?;
    writeln!(out, "Pan-genome is {}", aggregate.status)?;
    out.flush()?;
    Ok(path)
}

/// One row per curve point; iterations are 1-based and `genome` names the
/// genome added at that step.
pub fn write_pan_points(
    dir: &Path,
    curves: &[AccumulationCurve],
    genome_names: &[String],
) -> Result<PathBuf> {
    let path = dir.join(PAN_POINTS_FILE);
    let mut out = create(&path)?;
    writeln!(out, "iteration\tgenomes\tgenes\tgenome")?;
    for (i, curve) in curves.iter().enumerate() {
        for (p, &g) in curve.points.iter().zip(&curve.order) {
            let name = genome_names.get(g).map_or("", String::as_str);
            writeln!(out, "{}\t{}\t{}\t{}", i + 1, p.genomes, p.genes, name)?;
        }
    }
    out.flush()?;
    Ok(path)
}

pub fn write_core_points(dir: &Path, points: &CoreSamplePoints) -> Result<PathBuf> {
    let path = dir.join(CORE_POINTS_FILE);
    let mut out = create(&path)?;
    writeln!(out, "genomes\tcommon_genes")?;
    for p in &points.points {
        writeln!(out, "{}\t{}", p.genomes, p.common_genes)?;
    }
    out.flush()?;
    Ok(path)
}

/// Fit table: `pan` rows carry their 1-based iteration, `pan_mean` and
/// `core` rows leave it empty.
pub fn write_fits(
    dir: &Path,
    pan: &[IterationFit],
    mean: &FitParams,
    core: &FitParams,
) -> Result<PathBuf> {
    let path = dir.join(FIT_PARAMETERS_FILE);
    let mut out = create(&path)?;
    writeln!(out, "curve\titeration\tk\tgamma")?;
    for f in pan {
        writeln!(
            out,
            "pan\t{}\t{}\t{}",
            f.iteration + 1,
            f.params.k,
            f.params.alpha
        )?;
    }
    writeln!(out, "pan_mean\t\t{}\t{}", mean.k, mean.alpha)?;
    writeln!(out, "core\t\t{}\t{}", core.k, core.alpha)?;
    out.flush()?;
    Ok(path)
}

/// Both fitted curves at every genome count, ready for plotting
pub fn write_fitted_curves(
    dir: &Path,
    n_genomes: usize,
    pan: &FitParams,
    core: &FitParams,
) -> Result<PathBuf> {
    let path = dir.join(FITTED_CURVES_FILE);
    let mut out = create(&path)?;
    writeln!(out, "genomes\tpan_fit\tcore_fit")?;
    for n in 1..=n_genomes {
        let x = n as f64;
        writeln!(out, "{}\t{}\t{}", n, pan.predict(x), core.predict(x))?;
    }
    out.flush()?;
    Ok(path)
}

/// Write every report file for `report` into `dir`, creating it if needed.
///
/// Point dumps are only written when `write_points` is set. Returns the
/// paths written, statistics first.
pub fn write_report(dir: &Path, report: &AnalysisReport, write_points: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mean = report.pan.aggregate.mean_fit();
    let mut written = vec![
        write_statistics(dir, &report.pan.aggregate)?,
        write_fits(dir, &report.pan.fits, &mean, &report.core.fit)?,
        write_fitted_curves(dir, report.n_genomes, &mean, &report.core.fit)?,
    ];
    if write_points {
        written.push(write_pan_points(dir, &report.pan.curves, &report.genome_names)?);
        written.push(write_core_points(dir, &report.core.points)?);
    }

    info!(dir = %dir.display(), files = written.len(), "report written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PresenceMatrix;
    use crate::model::accumulation::accumulate;
    use crate::model::classify::aggregate;
    use crate::model::core_genome::CoreSamplePoints;
    use tempfile::tempdir;

    #[test]
    fn test_statistics_format() {
        let dir = tempdir().unwrap();
        let agg = aggregate(&[FitParams::new(10.0, 0.5), FitParams::new(20.0, 0.25)]).unwrap();
        let path = write_statistics(dir.path(), &agg).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "k = 15\ngamma = 0.375\nPan-genome is open\n");
    }

    #[test]
    fn test_closed_statistics() {
        let dir = tempdir().unwrap();
        let agg = aggregate(&[FitParams::new(8.0, -0.5)]).unwrap();
        write_statistics(dir.path(), &agg).unwrap();

        let text = fs::read_to_string(dir.path().join(STATISTICS_FILE)).unwrap();
        assert_eq!(text.lines().last(), Some("Pan-genome is closed"));
    }

    #[test]
    fn test_pan_points_rows() {
        let dir = tempdir().unwrap();
        let m = PresenceMatrix::from_rows(&[
            vec![true, true, false],
            vec![true, false, false],
            vec![false, false, true],
        ])
        .unwrap();
        let curves = vec![accumulate(&m, &[0, 1, 2]), accumulate(&m, &[2, 1, 0])];
        let names: Vec<String> = ["ecoli_a", "ecoli_b", "ecoli_c"].map(String::from).to_vec();
        write_pan_points(dir.path(), &curves, &names).unwrap();

        let text = fs::read_to_string(dir.path().join(PAN_POINTS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "iteration\tgenomes\tgenes\tgenome");
        assert_eq!(
            &lines[1..4],
            &["1\t1\t2\tecoli_a", "1\t2\t2\tecoli_b", "1\t3\t3\tecoli_c"]
        );
        assert_eq!(lines[4], "2\t1\t1\tecoli_c");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_core_points_rows() {
        let dir = tempdir().unwrap();
        let points = CoreSamplePoints::from_samples(vec![(2, vec![1.5]), (1, vec![2.0, 3.0])]);
        write_core_points(dir.path(), &points).unwrap();

        let text = fs::read_to_string(dir.path().join(CORE_POINTS_FILE)).unwrap();
        assert_eq!(text, "genomes\tcommon_genes\n1\t2\n1\t3\n2\t1.5\n");
    }

    #[test]
    fn test_fit_table_and_curves() {
        let dir = tempdir().unwrap();
        let pan = vec![
            IterationFit {
                iteration: 0,
                params: FitParams::new(4.0, 0.5),
            },
            IterationFit {
                iteration: 2,
                params: FitParams::new(6.0, 0.5),
            },
        ];
        let mean = FitParams::new(5.0, 0.5);
        let core = FitParams::new(9.0, -1.0);
        write_fits(dir.path(), &pan, &mean, &core).unwrap();
        write_fitted_curves(dir.path(), 4, &mean, &core).unwrap();

        let fits = fs::read_to_string(dir.path().join(FIT_PARAMETERS_FILE)).unwrap();
        let rows: Vec<&str> = fits.lines().collect();
        assert_eq!(rows[1], "pan\t1\t4\t0.5");
        assert_eq!(rows[2], "pan\t3\t6\t0.5");
        assert_eq!(rows[3], "pan_mean\t\t5\t0.5");
        assert_eq!(rows[4], "core\t\t9\t-1");

        let curves = fs::read_to_string(dir.path().join(FITTED_CURVES_FILE)).unwrap();
        let rows: Vec<&str> = curves.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1], "1\t5\t9");
        assert_eq!(rows[4], "4\t10\t2.25");
    }
}
