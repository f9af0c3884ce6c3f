//! End-to-end runs: presence table on disk to report files on disk.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;

use pangrowth::io::report::{
    CORE_POINTS_FILE, FITTED_CURVES_FILE, FIT_PARAMETERS_FILE, PAN_POINTS_FILE, STATISTICS_FILE,
};
use pangrowth::model::fit::FitOptions;
use pangrowth::{
    read_rtab, write_report, AnalysisOptions, AnalysisPipeline, FitFailurePolicy, PangrowthError,
    PanGenomeStatus,
};

/// Ten genomes sharing 20 core genes, each with 4 genes of its own
fn open_table() -> String {
    let n_genomes = 10;
    let mut text = String::from("Gene");
    for g in 0..n_genomes {
        text.push_str(&format!("\tgenome_{}", g));
    }
    text.push('\n');
    for gene in 0..(20 + 4 * n_genomes) {
        text.push_str(&format!("gene_{}", gene));
        for g in 0..n_genomes {
            let present = gene < 20 || (gene - 20) / 4 == g;
            text.push_str(if present { "\t1" } else { "\t0" });
        }
        text.push('\n');
    }
    text
}

/// Eight identical genomes: the curve is flat
fn closed_table() -> String {
    let mut text = String::from("Gene");
    for g in 0..8 {
        text.push_str(&format!("\tg{}", g));
    }
    text.push('\n');
    for gene in 0..12 {
        text.push_str(&format!("gene_{}", gene));
        text.push_str(&"\t1".repeat(8));
        text.push('\n');
    }
    text
}

fn write_table(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_open_pangenome_end_to_end() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "open.Rtab", &open_table());
    let out = dir.path().join("results");

    let matrix = read_rtab(&input).unwrap();
    assert_eq!(matrix.n_genomes(), 10);
    assert_eq!(matrix.n_genes(), 60);

    let report = AnalysisPipeline::new(AnalysisOptions::new(10, 42))
        .run(&matrix)
        .unwrap();
    assert_eq!(report.status(), PanGenomeStatus::Open);

    let written = write_report(&out, &report, true).unwrap();
    assert_eq!(written.len(), 5);
    for name in [
        STATISTICS_FILE,
        FIT_PARAMETERS_FILE,
        FITTED_CURVES_FILE,
        PAN_POINTS_FILE,
        CORE_POINTS_FILE,
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    let stats = fs::read_to_string(out.join(STATISTICS_FILE)).unwrap();
    let lines: Vec<&str> = stats.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("k = "));
    assert!(lines[1].starts_with("gamma = "));
    assert_eq!(lines[2], "Pan-genome is open");

    let gamma: f64 = lines[1].trim_start_matches("gamma = ").parse().unwrap();
    assert!(gamma > 0.0);

    // 10 iterations x 10 genomes, plus header
    let pan_points = fs::read_to_string(out.join(PAN_POINTS_FILE)).unwrap();
    assert_eq!(pan_points.lines().count(), 101);

    // Each iteration adds every genome exactly once, by name
    let mut first_iteration: Vec<&str> = pan_points
        .lines()
        .skip(1)
        .take(10)
        .map(|row| row.rsplit('\t').next().unwrap())
        .collect();
    first_iteration.sort_unstable();
    let mut expected = matrix.genome_names().to_vec();
    expected.sort_unstable();
    assert_eq!(first_iteration, expected);
}

#[test]
fn test_identical_genomes_fit_flat_curve() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "closed.Rtab", &closed_table());
    let matrix = read_rtab(&input).unwrap();

    let report = AnalysisPipeline::new(AnalysisOptions::new(5, 3))
        .run(&matrix)
        .unwrap();
    assert!(report.pan.aggregate.avg_alpha.abs() < 1e-4);
    assert!((report.pan.aggregate.avg_k - 12.0).abs() < 1e-3);
    for curve in &report.pan.curves {
        assert!(curve.points.iter().all(|p| p.genes == 12));
    }
}

#[test]
fn test_gzipped_input_matches_plain() {
    let dir = tempdir().unwrap();
    let text = open_table();
    let plain = write_table(dir.path(), "open.Rtab", &text);

    let gz_path = dir.path().join("open.Rtab.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let a = read_rtab(&plain).unwrap();
    let b = read_rtab(&gz_path).unwrap();
    assert_eq!(a.genome_names(), b.genome_names());
    assert_eq!(a.n_genes(), b.n_genes());

    let ra = AnalysisPipeline::new(AnalysisOptions::new(4, 8)).run(&a).unwrap();
    let rb = AnalysisPipeline::new(AnalysisOptions::new(4, 8)).run(&b).unwrap();
    assert_eq!(ra.pan.aggregate, rb.pan.aggregate);
}

#[test]
fn test_same_seed_same_report_files() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "open.Rtab", &open_table());
    let matrix = read_rtab(&input).unwrap();

    let mut outputs = Vec::new();
    for run in 0..2 {
        let out = dir.path().join(format!("run{}", run));
        let report = AnalysisPipeline::new(AnalysisOptions::new(6, 1234))
            .run(&matrix)
            .unwrap();
        write_report(&out, &report, true).unwrap();
        outputs.push(out);
    }

    for name in [STATISTICS_FILE, FIT_PARAMETERS_FILE, PAN_POINTS_FILE, CORE_POINTS_FILE] {
        let a = fs::read_to_string(outputs[0].join(name)).unwrap();
        let b = fs::read_to_string(outputs[1].join(name)).unwrap();
        assert_eq!(a, b, "{} differs between runs", name);
    }
}

#[test]
fn test_points_only_written_on_request() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "open.Rtab", &open_table());
    let out = dir.path().join("nested").join("results");

    let matrix = read_rtab(&input).unwrap();
    let report = AnalysisPipeline::new(AnalysisOptions::new(3, 1))
        .run(&matrix)
        .unwrap();
    let written = write_report(&out, &report, false).unwrap();

    assert_eq!(written.len(), 3);
    assert!(out.join(STATISTICS_FILE).exists());
    assert!(!out.join(PAN_POINTS_FILE).exists());
}

#[test]
fn test_skip_policy_reports_degenerate_when_nothing_fits() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "open.Rtab", &open_table());
    let matrix = read_rtab(&input).unwrap();

    let mut options = AnalysisOptions::new(4, 9);
    options.on_fit_failure = FitFailurePolicy::Skip;
    let err = AnalysisPipeline::new(options)
        .with_fit_options(FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        })
        .run(&matrix)
        .unwrap_err();
    assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
}

#[test]
fn test_single_genome_table_is_degenerate() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "one.Rtab", "Gene\tonly\na\t1\nb\t0\n");
    let matrix = read_rtab(&input).unwrap();

    let err = AnalysisPipeline::new(AnalysisOptions::new(3, 0))
        .run(&matrix)
        .unwrap_err();
    assert!(matches!(err, PangrowthError::DegenerateInput { .. }));
}

#[test]
fn test_malformed_table_reports_line() {
    let dir = tempdir().unwrap();
    let input = write_table(dir.path(), "bad.Rtab", "Gene\ta\tb\nx\t1\t0\ny\t1\t2\n");

    match read_rtab(&input) {
        Err(PangrowthError::InputShape { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected InputShape error, got {:?}", other.map(|m| m.n_genes())),
    }
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let err = read_rtab(&dir.path().join("absent.Rtab")).unwrap_err();
    assert!(matches!(err, PangrowthError::FileNotFound { .. }));
}
