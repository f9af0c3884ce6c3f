//! # Presence/Absence Table Reader
//!
//! Reads the tab-delimited gene presence/absence table (Roary/Panaroo
//! `.Rtab` layout) into a genome-major [`PresenceMatrix`].
//!
//! ```text
//! Gene    genomeA  genomeB  genomeC
//! dnaA    1        1        0
//! tetM    0        0        1
//! ```
//!
//! The first line is a header: column 0 is ignored, columns 1..=G name the
//! genomes. Every later line is one gene: its identifier then one `0`/`1`
//! flag per genome. Blank lines are skipped, and trailing whitespace on any
//! line (stray tabs, `\r\n` endings) is ignored.
//! Files ending in `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::{debug, info_span};

use crate::data::{PresenceMatrix, PresenceMatrixBuilder};
use crate::error::{PangrowthError, Result};

/// Open a presence/absence table, transparently gunzipping `.gz` files.
pub fn read_rtab(path: &Path) -> Result<PresenceMatrix> {
    info_span!("rtab_open", path = ?path).in_scope(|| {
        if !path.exists() {
            return Err(PangrowthError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;

        let is_gzipped = path.extension().map(|e| e == "gz").unwrap_or(false);
        let reader: Box<dyn BufRead> = if is_gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        parse_rtab(reader)
    })
}

/// Parse a presence/absence table from any buffered reader.
pub fn parse_rtab<R: BufRead>(reader: R) -> Result<PresenceMatrix> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(PangrowthError::input_shape(1, "missing header line")),
    };
    let genome_names: Vec<String> = header
        .trim_end()
        .split('\t')
        .skip(1)
        .map(str::to_string)
        .collect();
    if genome_names.is_empty() {
        return Err(PangrowthError::input_shape(1, "header names no genomes"));
    }

    let mut builder = PresenceMatrixBuilder::new(genome_names);
    let mut flags = Vec::with_capacity(builder.n_genomes());

    for (idx, line) in lines {
        let line_num = idx + 1;
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let gene_id = fields.next().unwrap_or_default();

        flags.clear();
        for field in fields {
            flags.push(parse_flag(field, line_num)?);
        }
        if flags.len() != builder.n_genomes() {
            return Err(PangrowthError::input_shape(
                line_num,
                format!(
                    "gene '{}' has {} presence flags, header names {} genomes",
                    gene_id,
                    flags.len(),
                    builder.n_genomes()
                ),
            ));
        }
        builder.push_gene(&flags)?;
    }

    let matrix = builder.build();
    if matrix.n_genes() == 0 {
        return Err(PangrowthError::input_shape(1, "table has no gene rows"));
    }
    debug!(
        n_genomes = matrix.n_genomes(),
        n_genes = matrix.n_genes(),
        "parsed presence table"
    );
    Ok(matrix)
}

fn parse_flag(field: &str, line_num: usize) -> Result<bool> {
    match field.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(PangrowthError::input_shape(
            line_num,
            format!("expected 0 or 1, found '{}'", other),
        )),
    }
}
