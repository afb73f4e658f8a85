//! JSON line-delimited audit log of scoring runs.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use backdrop_core::{EvaluationResult, SCORING_MODEL_VERSION};
use serde::Serialize;

const AUDIT_LOG_PATH: &str = "logs/scoring.jsonl";

#[derive(Debug, Serialize)]
pub struct DesignLogEntry<'a> {
    pub design: &'a str,
    pub model_version: &'static str,
    pub timestamp_ms: u128,
    pub candidates: usize,
    pub promoted: usize,
    pub spearman_rho: f64,
    pub results: &'a [EvaluationResult],
}

/// Append one design's full scoring output to the audit log.
///
/// Entries are self-contained JSON objects, one per line, so the log can be
/// tailed or replayed without a parser state machine.
pub fn log_design_run(
    design: &str,
    results: &[EvaluationResult],
    promoted: usize,
    spearman_rho: f64,
) -> io::Result<()> {
    let entry = DesignLogEntry {
        design,
        model_version: SCORING_MODEL_VERSION,
        timestamp_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
        candidates: results.len(),
        promoted,
        spearman_rho,
        results,
    };

    let path = Path::new(AUDIT_LOG_PATH);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    let line = serde_json::to_string(&entry)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    writeln!(writer, "{}", line)?;
    writer.flush()
}
