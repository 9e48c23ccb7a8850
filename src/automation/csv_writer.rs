//! CSV writer for the attempt log.
//!
//! Writes one row per attempt in append-only mode for crash safety. The log
//! is diagnostic only and never read back.

use crate::automation::queue::AttemptRecord;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// CSV header row.
const CSV_HEADER: &str = "attempt,timestamp,decision,before_score,after_score,main,secondary,attack,all_stat_pct,cp_delta,source,raw_text";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Quotes a free-text field. Line breaks become " | " so each attempt stays
/// on one line.
fn quote_field(text: &str) -> String {
    let single_line = text.lines().collect::<Vec<_>>().join(" | ");
    format!("\"{}\"", single_line.replace('"', "\"\""))
}

/// Appends one attempt row to the CSV file.
///
/// Opens the file in append mode for each write, so completed attempts are
/// on disk even if the run crashes.
pub fn append_to_csv(path: &Path, record: &AttemptRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let after = &record.after;
    let line = format!(
        "{},{},{},{:.3},{:.3},{},{},{},{},{},{},{}",
        record.attempt,
        record.recorded_at.format("%Y-%m-%dT%H:%M:%S"),
        record.decision.kind(),
        record.before_score,
        after.score,
        after.main_stat,
        after.secondary_stat,
        after.primary_attack,
        after.all_stat_percent,
        after.cp_delta.map(|d| d.to_string()).unwrap_or_default(),
        after.source.as_str(),
        quote_field(&after.raw_text),
    );

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}
