//! CSV persistence for the flat observation table.
//!
//! Header: `appid,game_name,month,avg_players,peak_players`.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::RunReport;
use crate::record::Observation;
use csv::{Reader, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes the whole dataset to `path`, replacing any existing file.
pub fn write_dataset(path: impl AsRef<Path>, rows: &[Observation]) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = rows.len(), "Writing dataset");

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a flat observation table back from `path`.
///
/// A missing file is fatal; the caller surfaces the message and exits.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("input table not found: {}", path.display()))?;

    let mut reader = Reader::from_reader(file);
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: Observation =
            result.with_context(|| format!("malformed record in {}", path.display()))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Lists candidate input tables (`steam*.csv`) in `dir`, newest first.
pub fn list_candidate_tables(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.to_lowercase().starts_with("steam") && name.ends_with(".csv") {
            let modified = entry.metadata()?.modified()?;
            candidates.push((modified, path));
        }
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(candidates.into_iter().map(|(_, path)| path).collect())
}

/// Logs the run's failure report as pretty-printed JSON.
pub fn print_report(report: &RunReport) -> Result<()> {
    if report.is_empty() {
        info!("No failures recorded this run");
        return Ok(());
    }
    info!(
        failures = report.len(),
        "{}",
        serde_json::to_string_pretty(report)?
    );
    Ok(())
}
