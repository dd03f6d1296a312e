//! Output formatting and persistence for country statistics and aligned series.
//!
//! Supports pretty-printing, JSON serialization, CSV append and CSV export.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::series::AlignedSeries;
use crate::stats::CountryStats;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Logs country statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &CountryStats) {
    debug!("{:#?}", stats);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`CountryStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, stats: &CountryStats) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}

/// Writes aligned series as `country,day,date,count` rows, replacing `path`.
pub fn write_series_csv(path: &Path, series: &[AlignedSeries]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    let mut rows = 0usize;
    for s in series {
        for row in s.rows() {
            writer.serialize(row)?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), rows, "Exported aligned series");
    Ok(())
}
