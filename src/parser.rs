//! CSV parser for the per-region time series feed.
//!
//! The feed is one row per (region, country, date) with the cumulative count
//! in the last column, preceded by a header row and an HXL tag row.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::dataset::{Dataset, DateOrder, normalize_key};

/// Physical lines skipped at the top of every file, blank ones included.
pub const HEADER_LINES: u64 = 2;

/// Country whose county-level rows are dropped after the cutoff.
pub const CORRECTION_COUNTRY: &str = "US";

/// (year, month, day) from which the upstream started publishing county rows
/// next to the state rows for [`CORRECTION_COUNTRY`].
pub const CORRECTION_CUTOFF: (i32, u32, u32) = (2020, 3, 10);

/// How the correction cutoff is compared against a row date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffRule {
    /// `date >= 2020-03-10`.
    #[default]
    Calendar,
    /// `month >= 3 && day >= 10`, ignoring the year. Misses e.g. April 5th;
    /// only useful to reproduce reference outputs.
    LegacyMonthDay,
}

impl CutoffRule {
    /// Returns `true` when `date` falls in the corrected range.
    pub fn applies(self, date: NaiveDate) -> bool {
        let (_, month, day) = CORRECTION_CUTOFF;
        match self {
            CutoffRule::Calendar => (date.year(), date.month(), date.day()) >= CORRECTION_CUTOFF,
            CutoffRule::LegacyMonthDay => date.month() >= month && date.day() >= day,
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub cutoff: CutoffRule,
}

/// The fields of one data row the aggregation cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub region: String,
    pub country: String,
    pub date: NaiveDate,
    pub count: u64,
}

impl Row {
    /// Extracts region, country, date and count from a raw record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has fewer than 4 fields, the date is not
    /// `YYYY-MM-DD`, or the count is neither empty nor a non-negative integer.
    pub fn from_record(record: &StringRecord) -> Result<Row> {
        let n = record.len();
        if n < 4 {
            bail!("expected at least 4 fields, found {n}");
        }
        let date_field = record[n - 2].trim();
        let count_field = record[n - 1].trim();

        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{date_field}'"))?;
        let count = if count_field.is_empty() {
            0
        } else {
            count_field
                .parse::<u64>()
                .with_context(|| format!("invalid count '{count_field}'"))?
        };

        Ok(Row {
            region: record[0].to_string(),
            country: record[1].to_string(),
            date,
            count,
        })
    }

    /// True for county-level rows of [`CORRECTION_COUNTRY`] on or after the
    /// cutoff. Those duplicate the state rows and must count as zero.
    pub fn is_superseded(&self, rule: CutoffRule) -> bool {
        self.country == CORRECTION_COUNTRY && rule.applies(self.date) && self.region.contains(',')
    }

    /// The count this row contributes to the aggregate.
    pub fn effective_count(&self, rule: CutoffRule) -> u64 {
        if self.is_superseded(rule) { 0 } else { self.count }
    }
}

/// Builds a [`Dataset`] from CSV text.
///
/// # Errors
///
/// Any unreadable record, malformed data row, or per-day total that does not
/// fit in a `u64` aborts the whole parse. The error names the line it came
/// from.
pub fn parse_dataset<R: Read>(rdr: R, opts: &ParseOptions) -> Result<Dataset> {
    // csv drops blank lines, so the header block is skipped by physical line
    let mut rdr = BufReader::new(rdr);
    let mut skipped = Vec::new();
    for _ in 0..HEADER_LINES {
        skipped.clear();
        if rdr.read_until(b'\n', &mut skipped).context("failed to read header")? == 0 {
            break;
        }
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);

    let mut dataset = Dataset::new();
    let mut order = DateOrder::Unknown;
    let mut prev: Option<(String, String, NaiveDate)> = None;
    let mut rows = 0usize;
    let mut superseded = 0usize;

    for result in reader.records() {
        let record = result.context("failed to read record")?;
        let line = record.position().map_or(0, |p| p.line()) + HEADER_LINES;
        let row = Row::from_record(&record).with_context(|| format!("malformed row at line {line}"))?;

        if let Some((region, country, date)) = &prev {
            if *region == row.region && *country == row.country {
                order = order.observe(*date, row.date);
            }
        }

        let count = row.effective_count(opts.cutoff);
        if count != row.count {
            superseded += 1;
        }
        dataset
            .add(normalize_key(&row.country), row.date, count)
            .with_context(|| format!("count overflow at line {line}"))?;
        rows += 1;

        prev = Some((row.region, row.country, row.date));
    }

    dataset.set_feed_order(order);
    debug!(rows, superseded, ?order, "Parsed feed rows");
    Ok(dataset)
}

/// Opens `path` and parses it with [`parse_dataset`].
#[tracing::instrument(skip(path, opts), fields(path = %path.as_ref().display()))]
pub fn load_dataset<P: AsRef<Path>>(path: P, opts: &ParseOptions) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let dataset = parse_dataset(file, opts)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    info!(
        countries = dataset.len(),
        feed_order = ?dataset.feed_order(),
        "Dataset loaded"
    );
    Ok(dataset)
}
