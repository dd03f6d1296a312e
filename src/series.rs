//! Threshold-aligned series: "days since the count first exceeded N".

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::Dataset;

/// Counts of one country re-indexed from the day its cumulative count first
/// went above the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSeries {
    pub country: String,
    pub threshold: u64,
    /// Calendar date of day 0, `None` when the series is empty.
    pub start: Option<NaiveDate>,
    pub dates: Vec<NaiveDate>,
    pub counts: Vec<u64>,
}

/// One exported sample of an [`AlignedSeries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedPoint<'a> {
    pub country: &'a str,
    pub day: usize,
    pub date: NaiveDate,
    pub count: u64,
}

impl AlignedSeries {
    /// `(day, count)` pairs, day 0 first.
    pub fn points(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts.iter().copied().enumerate()
    }

    /// Samples with their calendar date, for export.
    pub fn rows(&self) -> impl Iterator<Item = AlignedPoint<'_>> + '_ {
        self.dates
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(day, (date, count))| AlignedPoint {
                country: &self.country,
                day,
                date: *date,
                count: *count,
            })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// No data for this country, or it never crossed the threshold.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> Option<u64> {
        self.counts.iter().copied().max()
    }
}

/// Extracts the samples of `country` strictly above `threshold`, in
/// chronological order, indexed from 0.
///
/// Unknown countries give an empty series rather than an error.
pub fn align(dataset: &Dataset, country: &str, threshold: u64) -> AlignedSeries {
    let (dates, counts): (Vec<NaiveDate>, Vec<u64>) = dataset
        .get(country)
        .into_iter()
        .flat_map(|series| series.iter())
        .filter(|&(_, &count)| count > threshold)
        .map(|(&date, &count)| (date, count))
        .unzip();

    AlignedSeries {
        country: country.to_string(),
        threshold,
        start: dates.first().copied(),
        dates,
        counts,
    }
}

/// Aligns every requested country, dropping the empty ones.
pub fn align_all<'a, I>(dataset: &Dataset, countries: I, threshold: u64) -> Vec<AlignedSeries>
where
    I: IntoIterator<Item = &'a str>,
{
    countries
        .into_iter()
        .map(|c| align(dataset, c, threshold))
        .filter(|s| {
            if s.is_empty() {
                tracing::debug!(country = %s.country, threshold, "No samples above threshold, skipping");
            }
            !s.is_empty()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dataset(rows: &[(&str, &str, u64)]) -> Dataset {
        rows.iter()
            .map(|(c, d, n)| (c.to_string(), day(d), *n))
            .collect()
    }

    #[test]
    fn test_align_keeps_samples_above_threshold_in_order() {
        let ds = dataset(&[
            ("X", "2020-01-01", 50),
            ("X", "2020-01-02", 150),
            ("X", "2020-01-03", 300),
        ]);

        let s = align(&ds, "X", 100);

        assert_eq!(s.points().collect::<Vec<_>>(), vec![(0, 150), (1, 300)]);
        assert_eq!(s.start, Some(day("2020-01-02")));
    }

    #[test]
    fn test_align_ignores_insertion_order() {
        let ds = dataset(&[
            ("X", "2020-01-03", 300),
            ("X", "2020-01-02", 150),
            ("X", "2020-01-01", 50),
        ]);

        assert_eq!(align(&ds, "X", 100).counts, vec![150, 300]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let ds = dataset(&[("X", "2020-01-01", 100), ("X", "2020-01-02", 101)]);
        assert_eq!(align(&ds, "X", 100).counts, vec![101]);
    }

    #[test]
    fn test_missing_country_is_empty() {
        let ds = dataset(&[("X", "2020-01-01", 500)]);

        let s = align(&ds, "Atlantis", 1);

        assert!(s.is_empty());
        assert_eq!(s.start, None);
        assert_eq!(s.max_count(), None);
    }

    #[test]
    fn test_never_crossing_is_empty() {
        let ds = dataset(&[("X", "2020-01-01", 5), ("X", "2020-01-02", 9)]);
        assert!(align(&ds, "X", 10).is_empty());
    }

    #[test]
    fn test_rows_carry_calendar_dates() {
        let ds = dataset(&[("Italy", "2020-02-22", 62), ("Italy", "2020-02-23", 155)]);

        let s = align(&ds, "Italy", 100);
        let rows: Vec<_> = s.rows().collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Italy");
        assert_eq!(rows[0].day, 0);
        assert_eq!(rows[0].date, day("2020-02-23"));
        assert_eq!(rows[0].count, 155);
    }

    #[test]
    fn test_align_all_skips_empty() {
        let ds = dataset(&[("A", "2020-01-01", 500), ("B", "2020-01-01", 5)]);

        let all = align_all(&ds, ["A", "B", "C"], 100);

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].country, "A");
    }
}
