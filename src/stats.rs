use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::dataset::{CountrySeries, Dataset};

#[derive(Debug, Default, Serialize)]
pub struct CountryStats {
    pub timestamp: DateTime<Utc>,
    pub country: String,
    pub kind: Option<String>,

    // reporting window
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub days_reported: usize,

    // counts
    pub latest_count: u64,
    pub peak_daily_increase: u64,
    pub peak_daily_increase_date: Option<NaiveDate>,

    // threshold alignment
    pub threshold: u64,
    pub threshold_date: Option<NaiveDate>,
    pub days_above_threshold: usize,
}

impl CountryStats {
    pub fn from_series(country: &str, series: &CountrySeries, threshold: u64) -> Self {
        let mut s = CountryStats {
            timestamp: Utc::now(),
            country: country.to_string(),
            threshold,
            days_reported: series.len(),
            ..Default::default()
        };

        s.first_date = series.keys().next().copied();

        if let Some((date, count)) = series.iter().next_back() {
            s.last_date = Some(*date);
            s.latest_count = *count;
        }

        let mut prev: Option<u64> = None;
        for (date, &count) in series {
            // cumulative series can be revised downwards; that is not an increase
            if let Some(p) = prev {
                let increase = count.saturating_sub(p);
                if increase > s.peak_daily_increase {
                    s.peak_daily_increase = increase;
                    s.peak_daily_increase_date = Some(*date);
                }
            }
            prev = Some(count);

            if count > threshold {
                s.days_above_threshold += 1;
                if s.threshold_date.is_none() {
                    s.threshold_date = Some(*date);
                }
            }
        }

        s
    }

    /// Stats for `country`, or `None` when the dataset has no such key.
    pub fn from_dataset(dataset: &Dataset, country: &str, threshold: u64) -> Option<Self> {
        dataset
            .get(country)
            .map(|series| Self::from_series(country, series, threshold))
    }

    /// Set the series kind (cases or deaths)
    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }
}
