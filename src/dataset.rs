//! In-memory cumulative time series, one per country.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Date order of the rows as they appeared in the source file.
///
/// Storage is always ascending; this only records what the feed delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// Fewer than two dated rows for every country.
    #[default]
    Unknown,
    Ascending,
    Descending,
    Mixed,
}

impl DateOrder {
    /// Folds the direction of one step (`prev` → `next`) into the running order.
    pub(crate) fn observe(self, prev: NaiveDate, next: NaiveDate) -> DateOrder {
        let step = match prev.cmp(&next) {
            std::cmp::Ordering::Less => DateOrder::Ascending,
            std::cmp::Ordering::Greater => DateOrder::Descending,
            std::cmp::Ordering::Equal => return self,
        };
        match self {
            DateOrder::Unknown => step,
            current if current == step => current,
            _ => DateOrder::Mixed,
        }
    }
}

/// Cumulative counts for one country, keyed by calendar date.
pub type CountrySeries = BTreeMap<NaiveDate, u64>;

/// Turns a country name into its lookup key by dropping all whitespace.
///
/// `"Korea, South"` becomes `"Korea,South"`.
pub fn normalize_key(country: &str) -> String {
    country.split_whitespace().collect()
}

/// Aggregated dataset built from one download.
///
/// Countries iterate in key order and each series in ascending date order,
/// so two builds from the same file compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    countries: BTreeMap<String, CountrySeries>,
    feed_order: DateOrder,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: String, date: NaiveDate) -> &mut u64 {
        self.countries.entry(key).or_default().entry(date).or_insert(0)
    }

    /// Adds `count` to the value stored for (`key`, `date`) and returns the
    /// new total.
    ///
    /// # Errors
    ///
    /// Fails without changing the stored value if the sum does not fit in a
    /// `u64`.
    pub(crate) fn add(&mut self, key: String, date: NaiveDate, count: u64) -> Result<u64> {
        let total = self.slot(key, date);
        let Some(sum) = total.checked_add(count) else {
            bail!("count overflow on {date}: {} + {count} does not fit in u64", *total);
        };
        *total = sum;
        Ok(sum)
    }

    pub(crate) fn set_feed_order(&mut self, order: DateOrder) {
        self.feed_order = order;
    }

    /// Row order observed in the source file.
    pub fn feed_order(&self) -> DateOrder {
        self.feed_order
    }

    pub fn get(&self, key: &str) -> Option<&CountrySeries> {
        self.countries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.countries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CountrySeries> {
        self.countries.iter()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Collects (country, date, count) triples, normalizing keys. Sums that would
/// overflow saturate at `u64::MAX`.
impl FromIterator<(String, NaiveDate, u64)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, NaiveDate, u64)>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for (country, date, count) in iter {
            let total = dataset.slot(normalize_key(&country), date);
            *total = total.saturating_add(count);
        }
        dataset
    }
}
