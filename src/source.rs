//! The two upstream time series the tool knows how to chart.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

const CASES_URL: &str = "http://data.humdata.org/hxlproxy/data/download/time_series-ncov-Confirmed.csv?dest=data_edit&filter01=explode&explode-header-att01=date&explode-value-att01=value&filter02=rename&rename-oldtag02=%23affected%2Bdate&rename-newtag02=%23date&rename-header02=Date&filter03=rename&rename-oldtag03=%23affected%2Bvalue&rename-newtag03=%23affected%2Binfected%2Bvalue%2Bnum&rename-header03=Value&filter04=clean&clean-date-tags04=%23date&filter05=sort&sort-tags05=%23date&sort-reverse05=on&filter06=sort&sort-tags06=%23country%2Bname%2C%23adm1%2Bname&tagger-match-all=on&tagger-default-tag=%23affected%2Blabel&tagger-01-header=province%2Fstate&tagger-01-tag=%23adm1%2Bname&tagger-02-header=country%2Fregion&tagger-02-tag=%23country%2Bname&tagger-03-header=lat&tagger-03-tag=%23geo%2Blat&tagger-04-header=long&tagger-04-tag=%23geo%2Blon&header-row=1&url=https%3A%2F%2Fraw.githubusercontent.com%2FCSSEGISandData%2FCOVID-19%2Fmaster%2Fcsse_covid_19_data%2Fcsse_covid_19_time_series%2Ftime_series_19-covid-Confirmed.csv";

const DEATHS_URL: &str = "http://data.humdata.org/hxlproxy/data/download/time_series-ncov-Deaths.csv?dest=data_edit&filter01=explode&explode-header-att01=date&explode-value-att01=value&filter02=rename&rename-oldtag02=%23affected%2Bdate&rename-newtag02=%23date&rename-header02=Date&filter03=rename&rename-oldtag03=%23affected%2Bvalue&rename-newtag03=%23affected%2Bkilled%2Bvalue%2Bnum&rename-header03=Value&filter04=clean&clean-date-tags04=%23date&filter05=sort&sort-tags05=%23date&sort-reverse05=on&filter06=sort&sort-tags06=%23country%2Bname%2C%23adm1%2Bname&tagger-match-all=on&tagger-default-tag=%23affected%2Blabel&tagger-01-header=province%2Fstate&tagger-01-tag=%23adm1%2Bname&tagger-02-header=country%2Fregion&tagger-02-tag=%23country%2Bname&tagger-03-header=lat&tagger-03-tag=%23geo%2Blat&tagger-04-header=long&tagger-04-tag=%23geo%2Blon&header-row=1&url=https%3A%2F%2Fraw.githubusercontent.com%2FCSSEGISandData%2FCOVID-19%2Fmaster%2Fcsse_covid_19_data%2Fcsse_covid_19_time_series%2Ftime_series_19-covid-Deaths.csv";

/// Which cumulative series to download and chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Confirmed cases.
    Cases,
    /// Deaths.
    Deaths,
}

impl ChartKind {
    /// The fixed upstream URL for this series.
    pub fn url(self) -> &'static str {
        match self {
            ChartKind::Cases => CASES_URL,
            ChartKind::Deaths => DEATHS_URL,
        }
    }

    /// File name the downloaded body is cached under.
    pub fn cache_file(self) -> &'static str {
        match self {
            ChartKind::Cases => "covid_cases.csv",
            ChartKind::Deaths => "covid_deaths.csv",
        }
    }

    /// Y-axis label.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Cases => "cases",
            ChartKind::Deaths => "deaths",
        }
    }

    /// Sentence used when the operator picks this kind.
    pub fn announcement(self) -> &'static str {
        match self {
            ChartKind::Cases => "Ok, graphing confirmed cases of Covid-19.",
            ChartKind::Deaths => "Ok, graphing deaths due to Covid-19.",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cases" => Ok(ChartKind::Cases),
            "deaths" => Ok(ChartKind::Deaths),
            other => bail!("unknown chart kind '{other}', expected 'cases' or 'deaths'"),
        }
    }
}
