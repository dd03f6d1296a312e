//! Validation of operator input and the re-prompt loop around it.
//!
//! The validators are plain functions so they can be tested without a
//! terminal. [`ask`] drives them over any reader/writer pair.

use std::fmt;
use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::dataset::Dataset;
use crate::source::ChartKind;

pub const KIND_QUESTION: &str =
    "Would you like to graph confirmed cases or deaths (enter 'cases' or 'deaths'): ";
pub const KIND_RETRY: &str = "Please enter either 'cases' or 'deaths': ";
pub const THRESHOLD_QUESTION: &str =
    "Enter a minimum incidence threshold for day 0 (some integer greater than zero): ";
pub const THRESHOLD_RETRY: &str = "Enter an integer greater than zero (like 150): ";
pub const COUNTRIES_QUESTION: &str =
    "Enter the countries you wish to compare from the list above, separated by spaces: ";

pub const BANNER: &str = r#"
 .d8888b.   .d88888b.  888     888 8888888 8888888b.        d888   .d8888b.
d88P  Y88b d88P" "Y88b 888     888   888   888  "Y88b      d8888  d88P  Y88b
888    888 888     888 888     888   888   888    888        888  888    888
888        888     888 Y88b   d88P   888   888    888        888  Y88b. d888
888        888     888  Y88b d88P    888   888    888        888   "Y888P888
888    888 888     888   Y88o88P     888   888    888 888888 888         888
Y88b  d88P Y88b. .d88P    Y888P      888   888  .d88P        888  Y88b  d88P
 "Y8888P"   "Y88888P"      Y8P     8888888 8888888P"       8888888 "Y8888P
"#;

/// Why a line of operator input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    UnknownKind(String),
    NotAnInteger(String),
    NotPositive(i64),
    NoCountries,
    UnknownCountries(Vec<String>),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::UnknownKind(s) => write!(f, "'{s}' is neither 'cases' nor 'deaths'."),
            InputError::NotAnInteger(s) => write!(f, "'{s}' is not an integer."),
            InputError::NotPositive(n) => write!(f, "{n} is not greater than zero."),
            InputError::NoCountries => f.write_str("Enter at least one country."),
            InputError::UnknownCountries(names) => {
                let lines: Vec<String> = names
                    .iter()
                    .map(|c| format!("Invalid country '{c}'."))
                    .collect();
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Accepts any answer mentioning `cases` or `deaths`, ignoring case.
/// `cases` wins when both appear.
pub fn parse_chart_kind(input: &str) -> Result<ChartKind, InputError> {
    let lowered = input.to_lowercase();
    if lowered.contains("cases") {
        Ok(ChartKind::Cases)
    } else if lowered.contains("deaths") {
        Ok(ChartKind::Deaths)
    } else {
        Err(InputError::UnknownKind(input.trim().to_string()))
    }
}

/// Parses a strictly positive integer threshold.
pub fn parse_threshold(input: &str) -> Result<u64, InputError> {
    let trimmed = input.trim();
    match trimmed.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(n) => Err(InputError::NotPositive(n as i64)),
        Err(_) => match trimmed.parse::<i64>() {
            Ok(n) => Err(InputError::NotPositive(n)),
            Err(_) => Err(InputError::NotAnInteger(trimmed.to_string())),
        },
    }
}

/// Splits on whitespace and checks every name is a dataset key.
pub fn parse_countries(input: &str, dataset: &Dataset) -> Result<Vec<String>, InputError> {
    let countries: Vec<String> = input.split_whitespace().map(str::to_string).collect();
    if countries.is_empty() {
        return Err(InputError::NoCountries);
    }
    let unknown: Vec<String> = countries
        .iter()
        .filter(|c| !dataset.contains(c))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(countries)
    } else {
        Err(InputError::UnknownCountries(unknown))
    }
}

/// Writes `question`, reads one line and validates it, repeating with
/// `retry` until `validate` accepts.
///
/// # Errors
///
/// I/O failures, and end of input before a valid answer.
pub fn ask<T, R, W, F>(
    input: &mut R,
    out: &mut W,
    question: &str,
    retry: &str,
    mut validate: F,
) -> Result<T>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<T, InputError>,
{
    let mut prompt = question;
    loop {
        write!(out, "{prompt}")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
        }

        match validate(line.trim_end_matches(['\r', '\n'])) {
            Ok(value) => return Ok(value),
            Err(e) => {
                writeln!(out, "{e}")?;
                prompt = retry;
            }
        }
    }
}

/// Formats names as a bracketed list of single-quoted strings, e.g.
/// `['Italy', 'US']`. A name containing `'` but no `"` is double-quoted
/// instead; otherwise `'` and `\` are backslash-escaped.
pub fn quoted_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            if name.contains('\'') && !name.contains('"') {
                format!("\"{}\"", name.replace('\\', "\\\\"))
            } else {
                format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// One round of the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub threshold: u64,
    pub countries: Vec<String>,
}

/// Asks for the chart kind.
pub fn ask_kind<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<ChartKind> {
    ask(input, out, KIND_QUESTION, KIND_RETRY, parse_chart_kind)
}

/// Asks for a threshold, lists the dataset keys, then asks for countries.
pub fn ask_comparison<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    dataset: &Dataset,
) -> Result<Comparison> {
    let threshold = ask(input, out, THRESHOLD_QUESTION, THRESHOLD_RETRY, parse_threshold)?;

    writeln!(out)?;
    writeln!(out, "{}", quoted_list(dataset.keys()))?;
    let countries = ask(input, out, COUNTRIES_QUESTION, COUNTRIES_QUESTION, |s| {
        parse_countries(s, dataset)
    })?;
    writeln!(out, "Comparing:  {}", quoted_list(&countries))?;

    Ok(Comparison {
        threshold,
        countries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn dataset() -> Dataset {
        let d = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        vec![
            ("Italy".to_string(), d, 1694),
            ("Korea, South".to_string(), d, 3736),
            ("US".to_string(), d, 74),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_parse_chart_kind() {
        assert_eq!(parse_chart_kind("cases"), Ok(ChartKind::Cases));
        assert_eq!(parse_chart_kind("DEATHS"), Ok(ChartKind::Deaths));
        assert_eq!(parse_chart_kind("graph the cases please"), Ok(ChartKind::Cases));
        assert_eq!(parse_chart_kind("deaths and cases"), Ok(ChartKind::Cases));
        assert_eq!(
            parse_chart_kind(" recovered "),
            Err(InputError::UnknownKind("recovered".into()))
        );
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("150"), Ok(150));
        assert_eq!(parse_threshold("  7 "), Ok(7));
        assert_eq!(parse_threshold("0"), Err(InputError::NotPositive(0)));
        assert_eq!(parse_threshold("-5"), Err(InputError::NotPositive(-5)));
        assert_eq!(parse_threshold("1.5"), Err(InputError::NotAnInteger("1.5".into())));
        assert_eq!(parse_threshold(""), Err(InputError::NotAnInteger("".into())));
    }

    #[test]
    fn test_parse_countries_valid() {
        let ds = dataset();
        assert_eq!(
            parse_countries("Italy  Korea,South", &ds),
            Ok(vec!["Italy".to_string(), "Korea,South".to_string()])
        );
    }

    #[test]
    fn test_parse_countries_reports_every_unknown() {
        let ds = dataset();
        let err = parse_countries("Italy France Atlantis", &ds).unwrap_err();

        assert_eq!(
            err,
            InputError::UnknownCountries(vec!["France".into(), "Atlantis".into()])
        );
        assert_eq!(
            err.to_string(),
            "Invalid country 'France'.\nInvalid country 'Atlantis'."
        );
    }

    #[test]
    fn test_parse_countries_empty() {
        assert_eq!(parse_countries("   ", &dataset()), Err(InputError::NoCountries));
    }

    #[test]
    fn test_ask_retries_until_valid() {
        let mut input = Cursor::new("abc\n0\n250\n");
        let mut out = Vec::new();

        let n = ask(&mut input, &mut out, "Q: ", "R: ", parse_threshold).unwrap();

        assert_eq!(n, 250);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Q: 'abc' is not an integer.\nR: "));
        assert_eq!(text.matches("R: ").count(), 2);
    }

    #[test]
    fn test_ask_fails_on_eof() {
        let mut input = Cursor::new("nope\n");
        let mut out = Vec::new();

        let err = ask(&mut input, &mut out, "Q: ", "R: ", parse_threshold).unwrap_err();

        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_ask_handles_crlf() {
        let mut input = Cursor::new("deaths\r\n");
        let mut out = Vec::new();

        assert_eq!(ask_kind(&mut input, &mut out).unwrap(), ChartKind::Deaths);
    }

    #[test]
    fn test_quoted_list() {
        assert_eq!(quoted_list(["Italy", "Korea,South"]), "['Italy', 'Korea,South']");
        assert_eq!(quoted_list(Vec::<String>::new()), "[]");
        assert_eq!(quoted_list(["Coted'Ivoire"]), r#"["Coted'Ivoire"]"#);
        assert_eq!(quoted_list([r#"a'b"c"#]), r#"['a\'b"c']"#);
    }

    #[test]
    fn test_ask_comparison_round() {
        let ds = dataset();
        let mut input = Cursor::new("x\n100\nItaly Spain\nItaly US\n");
        let mut out = Vec::new();

        let round = ask_comparison(&mut input, &mut out, &ds).unwrap();

        assert_eq!(
            round,
            Comparison {
                threshold: 100,
                countries: vec!["Italy".into(), "US".into()],
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n['Italy', 'Korea,South', 'US']\n"));
        assert!(text.contains("Invalid country 'Spain'."));
        assert!(text.contains("Comparing:  ['Italy', 'US']"));
    }
}
