//! CLI entry point for covid_compare.
//!
//! Downloads the cumulative Covid-19 case or death series, aligns countries on
//! the day they first crossed a threshold, and charts them side by side.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use covid_compare::{
    dataset::Dataset,
    fetch::{BasicClient, load_source},
    output::{append_record, print_json, print_pretty, write_series_csv},
    parser::{CutoffRule, ParseOptions, load_dataset},
    plot::render_comparison,
    prompt::{BANNER, ask_comparison, ask_kind, parse_countries},
    series::align_all,
    source::ChartKind,
    stats::CountryStats,
};
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_compare")]
#[command(about = "Compare Covid-19 curves aligned on the day a threshold was crossed", long_about = None)]
struct Cli {
    /// Directory for the downloaded CSV and rendered charts
    #[arg(long, global = true, env = "COVID_CACHE_DIR", default_value = ".")]
    cache_dir: PathBuf,

    /// Drop US county rows with the month/day-only cutoff check instead of a
    /// calendar comparison
    #[arg(long, global = true, default_value_t = false)]
    legacy_cutoff: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct SourceArgs {
    /// Local file or URL to read instead of the upstream feed
    #[arg(long, value_name = "FILE_OR_URL")]
    source: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for chart type, threshold and countries (the default)
    Interactive {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Render one comparison chart without prompting
    Plot {
        /// Series to chart: cases or deaths
        #[arg(short, long)]
        kind: ChartKind,

        /// Day 0 is the first day with a count above this
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        threshold: u64,

        /// Country keys, whitespace removed (e.g. Korea,South)
        #[arg(required = true)]
        countries: Vec<String>,

        /// SVG file to write [default: <cache-dir>/<kind>_comparison.svg]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the aligned series to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Log per-country statistics as JSON
    Summary {
        #[arg(short, long)]
        kind: ChartKind,

        #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
        threshold: u64,

        /// Countries to summarize (all when omitted)
        countries: Vec<String>,

        /// CSV file to append records to
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the country keys present in the feed
    ListCountries {
        #[arg(short, long)]
        kind: ChartKind,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = init_logging();

    let cli = Cli::parse();
    let opts = ParseOptions {
        cutoff: if cli.legacy_cutoff {
            CutoffRule::LegacyMonthDay
        } else {
            CutoffRule::Calendar
        },
    };
    let cache_dir = cli.cache_dir;

    match cli.command.unwrap_or(Commands::Interactive {
        source: SourceArgs::default(),
    }) {
        Commands::Interactive { source } => {
            interactive(source.source.as_deref(), &cache_dir, &opts)?;
        }
        Commands::Plot {
            kind,
            threshold,
            countries,
            output,
            export,
            source,
        } => {
            let dataset = load(kind, source.source.as_deref(), &cache_dir, &opts)?;
            let countries = parse_countries(&countries.join(" "), &dataset)?;
            let chart = output.unwrap_or_else(|| chart_path(&cache_dir, kind));

            render_comparison(&dataset, &countries, threshold, kind.label(), &chart)?;

            if let Some(export) = export {
                let series = align_all(&dataset, countries.iter().map(String::as_str), threshold);
                write_series_csv(&export, &series)?;
            }
        }
        Commands::Summary {
            kind,
            threshold,
            countries,
            output,
            source,
        } => {
            let dataset = load(kind, source.source.as_deref(), &cache_dir, &opts)?;
            let countries = if countries.is_empty() {
                dataset.keys().map(str::to_string).collect()
            } else {
                parse_countries(&countries.join(" "), &dataset)?
            };

            for country in &countries {
                let Some(stats) = CountryStats::from_dataset(&dataset, country, threshold) else {
                    continue;
                };
                let stats = stats.with_kind(kind.label());
                print_pretty(&stats);
                print_json(&stats)?;
                if let Some(path) = &output {
                    append_record(path, &stats)?;
                }
            }
            info!(countries = countries.len(), "Summary complete");
        }
        Commands::ListCountries { kind, source } => {
            let dataset = load(kind, source.source.as_deref(), &cache_dir, &opts)?;
            for key in dataset.keys() {
                info!(country = key, "Country");
            }
            info!(
                total = dataset.len(),
                feed_order = ?dataset.feed_order(),
                "Country list"
            );
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file
fn init_logging() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_compare.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_compare.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn chart_path(cache_dir: &Path, kind: ChartKind) -> PathBuf {
    cache_dir.join(format!("{kind}_comparison.svg"))
}

/// Downloads (or reads) the feed for `kind` and parses it.
fn load(kind: ChartKind, source: Option<&str>, cache_dir: &Path, opts: &ParseOptions) -> Result<Dataset> {
    let client = BasicClient::new()?;
    let cache = cache_dir.join(kind.cache_file());
    let source = source.unwrap_or(kind.url());
    info!(%kind, cache = %cache.display(), "Loading feed");
    let path = load_source(&client, source, &cache)?;
    load_dataset(path, opts)
}

/// Prompt loop: one fetch, then as many comparisons as the operator wants.
/// Closing stdin ends the session.
fn interactive(source: Option<&str>, cache_dir: &Path, opts: &ParseOptions) -> Result<()> {
    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();

    writeln!(out, "{BANNER}")?;
    let kind = match ask_kind(&mut input, &mut out) {
        Ok(kind) => kind,
        Err(e) if is_eof(&e) => return Ok(()),
        Err(e) => return Err(e),
    };
    writeln!(out, "\n{}", kind.announcement())?;

    writeln!(out, "Querying internet for data ...")?;
    let dataset = load(kind, source, cache_dir, opts)?;
    writeln!(out, "Done.\n")?;

    let chart = chart_path(cache_dir, kind);
    loop {
        let round = match ask_comparison(&mut input, &mut out, &dataset) {
            Ok(round) => round,
            Err(e) if is_eof(&e) => {
                info!("Input closed, exiting");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        render_comparison(&dataset, &round.countries, round.threshold, kind.label(), &chart)?;
        writeln!(out, "Chart written to {}\n", chart.display())?;
    }
}

fn is_eof(e: &anyhow::Error) -> bool {
    e.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
}
