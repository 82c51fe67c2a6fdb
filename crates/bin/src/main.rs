//! RPS CLI binary.
//!
//! Computes the daily RPS store from a quote cache and queries it.

mod integration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::paths;
use rps::{
    Aggregation, DEFAULT_PERIODS, DateTag, RpsConfig, RpsReader, calculate_if_absent_with_progress,
    instrument_profile,
};
use rps_output::{
    ExportFormat, Exporter, PanelExport, ProfileReport, RankingExport, SelectionExport,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Daily relative price strength ranking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the daily RPS store
    Compute {
        /// First date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,

        /// Last date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,

        /// Lookback periods in trading bars
        #[arg(long, value_delimiter = ',')]
        periods: Option<Vec<usize>>,

        /// Output store path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Quote cache path
        #[arg(long)]
        source: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe tag (ALL or a market prefix such as SH)
        #[arg(long)]
        universe: Option<String>,

        /// Benchmark code defining the trading calendar
        #[arg(long)]
        benchmark: Option<String>,

        /// Recompute even if the output store exists
        #[arg(long)]
        force: bool,
    },

    /// Show the top instruments by composite RPS
    Top {
        /// Reference date (YYYYMMDD)
        #[arg(long)]
        date: DateTag,

        /// Periods to combine (default: 10,20,50,120,250)
        #[arg(long, value_delimiter = ',')]
        periods: Option<Vec<usize>>,

        /// Number of instruments
        #[arg(long, default_value = "5")]
        top: usize,

        /// Plain sum instead of 1/period weighting
        #[arg(long)]
        unweighted: bool,

        /// Output format (text, markdown, json or csv)
        #[arg(long, default_value = "text")]
        format: String,

        /// Store path
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show one instrument's RPS in every period
    Show {
        /// Reference date (YYYYMMDD)
        #[arg(long)]
        date: DateTag,

        /// Instrument code
        #[arg(long)]
        code: String,

        /// Periods to show (default: every period stored on the date)
        #[arg(long, value_delimiter = ',')]
        periods: Option<Vec<usize>>,

        /// Store path
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Date x code history of one period
    History {
        /// Lookback period
        #[arg(long)]
        period: usize,

        /// Write to this file instead of printing a preview
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Store path
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Export the rankings of one date
    Export {
        /// Reference date (YYYYMMDD)
        #[arg(long)]
        date: DateTag,

        /// Periods to export (default: every period stored on the date)
        #[arg(long, value_delimiter = ',')]
        periods: Option<Vec<usize>>,

        /// Output file
        #[arg(long)]
        output: PathBuf,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Store path
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Load daily bars from a CSV file into the quote cache
    Import {
        /// CSV file with symbol,date,close columns
        #[arg(long)]
        csv: PathBuf,

        /// Quote cache path
        #[arg(long)]
        source: Option<PathBuf>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::Compute {
            start,
            end,
            periods,
            output,
            source,
            config,
            universe,
            benchmark,
            force,
        } => {
            let mut config = match config {
                Some(path) => RpsConfig::from_json_file(path)?,
                None => RpsConfig::default(),
            };
            if let Some(periods) = periods {
                config.periods = periods;
            }
            if let Some(universe) = universe {
                config.universe = universe;
            }
            if let Some(benchmark) = benchmark {
                config.benchmark = benchmark;
            }
            let output = paths::or_default(output, paths::default_store_path);
            let source = paths::or_default(source, paths::default_quotes_path);
            compute(&config, &source, &output, start, end, force)?;
        }
        Commands::Top {
            date,
            periods,
            top,
            unweighted,
            format,
            store,
        } => {
            let aggregation = if unweighted {
                Aggregation::Sum
            } else {
                Aggregation::InversePeriod
            };
            let periods = periods.unwrap_or_else(|| DEFAULT_PERIODS.to_vec());
            let store = paths::or_default(store, paths::default_store_path);
            show_top(&store, date, &periods, top, aggregation, &format)?;
        }
        Commands::Show {
            date,
            code,
            periods,
            store,
        } => {
            let reader = RpsReader::open(paths::or_default(store, paths::default_store_path))?;
            let periods = match periods {
                Some(p) => p,
                None => reader.periods(date)?,
            };
            let scores = instrument_profile(&reader, date, &code, &periods)?;
            let report = ProfileReport {
                code,
                date: date.date(),
                scores,
            };
            print!("{}", report);
        }
        Commands::History {
            period,
            output,
            format,
            store,
        } => {
            let reader = RpsReader::open(paths::or_default(store, paths::default_store_path))?;
            let panel = rps::period_history(&reader, period)?;
            println!(
                "RPS{}: {} dates x {} instruments",
                period,
                panel.height(),
                panel.width().saturating_sub(2)
            );
            match output {
                Some(path) => {
                    PanelExport::new(&panel).export_to_file(&path, format)?;
                    println!("Wrote {}", path.display());
                }
                None => print!(
                    "{}",
                    PanelExport::new(&panel.head(Some(10))).export_to_string(ExportFormat::Csv)?
                ),
            }
        }
        Commands::Export {
            date,
            periods,
            output,
            format,
            store,
        } => {
            let reader = RpsReader::open(paths::or_default(store, paths::default_store_path))?;
            let periods = match periods {
                Some(p) => p,
                None => reader.periods(date)?,
            };
            let mut rankings = Vec::with_capacity(periods.len());
            for period in periods {
                let table = reader.read(date, period)?;
                rankings.push(RankingExport::from_table(date.date(), period, &table));
            }
            rankings.export_to_file(&output, format)?;
            let rows: usize = rankings.iter().map(|r| r.rows.len()).sum();
            println!("Wrote {} rows to {}", rows, output.display());
        }
        Commands::Import { csv, source } => {
            let source = paths::or_default(source, paths::default_quotes_path);
            let cache = paths::open_quotes(&source)?;
            let written = rps_data::cache::import_csv(&cache, &csv)?;
            let stats = cache.get_stats()?;
            println!("Imported {} rows into {}", written, source.display());
            println!(
                "  Cache: {} quotes, {} symbols",
                stats.total_quotes, stats.unique_symbols
            );
            if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
                println!("  Range: {} to {}", first, last);
            }
        }
    }

    Ok(())
}

fn progress_style() -> Result<ProgressStyle, indicatif::style::TemplateError> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("█▓░"))
}

fn compute(
    config: &RpsConfig,
    source: &std::path::Path,
    output: &std::path::Path,
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache = paths::open_quotes_read_only(source)?;

    println!("Computing RPS from {} to {}", start, end);
    println!("  Periods: {:?}", config.periods);
    println!("  Universe: {} (benchmark {})", config.universe, config.benchmark);
    println!("  Output: {}", output.display());

    let pb = ProgressBar::new(0);
    pb.set_style(progress_style()?);
    pb.enable_steady_tick(StdDuration::from_millis(100));

    let summary = calculate_if_absent_with_progress(&cache, config, output, start, end, force, |p| {
        pb.set_length(p.total as u64);
        pb.set_position(p.index as u64 + 1);
        pb.set_message(p.date.to_string());
    });
    pb.finish_and_clear();

    let Some(summary) = summary? else {
        println!("Store exists; use --force to recompute.");
        return Ok(());
    };

    println!(
        "Done: {} dates, {} sub-tables written",
        summary.dates, summary.units_written
    );
    if !summary.skipped_dates.is_empty() {
        println!("  Skipped dates: {}", summary.skipped_dates.len());
    }
    if !summary.skipped_units.is_empty() {
        let mut by_period: BTreeMap<usize, usize> = BTreeMap::new();
        for skip in &summary.skipped_units {
            *by_period.entry(skip.period.unwrap_or_default()).or_default() += 1;
        }
        for (period, count) in by_period {
            println!("  Skipped RPS{} units: {}", period, count);
        }
    }
    if !summary.unlisted.is_empty() {
        println!("  Unknown listing date: {} instruments", summary.unlisted.len());
    }
    if !summary.exclusions.is_empty() {
        println!("  Exclusions:");
        for (reason, count) in &summary.exclusions {
            println!("    {:<22} {:>8}", reason, count);
        }
    }

    Ok(())
}

fn show_top(
    store: &std::path::Path,
    date: DateTag,
    periods: &[usize],
    top: usize,
    aggregation: Aggregation,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = RpsReader::open(store)?;

    match format {
        "text" => print!("{}", rps::selection_report(&reader, date, periods, top, aggregation)?),
        "markdown" | "md" => print!(
            "{}",
            rps::selection_report(&reader, date, periods, top, aggregation)?.to_markdown()
        ),
        other => {
            let format: ExportFormat = other.parse()?;
            let scores = rps::top_ranked(&reader, date, periods, top, aggregation)?;
            let export = SelectionExport::from_composite(date.date(), periods, aggregation, &scores);
            println!("{}", export.export_to_string(format)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(parse_date("2024-07-01").unwrap(), expected);
        assert_eq!(parse_date("20240701").unwrap(), expected);
        assert!(parse_date("07/01/2024").is_err());
    }

    #[test]
    fn test_top_arguments() {
        let cli = Cli::try_parse_from([
            "rps", "top", "--date", "20240701", "--periods", "10,20,50", "--unweighted",
        ])
        .unwrap();
        match cli.command {
            Commands::Top {
                date,
                periods,
                top,
                unweighted,
                ..
            } => {
                assert_eq!(date.to_string(), "20240701");
                assert_eq!(periods, Some(vec![10, 20, 50]));
                assert_eq!(top, 5);
                assert!(unweighted);
            }
            _ => panic!("expected top"),
        }
    }

    #[test]
    fn test_top_defaults() {
        let cli = Cli::try_parse_from(["rps", "top", "--date", "20240701"]).unwrap();
        match cli.command {
            Commands::Top {
                periods,
                top,
                unweighted,
                format,
                ..
            } => {
                assert_eq!(periods, None);
                assert_eq!(periods.unwrap_or_else(|| DEFAULT_PERIODS.to_vec()), vec![10, 20, 50, 120, 250]);
                assert_eq!(top, 5);
                assert!(!unweighted);
                assert_eq!(format, "text");
            }
            _ => panic!("expected top"),
        }
    }

    #[test]
    fn test_bad_date_tag_rejected() {
        assert!(Cli::try_parse_from(["rps", "top", "--date", "2024-07-01"]).is_err());
    }
}
