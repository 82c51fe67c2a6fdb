//! Daily batch computation of the RPS store.
//!
//! A run walks every trading date of the benchmark calendar and every
//! configured period, ranks the eligible universe and writes one sub-table
//! per (date, period) unit. Every calendar date gets a group, even one whose
//! units are all skipped. Units and dates that fail a universe guard are
//! skipped and reported; instruments without usable data are left out of the
//! unit they fail in and tallied by reason.

use crate::config::RpsConfig;
use crate::error::Result;
use chrono::NaiveDate;
use rps_data::{Instrument, MarketDataSource, TradingCalendar};
use rps_engine::{DataUnavailable, EligibilityFilter, InsufficientUniverse, RankingEngine};
use rps_store::{DateTag, RpsWriter};
use std::collections::BTreeMap;
use std::path::Path;

/// Progress of a run after one trading date.
#[derive(Debug, Clone, Copy)]
pub struct DayProgress {
    /// Date just processed
    pub date: NaiveDate,
    /// Zero-based index of the date in the calendar
    pub index: usize,
    /// Number of dates in the calendar
    pub total: usize,
    /// Sub-tables written for this date
    pub written: usize,
}

/// What a run wrote and skipped.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Trading dates visited
    pub dates: usize,
    /// Sub-tables written
    pub units_written: usize,
    /// Dates skipped for lack of eligible instruments
    pub skipped_dates: Vec<InsufficientUniverse>,
    /// (date, period) units skipped for lack of valid returns
    pub skipped_units: Vec<InsufficientUniverse>,
    /// Instruments left out of the whole run for want of a listing date
    pub unlisted: Vec<DataUnavailable>,
    /// Per-unit exclusions counted by [`Unavailable::kind`](rps_engine::Unavailable::kind)
    pub exclusions: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    /// Whether anything was skipped.
    pub fn has_skips(&self) -> bool {
        !self.skipped_dates.is_empty() || !self.skipped_units.is_empty()
    }

    /// Total per-unit exclusions.
    pub fn excluded(&self) -> usize {
        self.exclusions.values().sum()
    }

    fn tally(&mut self, exclusions: Vec<DataUnavailable>) {
        for excl in exclusions {
            *self.exclusions.entry(excl.reason.kind()).or_default() += 1;
        }
    }
}

/// Drives a full run against one data source.
#[derive(Debug)]
pub struct BatchRunner<'a, S: ?Sized> {
    source: &'a S,
    config: &'a RpsConfig,
}

impl<'a, S: MarketDataSource + ?Sized> BatchRunner<'a, S> {
    /// Create a runner.
    pub const fn new(source: &'a S, config: &'a RpsConfig) -> Self {
        Self { source, config }
    }

    /// Compute every unit from `start` to `end` into a new store at `output`.
    pub fn run(&self, output: &Path, start: NaiveDate, end: NaiveDate) -> Result<RunSummary> {
        self.run_with_progress(output, start, end, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_day` after each trading date.
    pub fn run_with_progress<F>(
        &self,
        output: &Path,
        start: NaiveDate,
        end: NaiveDate,
        mut on_day: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&DayProgress),
    {
        let config = self.config;
        config.validate()?;

        let calendar = TradingCalendar::from_benchmark(self.source, &config.benchmark, start, end)?;
        let instruments: Vec<Instrument> = self
            .source
            .list_instruments(&config.universe)?
            .into_iter()
            .filter(|i| i.code != config.benchmark)
            .collect();
        tracing::info!(
            dates = calendar.len(),
            instruments = instruments.len(),
            periods = ?config.periods,
            "starting RPS run"
        );

        let mut summary = RunSummary::default();
        let (filter, unknown) =
            EligibilityFilter::discover(self.source, &instruments, config.seasoning_days, start);
        summary.unlisted = unknown;

        let writer = RpsWriter::create(output)?;
        let engine = RankingEngine::new(config.min_universe);
        let units = config.units();
        let total = calendar.len();

        for (index, date) in calendar.iter().enumerate() {
            summary.dates += 1;
            let mut written = 0;
            let tag = DateTag::new(date);
            writer.create_group(tag)?;
            let eligible = filter.eligible(&instruments, date);

            match engine.check_universe(date, eligible.len()) {
                Err(skip) => {
                    tracing::info!(%skip, "date skipped");
                    summary.skipped_dates.push(skip);
                }
                Ok(()) => {
                    for unit in &units {
                        let outcome = engine.rank(self.source, unit, date, &eligible);
                        summary.tally(outcome.exclusions);
                        match outcome.result {
                            Ok(table) => {
                                writer.write(tag, unit.period, &table)?;
                                written += 1;
                            }
                            Err(skip) => summary.skipped_units.push(skip),
                        }
                    }
                }
            }

            summary.units_written += written;
            on_day(&DayProgress {
                date,
                index,
                total,
                written,
            });
        }

        writer.close()?;
        tracing::info!(
            path = %output.display(),
            units = summary.units_written,
            skipped_dates = summary.skipped_dates.len(),
            skipped_units = summary.skipped_units.len(),
            unlisted = summary.unlisted.len(),
            exclusions = summary.excluded(),
            "RPS run complete"
        );
        Ok(summary)
    }
}

/// Compute the daily RPS store at `output`.
pub fn calculate_daily_rps<S: MarketDataSource + ?Sized>(
    source: &S,
    config: &RpsConfig,
    output: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RunSummary> {
    BatchRunner::new(source, config).run(output, start, end)
}

/// Compute the store only when `output` does not exist yet, or when `force`
/// is set.
///
/// Returns `None` when an existing store was kept.
pub fn calculate_if_absent<S: MarketDataSource + ?Sized>(
    source: &S,
    config: &RpsConfig,
    output: &Path,
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
) -> Result<Option<RunSummary>> {
    calculate_if_absent_with_progress(source, config, output, start, end, force, |_| {})
}

/// [`calculate_if_absent`] reporting each trading date to `on_day`.
pub fn calculate_if_absent_with_progress<S, F>(
    source: &S,
    config: &RpsConfig,
    output: &Path,
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    on_day: F,
) -> Result<Option<RunSummary>>
where
    S: MarketDataSource + ?Sized,
    F: FnMut(&DayProgress),
{
    if output.exists() && !force {
        tracing::info!(path = %output.display(), "store exists, run skipped");
        return Ok(None);
    }
    BatchRunner::new(source, config)
        .run_with_progress(output, start, end, on_day)
        .map(Some)
}
