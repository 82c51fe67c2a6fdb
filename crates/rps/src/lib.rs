#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/rps/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod error;
pub mod select;

// Re-export main types from sub-crates
pub use rps_data as data;
pub use rps_engine as engine;
pub use rps_output as output;
pub use rps_store as store;

pub use batch::{
    BatchRunner, DayProgress, RunSummary, calculate_daily_rps, calculate_if_absent,
    calculate_if_absent_with_progress,
};
pub use config::{DEFAULT_PERIODS, MAX_PERIOD, MAX_SEASONING_DAYS, RpsConfig};
pub use error::{Result, RpsError};
pub use select::{get_top_ranked, instrument_profile, selection_report, top_ranked};

pub use rps_data::{MarketDataSource, MemorySource, SqliteCache};
pub use rps_engine::{Aggregation, CompositeScore, ScoreTable};
pub use rps_store::{DateTag, RpsReader, RpsWriter, period_history, read_scores};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
