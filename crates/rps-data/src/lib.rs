#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/rps/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod calendar;
pub mod error;
pub mod memory;
pub mod source;

pub use cache::SqliteCache;
pub use calendar::{DEFAULT_BENCHMARK, TradingCalendar};
pub use error::{DataError, Result};
pub use memory::MemorySource;
pub use source::{ALL_UNIVERSE, Bar, BarQuery, Instrument, MarketDataSource, in_universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
