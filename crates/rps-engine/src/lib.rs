#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/rps/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod composite;
pub mod eligibility;
pub mod error;
pub mod ranking;
pub mod returns;
pub mod table;

pub use composite::{Aggregation, CompositeScore, CompositeScorer};
pub use eligibility::{DEFAULT_SEASONING_DAYS, EligibilityFilter, is_seasoned};
pub use error::{DataUnavailable, InsufficientUniverse, Unavailable};
pub use ranking::{
    DEFAULT_MIN_UNIVERSE, RankingEngine, RankingOutcome, RankingUnit, ScoreComputable, percentile,
    rank_records,
};
pub use returns::{ReturnComputer, ReturnRecord, ReturnStrategy, percent_change};
pub use table::{ScoreEntry, ScoreTable};
