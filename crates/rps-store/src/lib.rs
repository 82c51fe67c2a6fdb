#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/rps/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod history;
pub mod layout;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use history::period_history;
pub use layout::{DateTag, decode_score, encode_score, parse_period_label, period_label};
pub use sqlite::{RpsReader, RpsWriter, read_scores};
