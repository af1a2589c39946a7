//! Application service layer for the SUT to IOT pipeline.
//!
//! Shared by the CLI: one function runs a single dataset year end to end, a
//! second runs every year found under an input root and stores the results.

pub mod batch;
pub mod error;
pub mod pipeline;

pub use batch::{BatchSummary, YearFailure, discover_years, run_batch};
pub use error::{AppError, AppResult};
pub use pipeline::{RunOptions, StageTimings, YearOutcome, check_year, run_year};
