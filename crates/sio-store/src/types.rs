//! Manifest types written next to each year's artifacts.

use serde::{Deserialize, Serialize};
use sio_transform::{BalanceCheck, BalanceReport};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearManifest {
    pub dataset: String,
    pub year: i32,
    /// SHA-256 of the configuration and input files.
    pub input_hash: String,
    pub timestamp: String,
    pub secondary_applied: bool,
    #[serde(default)]
    pub matrices: Vec<MatrixEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckSummary>,
    pub raw_imbalances: RawImbalanceSummary,
    /// Pipeline wall-clock time for the year.
    #[serde(default)]
    pub elapsed_s: f64,
    pub tool_version: String,
}

impl YearManifest {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixEntry {
    pub name: String,
    pub file: String,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSummary {
    pub kind: String,
    pub passed: bool,
    pub compared: usize,
    pub failures: usize,
    /// Largest absolute delta among the failures.
    pub max_abs_delta: f64,
}

impl From<&BalanceCheck> for CheckSummary {
    fn from(check: &BalanceCheck) -> Self {
        Self {
            kind: check.kind.label().to_string(),
            passed: check.passed,
            compared: check.compared,
            failures: check.discrepancies.len(),
            max_abs_delta: check
                .discrepancies
                .iter()
                .map(|d| d.delta.abs())
                .fold(0.0, f64::max),
        }
    }
}

pub fn summarize_report(report: &BalanceReport) -> Vec<CheckSummary> {
    report.checks.iter().map(CheckSummary::from).collect()
}

/// Counts of unbalanced rows in the table as loaded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawImbalanceSummary {
    pub products: usize,
    pub industries: usize,
}
