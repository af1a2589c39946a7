//! Conservation checks on a transformed table.
//!
//! Each check compares two vectors that must agree index by index within a
//! relative tolerance. A check scans every index so that the report lists all
//! discrepancies, not only the first one. Failures are advisory: they are
//! logged and returned, never raised as errors.

use crate::error::{TransformError, TransformResult};
use crate::model_b::ModelB;
use nalgebra::DVector;
use rayon::prelude::*;
use sio_core::{DEFAULT_REL_TOL, SioError, is_close, row_totals};
use std::fmt;
use tracing::{debug, warn};

/// Discrepancies logged individually per failing check; the rest are counted.
const MAX_LOGGED: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// `rowsum(Z) + rowsum(Y)` against `rowsum(U) + rowsum(Y)`.
    IoTransactions,
    /// `L * rowsum(Y)` against `rowsum(Z) + rowsum(Y)`.
    IoCoefficients,
    /// `rowsum(E * T)` against `rowsum(E)`.
    ExtTransactions,
    /// `B * L * rowsum(Y)` against `rowsum(E)`.
    ExtCoefficients,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::IoTransactions,
        CheckKind::IoCoefficients,
        CheckKind::ExtTransactions,
        CheckKind::ExtCoefficients,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::IoTransactions => "io_transactions",
            CheckKind::IoCoefficients => "io_coefficients",
            CheckKind::ExtTransactions => "ext_transactions",
            CheckKind::ExtCoefficients => "ext_coefficients",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Discrepancy {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
    /// `actual - expected`
    pub delta: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BalanceCheck {
    pub kind: CheckKind,
    pub passed: bool,
    /// Number of indices compared.
    pub compared: usize,
    pub discrepancies: Vec<Discrepancy>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BalanceReport {
    pub checks: Vec<BalanceCheck>,
}

impl BalanceReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn get(&self, kind: CheckKind) -> Option<&BalanceCheck> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BalanceCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Compare `actual` against `expected` index by index.
pub fn compare(
    kind: CheckKind,
    expected: &DVector<f64>,
    actual: &DVector<f64>,
    rel_tol: f64,
) -> TransformResult<BalanceCheck> {
    if expected.len() != actual.len() {
        return Err(TransformError::Numeric(SioError::ShapeMismatch {
            what: "balance check vectors",
            expected: (expected.len(), 1),
            actual: (actual.len(), 1),
        }));
    }

    let discrepancies: Vec<Discrepancy> = (0..expected.len())
        .into_par_iter()
        .filter_map(|index| {
            let (e, a) = (expected[index], actual[index]);
            (!is_close(e, a, rel_tol)).then(|| Discrepancy {
                index,
                expected: e,
                actual: a,
                delta: a - e,
            })
        })
        .collect();

    let check = BalanceCheck {
        kind,
        passed: discrepancies.is_empty(),
        compared: expected.len(),
        discrepancies,
    };
    log_outcome(&check);
    Ok(check)
}

fn log_outcome(check: &BalanceCheck) {
    if check.passed {
        debug!(check = %check.kind, compared = check.compared, "balance check passed");
        return;
    }
    warn!(
        check = %check.kind,
        failures = check.discrepancies.len(),
        compared = check.compared,
        "balance check failed"
    );
    for d in check.discrepancies.iter().take(MAX_LOGGED) {
        warn!(
            check = %check.kind,
            index = d.index,
            expected = d.expected,
            actual = d.actual,
            delta = d.delta,
            "imbalance"
        );
    }
    if check.discrepancies.len() > MAX_LOGGED {
        warn!(
            check = %check.kind,
            omitted = check.discrepancies.len() - MAX_LOGGED,
            "further imbalances not logged"
        );
    }
}

/// Runs the four conservation checks against one engine.
///
/// Holds no state besides the tolerance; running a check twice gives the
/// same answer.
pub struct BalanceVerifier<'a> {
    model: &'a ModelB,
    rel_tol: f64,
}

impl<'a> BalanceVerifier<'a> {
    pub fn new(model: &'a ModelB) -> Self {
        Self::with_tolerance(model, DEFAULT_REL_TOL)
    }

    pub fn with_tolerance(model: &'a ModelB, rel_tol: f64) -> Self {
        Self { model, rel_tol }
    }

    pub fn rel_tol(&self) -> f64 {
        self.rel_tol
    }

    pub fn check_io_transaction_matrix(&self) -> TransformResult<BalanceCheck> {
        let fd = row_totals(self.model.final_demand());
        let actual = row_totals(&self.model.io_transaction_matrix()?) + &fd;
        let expected = row_totals(self.model.use_table()) + &fd;
        compare(CheckKind::IoTransactions, &expected, &actual, self.rel_tol)
    }

    pub fn check_io_coefficients_matrix(&self) -> TransformResult<BalanceCheck> {
        let fd = row_totals(self.model.final_demand());
        let expected = row_totals(&self.model.io_transaction_matrix()?) + &fd;
        let actual = self.model.io_total_requirement_matrix()? * &fd;
        compare(CheckKind::IoCoefficients, &expected, &actual, self.rel_tol)
    }

    pub fn check_ext_transaction_matrix(&self) -> TransformResult<BalanceCheck> {
        let expected = row_totals(self.model.sut().extensions()?);
        let actual = row_totals(&self.model.ext_transaction_matrix()?);
        compare(CheckKind::ExtTransactions, &expected, &actual, self.rel_tol)
    }

    pub fn check_ext_coefficient_matrix(&self) -> TransformResult<BalanceCheck> {
        let expected = row_totals(self.model.sut().extensions()?);
        let fd = row_totals(self.model.final_demand());
        let output = self.model.io_total_requirement_matrix()? * &fd;
        let actual = self.model.ext_coefficients_matrix()? * output;
        compare(CheckKind::ExtCoefficients, &expected, &actual, self.rel_tol)
    }

    pub fn check(&self, kind: CheckKind) -> TransformResult<BalanceCheck> {
        match kind {
            CheckKind::IoTransactions => self.check_io_transaction_matrix(),
            CheckKind::IoCoefficients => self.check_io_coefficients_matrix(),
            CheckKind::ExtTransactions => self.check_ext_transaction_matrix(),
            CheckKind::ExtCoefficients => self.check_ext_coefficient_matrix(),
        }
    }

    /// All four checks. Extension checks are skipped when the table carries
    /// no extensions.
    pub fn verify_all(&self) -> TransformResult<BalanceReport> {
        let has_extensions = self.model.sut().extensions().is_ok();
        let checks = CheckKind::ALL
            .iter()
            .filter(|kind| {
                has_extensions
                    || !matches!(kind, CheckKind::ExtTransactions | CheckKind::ExtCoefficients)
            })
            .map(|&kind| self.check(kind))
            .collect::<TransformResult<Vec<_>>>()?;
        Ok(BalanceReport { checks })
    }
}

impl ModelB {
    pub fn check_io_transaction_matrix(&self) -> TransformResult<bool> {
        Ok(BalanceVerifier::new(self).check_io_transaction_matrix()?.passed)
    }

    pub fn check_io_coefficients_matrix(&self) -> TransformResult<bool> {
        Ok(BalanceVerifier::new(self).check_io_coefficients_matrix()?.passed)
    }

    pub fn check_ext_transaction_matrix(&self) -> TransformResult<bool> {
        Ok(BalanceVerifier::new(self).check_ext_transaction_matrix()?.passed)
    }

    pub fn check_ext_coefficient_matrix(&self) -> TransformResult<bool> {
        Ok(BalanceVerifier::new(self).check_ext_coefficient_matrix()?.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_collects_every_failure() {
        let expected = DVector::from_vec(vec![100.0, 50.0, 0.0, 10.0]);
        let actual = DVector::from_vec(vec![100.05, 60.0, 1.0, 10.0]);
        let check = compare(CheckKind::IoTransactions, &expected, &actual, 1e-3).unwrap();
        assert!(!check.passed);
        assert_eq!(check.compared, 4);
        let indices: Vec<usize> = check.discrepancies.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(check.discrepancies[0].delta, 10.0);
    }

    #[test]
    fn compare_rejects_length_mismatch() {
        let a = DVector::zeros(2);
        let b = DVector::zeros(3);
        assert!(compare(CheckKind::ExtTransactions, &a, &b, 1e-3).is_err());
    }

    #[test]
    fn report_passes_only_if_all_pass() {
        let ok = BalanceCheck {
            kind: CheckKind::IoTransactions,
            passed: true,
            compared: 1,
            discrepancies: vec![],
        };
        let bad = BalanceCheck {
            kind: CheckKind::IoCoefficients,
            passed: false,
            ..ok.clone()
        };
        let report = BalanceReport {
            checks: vec![ok.clone(), bad],
        };
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
        assert!(report.get(CheckKind::IoTransactions).unwrap().passed);
        assert!(BalanceReport { checks: vec![ok] }.passed());
    }
}
