//! Dense matrix helpers shared by the SUT, reallocation and transformation code.
//!
//! Nothing in here knows about products or industries; callers bring the
//! economic meaning.

use crate::{SioError, SioResult};
use nalgebra::{DMatrix, DVector};

/// Element-wise reciprocal where an exact zero stays zero.
pub fn reciprocal(v: &DVector<f64>) -> DVector<f64> {
    v.map(|x| if x != 0.0 { 1.0 / x } else { 0.0 })
}

/// Diagonal matrix of the reciprocals of `v`, zero entries mapped to zero.
///
/// Used to turn flows into coefficients (flow / total). A zero total means the
/// product or industry has no output, so its coefficient is zero instead of
/// infinite.
pub fn inverse_diagonal(v: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_diagonal(&reciprocal(v))
}

/// Sum of every row (length = `m.nrows()`).
pub fn row_totals(m: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(m.nrows(), m.row_iter().map(|row| row.sum()))
}

/// Sum of every column (length = `m.ncols()`).
pub fn column_totals(m: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(m.ncols(), m.column_iter().map(|col| col.sum()))
}

/// `m * diag(factors)` without materialising the diagonal.
pub fn scale_columns(m: &DMatrix<f64>, factors: &DVector<f64>) -> SioResult<DMatrix<f64>> {
    if factors.len() != m.ncols() {
        return Err(SioError::ShapeMismatch {
            what: "column scale factors",
            expected: (m.ncols(), 1),
            actual: (factors.len(), 1),
        });
    }
    let mut out = m.clone();
    for (j, mut col) in out.column_iter_mut().enumerate() {
        col *= factors[j];
    }
    Ok(out)
}

/// `diag(factors) * m` without materialising the diagonal.
pub fn scale_rows(m: &DMatrix<f64>, factors: &DVector<f64>) -> SioResult<DMatrix<f64>> {
    if factors.len() != m.nrows() {
        return Err(SioError::ShapeMismatch {
            what: "row scale factors",
            expected: (m.nrows(), 1),
            actual: (factors.len(), 1),
        });
    }
    let mut out = m.clone();
    for (i, mut row) in out.row_iter_mut().enumerate() {
        row *= factors[i];
    }
    Ok(out)
}

/// Replace NaN entries with zero.
pub fn nan_to_zero(m: &DMatrix<f64>) -> DMatrix<f64> {
    m.map(|x| if x.is_nan() { 0.0 } else { x })
}

/// Reciprocal condition number below which `I - A` counts as singular.
pub const SINGULAR_RCOND: f64 = 1e-12;

/// Leontief inverse `(I - A)^-1`.
///
/// NaN entries of `A` are treated as zero. A singular `I - A` is an error, not
/// something to retry: the same input fails the same way. Rounding can leave a
/// tiny nonzero pivot in an exactly singular system, so an inverse whose
/// reciprocal condition number falls below [`SINGULAR_RCOND`] is rejected too.
pub fn solve_leontief(a: &DMatrix<f64>) -> SioResult<DMatrix<f64>> {
    if !a.is_square() {
        return Err(SioError::ShapeMismatch {
            what: "technical coefficient matrix must be square",
            expected: (a.nrows(), a.nrows()),
            actual: a.shape(),
        });
    }
    let n = a.nrows();
    let system = DMatrix::<f64>::identity(n, n) - nan_to_zero(a);

    if let Some(what) = degenerate_line(&system) {
        return Err(SioError::Singular {
            what: format!("I - A ({n}x{n}) has {what}"),
        });
    }

    let inverse = system.clone().try_inverse().ok_or_else(|| SioError::Singular {
        what: format!("I - A ({n}x{n}) is not invertible"),
    })?;

    if let Some((i, j)) = first_non_finite(&inverse) {
        return Err(SioError::Singular {
            what: format!("I - A ({n}x{n}) is numerically singular (non-finite inverse at [{i}, {j}])"),
        });
    }

    let rcond = 1.0 / (one_norm(&system) * one_norm(&inverse));
    if rcond.is_nan() || rcond < SINGULAR_RCOND {
        let row = largest_row(&inverse);
        return Err(SioError::Singular {
            what: format!(
                "I - A ({n}x{n}) is numerically singular (rcond {rcond:.3e}, worst at product {row})"
            ),
        });
    }

    Ok(inverse)
}

/// Largest absolute column sum.
fn one_norm(m: &DMatrix<f64>) -> f64 {
    m.column_iter()
        .map(|col| col.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Row with the largest absolute sum.
fn largest_row(m: &DMatrix<f64>) -> usize {
    let mut worst = (0, f64::NEG_INFINITY);
    for (i, row) in m.row_iter().enumerate() {
        let sum: f64 = row.iter().map(|x| x.abs()).sum();
        if sum > worst.1 {
            worst = (i, sum);
        }
    }
    worst.0
}

/// Locate a row or column of zeros, which pins down the offending product.
fn degenerate_line(m: &DMatrix<f64>) -> Option<String> {
    if let Some(i) = m.row_iter().position(|row| row.iter().all(|&x| x == 0.0)) {
        return Some(format!("an all-zero row for product {i}"));
    }
    m.column_iter()
        .position(|col| col.iter().all(|&x| x == 0.0))
        .map(|j| format!("an all-zero column for product {j}"))
}

/// First (row, col) holding NaN or infinity.
pub fn first_non_finite(m: &DMatrix<f64>) -> Option<(usize, usize)> {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            if !m[(i, j)].is_finite() {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_diagonal_guards_zero() {
        let v = DVector::from_vec(vec![2.0, 0.0, -4.0]);
        let d = inverse_diagonal(&v);
        assert_eq!(d.shape(), (3, 3));
        assert_eq!(d[(0, 0)], 0.5);
        assert_eq!(d[(1, 1)], 0.0);
        assert_eq!(d[(2, 2)], -0.25);
        assert_eq!(d[(0, 1)], 0.0);
    }

    #[test]
    fn totals_follow_axes() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(row_totals(&m).as_slice(), &[6.0, 15.0]);
        assert_eq!(column_totals(&m).as_slice(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn scaling_matches_diagonal_product() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let f = DVector::from_vec(vec![10.0, 0.0]);
        let by_cols = scale_columns(&m, &f).unwrap();
        assert_eq!(by_cols, &m * DMatrix::from_diagonal(&f));
        let by_rows = scale_rows(&m, &f).unwrap();
        assert_eq!(by_rows, DMatrix::from_diagonal(&f) * &m);
        assert!(scale_rows(&m, &DVector::zeros(3)).is_err());
    }

    #[test]
    fn leontief_of_zero_is_identity() {
        let a = DMatrix::zeros(3, 3);
        let l = solve_leontief(&a).unwrap();
        assert_eq!(l, DMatrix::identity(3, 3));
    }

    #[test]
    fn leontief_ignores_nan() {
        let a = DMatrix::from_row_slice(2, 2, &[0.5, f64::NAN, 0.0, 0.0]);
        let l = solve_leontief(&a).unwrap();
        assert!((l[(0, 0)] - 2.0).abs() < 1e-12);
        assert_eq!(l[(0, 1)], 0.0);
        assert_eq!(l[(1, 1)], 1.0);
    }

    #[test]
    fn leontief_singular_names_product() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let err = solve_leontief(&a).unwrap_err();
        let msg = format!("{err}");
        assert!(matches!(err, SioError::Singular { .. }));
        assert!(msg.contains("product 0"), "{msg}");
    }

    #[test]
    fn leontief_rejects_rows_summing_to_one_despite_rounding() {
        for entries in [
            [0.1, 0.9, 0.2, 0.8],
            [0.3, 0.7, 0.6, 0.4],
            [0.5, 0.5, 0.5, 0.5],
        ] {
            let a = DMatrix::from_row_slice(2, 2, &entries);
            let err = solve_leontief(&a).unwrap_err();
            assert!(matches!(err, SioError::Singular { .. }), "{entries:?}: {err}");
        }
    }

    #[test]
    fn leontief_accepts_well_conditioned_system() {
        let a = DMatrix::from_row_slice(2, 2, &[0.1, 0.8, 0.2, 0.7]);
        let l = solve_leontief(&a).unwrap();
        let product = (DMatrix::<f64>::identity(2, 2) - &a) * l;
        assert!((product - DMatrix::<f64>::identity(2, 2)).amax() < 1e-12);
    }

    #[test]
    fn leontief_rejects_non_square() {
        let a = DMatrix::zeros(2, 3);
        assert!(matches!(
            solve_leontief(&a),
            Err(SioError::ShapeMismatch { .. })
        ));
    }
}
