/// Floating point type used throughout system
pub type Real = f64;

/// Default relative tolerance for balance checks.
pub const DEFAULT_REL_TOL: Real = 1e-3;

/// Default absolute tolerance for raw supply/use balance diagnostics.
pub const DEFAULT_RAW_BALANCE_TOL: Real = 1e-4;

/// Relative closeness: `|a - b| <= rel_tol * max(|a|, |b|)`.
///
/// No absolute floor: two exact zeros are close, zero and anything else are not.
/// NaN and infinities are only close to an identical value.
pub fn is_close(a: Real, b: Real, rel_tol: Real) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}
