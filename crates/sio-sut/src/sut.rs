//! Supply-use table container.
//!
//! A `Sut` is filled matrix by matrix (usually by a loader) and every setter
//! enforces the multi-regional shape for its matrix. Matrices sit behind
//! `Arc` so a corrected table can share everything it did not touch with the
//! table it was derived from.

use crate::error::{SutError, SutResult};
use nalgebra::{DMatrix, DVector};
use sio_core::{Dimensions, column_totals, first_non_finite, row_totals};
use std::sync::Arc;

/// One category label, e.g. `["AT", "Cultivation of paddy rice", "C01.1"]`.
pub type Label = Vec<String>;

/// Factor-input rows counted as value added in the EXIOBASE layout.
pub const DEFAULT_VALUE_ADDED_ROWS: [usize; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

#[derive(Clone, Debug)]
pub struct Sut {
    dims: Dimensions,
    value_added_rows: Vec<usize>,
    year: Option<i32>,

    supply: Option<Arc<DMatrix<f64>>>,
    use_table: Option<Arc<DMatrix<f64>>>,
    final_use: Option<Arc<DMatrix<f64>>>,
    factor_inputs: Option<Arc<DMatrix<f64>>>,
    extensions: Option<Arc<DMatrix<f64>>>,
    direct_extensions: Option<Arc<DMatrix<f64>>>,

    product_labels: Option<Arc<Vec<Label>>>,
    industry_labels: Option<Arc<Vec<Label>>>,
    final_use_labels: Option<Arc<Vec<Label>>>,
    factor_input_labels: Option<Arc<Vec<Label>>>,
    extension_labels: Option<Arc<Vec<Label>>>,
}

impl Sut {
    /// Create an empty table for the given dimensions.
    pub fn new(dims: Dimensions) -> SutResult<Self> {
        dims.validate()?;
        Ok(Self {
            dims,
            value_added_rows: DEFAULT_VALUE_ADDED_ROWS.to_vec(),
            year: None,
            supply: None,
            use_table: None,
            final_use: None,
            factor_inputs: None,
            extensions: None,
            direct_extensions: None,
            product_labels: None,
            industry_labels: None,
            final_use_labels: None,
            factor_input_labels: None,
            extension_labels: None,
        })
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn set_year(&mut self, year: i32) {
        self.year = Some(year);
    }

    pub fn value_added_rows(&self) -> &[usize] {
        &self.value_added_rows
    }

    /// Choose which factor-input rows count as value added.
    pub fn set_value_added_rows(&mut self, rows: Vec<usize>) -> SutResult<()> {
        if let Some(fi) = &self.factor_inputs {
            check_row_indices(&rows, fi.nrows())?;
        }
        self.value_added_rows = rows;
        Ok(())
    }

    // ---- matrices -------------------------------------------------------

    pub fn supply(&self) -> SutResult<&DMatrix<f64>> {
        self.supply
            .as_deref()
            .ok_or(SutError::Missing { what: "supply" })
    }

    pub fn set_supply(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        let expected = (self.dims.product_rows(), self.dims.industry_cols());
        check_shape("supply", &m, expected)?;
        check_finite("supply", &m)?;
        self.supply = Some(Arc::new(m));
        Ok(())
    }

    pub fn use_table(&self) -> SutResult<&DMatrix<f64>> {
        self.use_table
            .as_deref()
            .ok_or(SutError::Missing { what: "use" })
    }

    pub fn set_use_table(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        let expected = (self.dims.product_rows(), self.dims.industry_cols());
        check_shape("use", &m, expected)?;
        check_finite("use", &m)?;
        self.use_table = Some(Arc::new(m));
        Ok(())
    }

    pub fn final_use(&self) -> SutResult<&DMatrix<f64>> {
        self.final_use
            .as_deref()
            .ok_or(SutError::Missing { what: "final_use" })
    }

    pub fn set_final_use(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        let expected = (self.dims.product_rows(), self.dims.final_demand_cols());
        check_shape("final_use", &m, expected)?;
        check_finite("final_use", &m)?;
        self.final_use = Some(Arc::new(m));
        Ok(())
    }

    pub fn factor_inputs(&self) -> SutResult<&DMatrix<f64>> {
        self.factor_inputs
            .as_deref()
            .ok_or(SutError::Missing {
                what: "factor_inputs",
            })
    }

    pub fn set_factor_inputs(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        check_columns("factor_inputs", &m, self.dims.industry_cols())?;
        check_finite("factor_inputs", &m)?;
        check_row_indices(&self.value_added_rows, m.nrows())?;
        if let Some(labels) = &self.factor_input_labels {
            check_label_len("factor_input", labels.len(), m.nrows())?;
        }
        self.factor_inputs = Some(Arc::new(m));
        Ok(())
    }

    pub fn extensions(&self) -> SutResult<&DMatrix<f64>> {
        self.extensions
            .as_deref()
            .ok_or(SutError::Missing { what: "extensions" })
    }

    pub fn set_extensions(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        check_columns("extensions", &m, self.dims.industry_cols())?;
        check_finite("extensions", &m)?;
        if let Some(labels) = &self.extension_labels {
            check_label_len("extension", labels.len(), m.nrows())?;
        }
        self.extensions = Some(Arc::new(m));
        Ok(())
    }

    /// Extensions emitted by final demand itself (one column per final-use category).
    pub fn direct_extensions(&self) -> SutResult<&DMatrix<f64>> {
        self.direct_extensions
            .as_deref()
            .ok_or(SutError::Missing {
                what: "direct_extensions",
            })
    }

    pub fn set_direct_extensions(&mut self, m: DMatrix<f64>) -> SutResult<()> {
        check_columns("direct_extensions", &m, self.dims.final_demand_cols())?;
        check_finite("direct_extensions", &m)?;
        self.direct_extensions = Some(Arc::new(m));
        Ok(())
    }

    // ---- labels ---------------------------------------------------------

    pub fn product_labels(&self) -> Option<&[Label]> {
        self.product_labels.as_deref().map(Vec::as_slice)
    }

    pub fn set_product_labels(&mut self, labels: Vec<Label>) -> SutResult<()> {
        check_label_len("product", labels.len(), self.dims.product_rows())?;
        self.product_labels = Some(Arc::new(labels));
        Ok(())
    }

    pub fn industry_labels(&self) -> Option<&[Label]> {
        self.industry_labels.as_deref().map(Vec::as_slice)
    }

    pub fn set_industry_labels(&mut self, labels: Vec<Label>) -> SutResult<()> {
        check_label_len("industry", labels.len(), self.dims.industry_cols())?;
        self.industry_labels = Some(Arc::new(labels));
        Ok(())
    }

    pub fn final_use_labels(&self) -> Option<&[Label]> {
        self.final_use_labels.as_deref().map(Vec::as_slice)
    }

    pub fn set_final_use_labels(&mut self, labels: Vec<Label>) -> SutResult<()> {
        check_label_len("final_use", labels.len(), self.dims.final_demand_cols())?;
        self.final_use_labels = Some(Arc::new(labels));
        Ok(())
    }

    pub fn factor_input_labels(&self) -> Option<&[Label]> {
        self.factor_input_labels.as_deref().map(Vec::as_slice)
    }

    pub fn set_factor_input_labels(&mut self, labels: Vec<Label>) -> SutResult<()> {
        if let Some(fi) = &self.factor_inputs {
            check_label_len("factor_input", labels.len(), fi.nrows())?;
        }
        self.factor_input_labels = Some(Arc::new(labels));
        Ok(())
    }

    pub fn extension_labels(&self) -> Option<&[Label]> {
        self.extension_labels.as_deref().map(Vec::as_slice)
    }

    pub fn set_extension_labels(&mut self, labels: Vec<Label>) -> SutResult<()> {
        if let Some(ext) = &self.extensions {
            check_label_len("extension", labels.len(), ext.nrows())?;
        }
        self.extension_labels = Some(Arc::new(labels));
        Ok(())
    }

    // ---- derived aggregates (recomputed on every call) ------------------

    /// Factor-input rows selected by `value_added_rows`.
    pub fn value_added(&self) -> SutResult<DMatrix<f64>> {
        let fi = self.factor_inputs()?;
        check_row_indices(&self.value_added_rows, fi.nrows())?;
        Ok(fi.select_rows(self.value_added_rows.iter()))
    }

    /// Row sums of supply.
    pub fn total_product_supply(&self) -> SutResult<DVector<f64>> {
        Ok(row_totals(self.supply()?))
    }

    /// Row sums of use plus row sums of final use.
    pub fn total_product_use(&self) -> SutResult<DVector<f64>> {
        Ok(row_totals(self.use_table()?) + row_totals(self.final_use()?))
    }

    /// Column sums of supply.
    pub fn total_industry_output(&self) -> SutResult<DVector<f64>> {
        Ok(column_totals(self.supply()?))
    }

    /// Column sums of use plus column sums of value added.
    pub fn total_industry_input(&self) -> SutResult<DVector<f64>> {
        Ok(column_totals(self.use_table()?) + column_totals(&self.value_added()?))
    }

    /// Derive a table whose supply, use and final use are replaced.
    ///
    /// Factor inputs, extensions and labels are shared with `self`.
    pub fn with_matrices(
        &self,
        supply: DMatrix<f64>,
        use_table: DMatrix<f64>,
        final_use: DMatrix<f64>,
    ) -> SutResult<Sut> {
        let mut derived = self.clone();
        derived.set_supply(supply)?;
        derived.set_use_table(use_table)?;
        derived.set_final_use(final_use)?;
        Ok(derived)
    }

    /// Shared handle on supply, for consumers that outlive a borrow.
    pub fn shared_supply(&self) -> SutResult<Arc<DMatrix<f64>>> {
        self.supply
            .clone()
            .ok_or(SutError::Missing { what: "supply" })
    }

    pub fn shared_use_table(&self) -> SutResult<Arc<DMatrix<f64>>> {
        self.use_table
            .clone()
            .ok_or(SutError::Missing { what: "use" })
    }

    pub fn shared_final_use(&self) -> SutResult<Arc<DMatrix<f64>>> {
        self.final_use
            .clone()
            .ok_or(SutError::Missing { what: "final_use" })
    }

    /// True when `other` holds the very same factor-input allocation.
    pub fn shares_factor_inputs(&self, other: &Sut) -> bool {
        match (&self.factor_inputs, &other.factor_inputs) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn check_shape(matrix: &'static str, m: &DMatrix<f64>, expected: (usize, usize)) -> SutResult<()> {
    if m.shape() != expected {
        return Err(SutError::Shape {
            matrix,
            expected,
            actual: m.shape(),
        });
    }
    Ok(())
}

fn check_columns(matrix: &'static str, m: &DMatrix<f64>, expected: usize) -> SutResult<()> {
    if m.ncols() != expected {
        return Err(SutError::Columns {
            matrix,
            expected,
            actual: m.ncols(),
        });
    }
    Ok(())
}

fn check_finite(matrix: &'static str, m: &DMatrix<f64>) -> SutResult<()> {
    if let Some((row, col)) = first_non_finite(m) {
        return Err(SutError::NonFinite {
            matrix,
            row,
            col,
            value: m[(row, col)],
        });
    }
    Ok(())
}

fn check_label_len(axis: &'static str, actual: usize, expected: usize) -> SutResult<()> {
    if actual != expected {
        return Err(SutError::LabelLength {
            axis,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_row_indices(rows: &[usize], len: usize) -> SutResult<()> {
    if let Some(&index) = rows.iter().find(|&&r| r >= len) {
        return Err(SutError::Index {
            what: "value-added row",
            index,
            len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions::new(2, 2, 1, 1)
    }

    fn balanced() -> Sut {
        let mut sut = Sut::new(dims()).unwrap();
        sut.set_supply(DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 0.0, 10.0]))
            .unwrap();
        sut.set_use_table(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]))
            .unwrap();
        sut.set_final_use(DMatrix::from_row_slice(2, 1, &[7.0, 7.0]))
            .unwrap();
        sut.set_value_added_rows(vec![0]).unwrap();
        sut.set_factor_inputs(DMatrix::from_row_slice(2, 2, &[7.0, 7.0, 1.0, 1.0]))
            .unwrap();
        sut
    }

    #[test]
    fn wrong_supply_shape_rejected() {
        let mut sut = Sut::new(dims()).unwrap();
        let err = sut.set_supply(DMatrix::zeros(3, 2)).unwrap_err();
        assert!(matches!(
            err,
            SutError::Shape {
                matrix: "supply",
                expected: (2, 2),
                actual: (3, 2)
            }
        ));
        assert!(sut.set_supply(DMatrix::zeros(2, 2)).is_ok());
    }

    #[test]
    fn wrong_use_and_final_use_shapes_rejected() {
        let mut sut = Sut::new(dims()).unwrap();
        assert!(sut.set_use_table(DMatrix::zeros(2, 3)).is_err());
        assert!(sut.set_final_use(DMatrix::zeros(2, 2)).is_err());
        assert!(sut.set_extensions(DMatrix::zeros(5, 3)).is_err());
        assert!(sut.set_direct_extensions(DMatrix::zeros(5, 2)).is_err());
        assert!(sut.set_direct_extensions(DMatrix::zeros(5, 1)).is_ok());
    }

    #[test]
    fn non_finite_rejected() {
        let mut sut = Sut::new(dims()).unwrap();
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, f64::NAN, 0.0]);
        let err = sut.set_use_table(m).unwrap_err();
        assert!(matches!(
            err,
            SutError::NonFinite {
                matrix: "use",
                row: 1,
                col: 0,
                ..
            }
        ));
    }

    #[test]
    fn missing_matrix_reported() {
        let sut = Sut::new(dims()).unwrap();
        assert!(matches!(
            sut.supply(),
            Err(SutError::Missing { what: "supply" })
        ));
        assert!(sut.total_product_use().is_err());
    }

    #[test]
    fn label_lengths_checked_against_axes() {
        let mut sut = balanced();
        let two = vec![vec!["a".to_string()], vec!["b".to_string()]];
        assert!(sut.set_product_labels(two.clone()).is_ok());
        assert!(sut.set_industry_labels(two.clone()).is_ok());
        assert!(sut.set_final_use_labels(two.clone()).is_err());
        assert!(sut.set_factor_input_labels(two.clone()).is_ok());
        assert!(sut.set_factor_input_labels(two[..1].to_vec()).is_err());

        sut.set_extension_labels(two[..1].to_vec()).unwrap();
        let err = sut.set_extensions(DMatrix::zeros(2, 2)).unwrap_err();
        assert!(matches!(err, SutError::LabelLength { axis: "extension", .. }));
    }

    #[test]
    fn aggregates_follow_latest_matrices() {
        let mut sut = balanced();
        assert_eq!(sut.total_product_supply().unwrap().as_slice(), &[10.0, 10.0]);
        assert_eq!(sut.total_product_use().unwrap().as_slice(), &[10.0, 10.0]);
        assert_eq!(sut.total_industry_output().unwrap().as_slice(), &[10.0, 10.0]);
        assert_eq!(sut.total_industry_input().unwrap().as_slice(), &[10.0, 10.0]);

        sut.set_supply(DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 0.0, 10.0]))
            .unwrap();
        assert_eq!(sut.total_product_supply().unwrap().as_slice(), &[5.0, 10.0]);
    }

    #[test]
    fn value_added_rows_must_exist() {
        let mut sut = balanced();
        assert_eq!(sut.value_added().unwrap().shape(), (1, 2));
        assert!(matches!(
            sut.set_value_added_rows(vec![0, 5]),
            Err(SutError::Index { index: 5, .. })
        ));

        let mut fresh = Sut::new(dims()).unwrap();
        // default rows 0..=8 do not fit a two-row factor-input matrix
        assert!(fresh.set_factor_inputs(DMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn derived_table_shares_untouched_matrices() {
        let sut = balanced();
        let derived = sut
            .with_matrices(
                DMatrix::zeros(2, 2),
                DMatrix::zeros(2, 2),
                DMatrix::zeros(2, 1),
            )
            .unwrap();
        assert!(derived.shares_factor_inputs(&sut));
        assert_eq!(sut.supply().unwrap()[(0, 0)], 10.0);
        assert_eq!(derived.supply().unwrap()[(0, 0)], 0.0);
    }
}
