//! Product-by-product input-output table under the industry-technology
//! assumption (model B).
//!
//! With supply `V` (products x industries), use `U`, final demand `Y`, total
//! industry output `g = colsum(V)` and total product output `q = rowsum(V)`:
//!
//! - transformation matrix `T = diag(1/g) * V'` (industries x products)
//! - transactions `Z = U * T`
//! - coefficients `A = Z * diag(1/q)`
//! - Leontief inverse `L = (I - A)^-1`
//!
//! Extensions and factor inputs are carried over with the same `T` and `q`.
//! Zero totals give zero coefficients.

use crate::error::TransformResult;
use nalgebra::{DMatrix, DVector};
use sio_core::{column_totals, reciprocal, row_totals, scale_columns, scale_rows, solve_leontief};
use sio_sut::{SecondaryConfig, Sut};
use std::sync::{Arc, OnceLock};
use tracing::info;

/// The artifacts persisted per dataset/year.
#[derive(Clone, Debug)]
pub struct IoTables {
    /// Technical coefficients (product x product).
    pub a: DMatrix<f64>,
    /// Leontief inverse (product x product).
    pub l: DMatrix<f64>,
    /// Final demand (product x final-demand category).
    pub y: DMatrix<f64>,
    /// Extension coefficients (extension x product).
    pub b: DMatrix<f64>,
    /// Factor-input coefficients (factor x product).
    pub w: DMatrix<f64>,
}

pub struct ModelB {
    sut: Sut,
    secondary_applied: bool,
    v: Arc<DMatrix<f64>>,
    u: Arc<DMatrix<f64>>,
    y: Arc<DMatrix<f64>>,
    q: DVector<f64>,
    transformation: OnceLock<DMatrix<f64>>,
    coefficients: OnceLock<DMatrix<f64>>,
    leontief: OnceLock<DMatrix<f64>>,
}

impl ModelB {
    /// Build the engine directly on `sut`.
    pub fn new(sut: &Sut) -> TransformResult<Self> {
        Self::build(sut.clone(), false)
    }

    /// Build the engine on a copy of `sut` with secondary materials moved first.
    pub fn with_secondary(sut: &Sut, config: &SecondaryConfig) -> TransformResult<Self> {
        Self::build(sut.with_secondary(config)?, true)
    }

    fn build(sut: Sut, secondary_applied: bool) -> TransformResult<Self> {
        let v = sut.shared_supply()?;
        let u = sut.shared_use_table()?;
        let y = sut.shared_final_use()?;
        let q = row_totals(&v);
        Ok(Self {
            sut,
            secondary_applied,
            v,
            u,
            y,
            q,
            transformation: OnceLock::new(),
            coefficients: OnceLock::new(),
            leontief: OnceLock::new(),
        })
    }

    /// The table the engine works on (the corrected one when secondary
    /// reallocation ran).
    pub fn sut(&self) -> &Sut {
        &self.sut
    }

    pub fn secondary_applied(&self) -> bool {
        self.secondary_applied
    }

    pub fn supply(&self) -> &DMatrix<f64> {
        &self.v
    }

    pub fn use_table(&self) -> &DMatrix<f64> {
        &self.u
    }

    /// Total product output `q`.
    pub fn total_output(&self) -> &DVector<f64> {
        &self.q
    }

    /// Market-share matrix `diag(1/g) * V'`.
    pub fn transformation_matrix(&self) -> TransformResult<&DMatrix<f64>> {
        if let Some(t) = self.transformation.get() {
            return Ok(t);
        }
        let g = column_totals(&self.v);
        let t = scale_rows(&self.v.transpose(), &reciprocal(&g))?;
        Ok(self.transformation.get_or_init(|| t))
    }

    /// Product-by-product transactions `U * T`.
    pub fn io_transaction_matrix(&self) -> TransformResult<DMatrix<f64>> {
        Ok(&*self.u * self.transformation_matrix()?)
    }

    /// Technical coefficients `Z * diag(1/q)`.
    pub fn io_coefficient_matrix(&self) -> TransformResult<&DMatrix<f64>> {
        if let Some(a) = self.coefficients.get() {
            return Ok(a);
        }
        let a = self.per_unit_output(&self.io_transaction_matrix()?)?;
        Ok(self.coefficients.get_or_init(|| a))
    }

    /// Leontief inverse `(I - A)^-1`; fails on a singular system.
    pub fn io_total_requirement_matrix(&self) -> TransformResult<&DMatrix<f64>> {
        if let Some(l) = self.leontief.get() {
            return Ok(l);
        }
        let a = self.io_coefficient_matrix()?;
        info!(size = a.nrows(), "inverting Leontief system");
        let l = solve_leontief(a)?;
        Ok(self.leontief.get_or_init(|| l))
    }

    pub fn ext_transaction_matrix(&self) -> TransformResult<DMatrix<f64>> {
        Ok(self.sut.extensions()? * self.transformation_matrix()?)
    }

    pub fn ext_coefficients_matrix(&self) -> TransformResult<DMatrix<f64>> {
        self.per_unit_output(&self.ext_transaction_matrix()?)
    }

    pub fn factor_inputs_transaction_matrix(&self) -> TransformResult<DMatrix<f64>> {
        Ok(self.sut.factor_inputs()? * self.transformation_matrix()?)
    }

    pub fn factor_inputs_coefficients_matrix(&self) -> TransformResult<DMatrix<f64>> {
        self.per_unit_output(&self.factor_inputs_transaction_matrix()?)
    }

    /// Final demand needs no change of basis.
    pub fn final_demand(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Final demand with the categories of each country summed into one
    /// column (products x countries).
    pub fn final_demand_by_country(&self) -> DMatrix<f64> {
        let dims = self.sut.dims();
        let mut out = DMatrix::zeros(self.y.nrows(), dims.countries);
        for country in 0..dims.countries {
            let first = country * dims.final_demand;
            let block = self.y.columns(first, dims.final_demand);
            out.set_column(country, &row_totals(&block.into_owned()));
        }
        out
    }

    /// Everything that is persisted for one dataset/year. `b` has no rows
    /// when the table carries no extensions.
    pub fn outputs(&self) -> TransformResult<IoTables> {
        let b = if self.sut.extensions().is_ok() {
            self.ext_coefficients_matrix()?
        } else {
            DMatrix::zeros(0, self.q.len())
        };
        Ok(IoTables {
            a: self.io_coefficient_matrix()?.clone(),
            l: self.io_total_requirement_matrix()?.clone(),
            y: self.final_demand().clone(),
            b,
            w: self.factor_inputs_coefficients_matrix()?,
        })
    }

    fn per_unit_output(&self, flows: &DMatrix<f64>) -> TransformResult<DMatrix<f64>> {
        Ok(scale_columns(flows, &reciprocal(&self.q))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sio_core::{Dimensions, inverse_diagonal};

    /// Two products, two industries, one country; industry 1 also makes some
    /// of product 0.
    fn sut() -> Sut {
        let mut sut = Sut::new(Dimensions::new(2, 2, 1, 1)).unwrap();
        sut.set_supply(DMatrix::from_row_slice(2, 2, &[8.0, 2.0, 0.0, 10.0]))
            .unwrap();
        sut.set_use_table(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]))
            .unwrap();
        sut.set_final_use(DMatrix::from_row_slice(2, 1, &[7.0, 7.0]))
            .unwrap();
        sut.set_value_added_rows(vec![0]).unwrap();
        sut.set_factor_inputs(DMatrix::from_row_slice(1, 2, &[5.0, 9.0]))
            .unwrap();
        sut.set_extensions(DMatrix::from_row_slice(1, 2, &[4.0, 6.0]))
            .unwrap();
        sut
    }

    #[test]
    fn transformation_matrix_matches_inverse_diagonal_form() {
        let sut = sut();
        let model = ModelB::new(&sut).unwrap();
        let v = sut.supply().unwrap();
        let g = column_totals(v);
        let expected = inverse_diagonal(&g) * v.transpose();
        let t = model.transformation_matrix().unwrap();
        assert!((t - expected).amax() < 1e-15);
        // Every industry distributes exactly its whole output.
        for row in t.row_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn transactions_keep_product_row_totals() {
        let model = ModelB::new(&sut()).unwrap();
        let z = model.io_transaction_matrix().unwrap();
        let z_rows = row_totals(&z);
        let u_rows = row_totals(model.use_table());
        assert!((z_rows - u_rows).amax() < 1e-12);
    }

    #[test]
    fn zero_output_gives_zero_coefficients() {
        let mut sut = Sut::new(Dimensions::new(2, 2, 1, 1)).unwrap();
        sut.set_supply(DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 0.0, 0.0]))
            .unwrap();
        sut.set_use_table(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]))
            .unwrap();
        sut.set_final_use(DMatrix::from_row_slice(2, 1, &[9.0, 0.0]))
            .unwrap();
        let model = ModelB::new(&sut).unwrap();
        let a = model.io_coefficient_matrix().unwrap();
        assert!(a.iter().all(|x| x.is_finite()));
        assert_eq!(a[(1, 1)], 0.0);
        assert!((a[(0, 0)] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn final_demand_is_passthrough() {
        let sut = sut();
        let model = ModelB::new(&sut).unwrap();
        assert_eq!(model.final_demand(), sut.final_use().unwrap());
    }

    #[test]
    fn final_demand_by_country_sums_categories() {
        let dims = Dimensions::new(1, 1, 2, 2);
        let mut sut = Sut::new(dims).unwrap();
        sut.set_supply(DMatrix::from_row_slice(2, 2, &[5.0, 0.0, 0.0, 5.0]))
            .unwrap();
        sut.set_use_table(DMatrix::zeros(2, 2)).unwrap();
        sut.set_final_use(DMatrix::from_row_slice(
            2,
            4,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        ))
        .unwrap();
        let model = ModelB::new(&sut).unwrap();
        let by_country = model.final_demand_by_country();
        assert_eq!(by_country.shape(), (2, 2));
        assert_eq!(by_country[(0, 0)], 3.0);
        assert_eq!(by_country[(0, 1)], 7.0);
        assert_eq!(by_country[(1, 0)], 11.0);
        assert_eq!(by_country[(1, 1)], 15.0);
    }

    #[test]
    fn missing_extensions_reported() {
        let mut sut = Sut::new(Dimensions::new(1, 1, 1, 1)).unwrap();
        sut.set_supply(DMatrix::from_element(1, 1, 1.0)).unwrap();
        sut.set_use_table(DMatrix::zeros(1, 1)).unwrap();
        sut.set_final_use(DMatrix::from_element(1, 1, 1.0)).unwrap();
        let model = ModelB::new(&sut).unwrap();
        assert!(model.ext_coefficients_matrix().is_err());
        assert!(model.io_total_requirement_matrix().is_ok());
    }

    #[test]
    fn outputs_without_extensions_have_empty_b() {
        let mut sut = Sut::new(Dimensions::new(1, 1, 1, 1)).unwrap();
        sut.set_supply(DMatrix::from_element(1, 1, 4.0)).unwrap();
        sut.set_use_table(DMatrix::from_element(1, 1, 1.0)).unwrap();
        sut.set_final_use(DMatrix::from_element(1, 1, 3.0)).unwrap();
        sut.set_value_added_rows(vec![0]).unwrap();
        sut.set_factor_inputs(DMatrix::from_element(1, 1, 3.0)).unwrap();
        let out = ModelB::new(&sut).unwrap().outputs().unwrap();
        assert_eq!(out.b.shape(), (0, 1));
        assert!((out.w[(0, 0)] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn engine_requires_core_matrices() {
        let sut = Sut::new(Dimensions::new(1, 1, 1, 1)).unwrap();
        assert!(ModelB::new(&sut).is_err());
    }
}
