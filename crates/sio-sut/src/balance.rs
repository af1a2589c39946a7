//! Raw supply/use balance diagnostics.
//!
//! A source table should satisfy product supply = product use and industry
//! output = industry input. Real statistical tables rarely do so exactly, so
//! imbalances are reported rather than rejected.

use crate::error::SutResult;
use crate::sut::{Label, Sut};
use nalgebra::DVector;

/// One product or industry whose two totals disagree.
#[derive(Clone, Debug, PartialEq)]
pub struct Imbalance {
    pub index: usize,
    pub label: Option<Label>,
    /// Supply minus use (products) or output minus input (industries).
    pub difference: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SutImbalances {
    pub products: Vec<Imbalance>,
    pub industries: Vec<Imbalance>,
}

impl SutImbalances {
    pub fn is_balanced(&self) -> bool {
        self.products.is_empty() && self.industries.is_empty()
    }
}

impl Sut {
    /// Every index where the absolute difference between the paired totals
    /// exceeds `abs_tol`.
    pub fn imbalances(&self, abs_tol: f64) -> SutResult<SutImbalances> {
        let products = collect(
            &self.total_product_supply()?,
            &self.total_product_use()?,
            self.product_labels(),
            abs_tol,
        );
        let industries = collect(
            &self.total_industry_output()?,
            &self.total_industry_input()?,
            self.industry_labels(),
            abs_tol,
        );
        Ok(SutImbalances {
            products,
            industries,
        })
    }
}

fn collect(
    lhs: &DVector<f64>,
    rhs: &DVector<f64>,
    labels: Option<&[Label]>,
    abs_tol: f64,
) -> Vec<Imbalance> {
    lhs.iter()
        .zip(rhs.iter())
        .enumerate()
        .filter_map(|(index, (a, b))| {
            let difference = a - b;
            (difference.abs() > abs_tol).then(|| Imbalance {
                index,
                label: labels.and_then(|l| l.get(index).cloned()),
                difference,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use sio_core::Dimensions;

    fn sut(final_use: [f64; 2]) -> Sut {
        let mut sut = Sut::new(Dimensions::new(2, 2, 1, 1)).unwrap();
        sut.set_supply(DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 0.0, 10.0]))
            .unwrap();
        sut.set_use_table(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]))
            .unwrap();
        sut.set_final_use(DMatrix::from_row_slice(2, 1, &final_use))
            .unwrap();
        sut.set_value_added_rows(vec![0]).unwrap();
        sut.set_factor_inputs(DMatrix::from_row_slice(1, 2, &[7.0, 7.0]))
            .unwrap();
        sut
    }

    #[test]
    fn balanced_table_has_no_imbalances() {
        let report = sut([7.0, 7.0]).imbalances(1e-4).unwrap();
        assert!(report.is_balanced());
    }

    #[test]
    fn product_gap_is_reported_with_label() {
        let mut table = sut([7.0, 6.5]);
        table
            .set_product_labels(vec![
                vec!["NL".into(), "steel".into()],
                vec!["NL".into(), "glass".into()],
            ])
            .unwrap();
        let report = table.imbalances(1e-4).unwrap();
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].index, 1);
        assert_eq!(report.products[0].difference, 0.5);
        assert_eq!(
            report.products[0].label.as_deref(),
            Some(&["NL".to_string(), "glass".to_string()][..])
        );
        assert!(report.industries.is_empty());
    }
}
