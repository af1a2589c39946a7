//! Verifier results depend only on the table.

use nalgebra::DMatrix;
use proptest::prelude::*;
use sio_core::{Dimensions, row_totals};
use sio_sut::Sut;
use sio_transform::{BalanceVerifier, ModelB};

const DIMS: Dimensions = Dimensions {
    products: 3,
    industries: 3,
    final_demand: 2,
    countries: 2,
};

/// Balanced by construction: final demand closes every product row.
fn balanced(off_diagonal: Vec<f64>, uses: Vec<f64>, ext: Vec<f64>) -> Sut {
    let n = DIMS.product_rows();
    let k = DIMS.industry_cols();
    let mut v = DMatrix::from_vec(n, k, off_diagonal);
    for i in 0..n.min(k) {
        v[(i, i)] += 100.0;
    }
    let u = DMatrix::from_vec(n, k, uses);
    let gap = row_totals(&v) - row_totals(&u);
    let mut y = DMatrix::zeros(n, DIMS.final_demand_cols());
    for i in 0..n {
        let country = i / DIMS.products;
        y[(i, country * DIMS.final_demand)] = 0.75 * gap[i];
        y[(i, country * DIMS.final_demand + 1)] = 0.25 * gap[i];
    }

    let mut sut = Sut::new(DIMS).unwrap();
    sut.set_supply(v).unwrap();
    sut.set_use_table(u).unwrap();
    sut.set_final_use(y).unwrap();
    sut.set_value_added_rows(vec![0]).unwrap();
    sut.set_factor_inputs(DMatrix::from_element(1, k, 1.0)).unwrap();
    sut.set_extensions(DMatrix::from_vec(2, k, ext)).unwrap();
    sut
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn verification_is_repeatable_and_passes_on_balanced_tables(
        off_diagonal in prop::collection::vec(0.0_f64..5.0, 36),
        uses in prop::collection::vec(0.0_f64..10.0, 36),
        ext in prop::collection::vec(0.0_f64..50.0, 12),
    ) {
        let sut = balanced(off_diagonal, uses, ext);
        let model = ModelB::new(&sut).unwrap();
        let verifier = BalanceVerifier::new(&model);

        let first = verifier.verify_all().unwrap();
        let second = verifier.verify_all().unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.passed(), "{:?}", first);

        let fresh = BalanceVerifier::new(&ModelB::new(&sut).unwrap()).verify_all().unwrap();
        prop_assert_eq!(first, fresh);
    }
}
