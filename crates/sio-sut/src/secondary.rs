//! Secondary-material reallocation.
//!
//! Statistical sources book the output of recycling industries (secondary
//! steel, secondary aluminium, ...) on the row of the matching primary
//! product. In the product classification the secondary product row and the
//! secondary industry column always sit right after their primary
//! counterparts, so each material is described by a single
//! (primary product, primary industry) pair, repeated in every country block.
//!
//! For every country and pair:
//! 1. the misplaced cell `V[primary product, secondary industry]` is moved to
//!    `V[secondary product, secondary industry]`;
//! 2. `ratio = misplaced / total primary row supply` (zero when the row is
//!    empty);
//! 3. the primary rows of use and final use are split: `ratio` of each cell
//!    goes to the secondary row, the rest stays.
//!
//! Row pair totals of use and final use are unchanged, as are industry
//! output totals.

use crate::error::{SutError, SutResult};
use crate::sut::Sut;
use nalgebra::DMatrix;
use sio_core::Dimensions;
use std::collections::HashSet;
use tracing::{debug, info};

/// A primary material and the position of its primary product/industry
/// within one country block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialPair {
    pub material: String,
    pub primary_product: usize,
    pub primary_industry: usize,
}

impl MaterialPair {
    pub fn new(material: impl Into<String>, primary_product: usize, primary_industry: usize) -> Self {
        Self {
            material: material.into(),
            primary_product,
            primary_industry,
        }
    }

    pub fn secondary_product(&self) -> usize {
        self.primary_product + 1
    }

    pub fn secondary_industry(&self) -> usize {
        self.primary_industry + 1
    }
}

/// The pair table applied by [`reallocate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecondaryConfig {
    pub pairs: Vec<MaterialPair>,
}

impl SecondaryConfig {
    pub fn new(pairs: Vec<MaterialPair>) -> Self {
        Self { pairs }
    }

    /// The EXIOBASE 3.3 product/industry classification.
    pub fn exiobase() -> Self {
        Self::new(vec![
            MaterialPair::new("wood", 57, 49),
            MaterialPair::new("pulp", 59, 51),
            MaterialPair::new("plastics", 85, 58),
            MaterialPair::new("glass", 96, 64),
            MaterialPair::new("cement", 100, 68),
            MaterialPair::new("steel", 103, 71),
            MaterialPair::new("precious_metals", 105, 73),
            MaterialPair::new("aluminium", 107, 75),
            MaterialPair::new("lead_zinc_tin", 109, 77),
            MaterialPair::new("copper", 111, 79),
            MaterialPair::new("other_non_ferrous", 113, 81),
            MaterialPair::new("construction", 149, 112),
        ])
    }

    /// Check every pair fits a country block and no two pairs touch the same
    /// product row or secondary industry column.
    pub fn validate(&self, dims: &Dimensions) -> SutResult<()> {
        let mut rows = HashSet::new();
        let mut cols = HashSet::new();
        for pair in &self.pairs {
            if pair.secondary_product() >= dims.products {
                return Err(SutError::InvalidPair {
                    what: format!(
                        "{}: secondary product {} outside {} products",
                        pair.material,
                        pair.secondary_product(),
                        dims.products
                    ),
                });
            }
            if pair.secondary_industry() >= dims.industries {
                return Err(SutError::InvalidPair {
                    what: format!(
                        "{}: secondary industry {} outside {} industries",
                        pair.material,
                        pair.secondary_industry(),
                        dims.industries
                    ),
                });
            }
            if !rows.insert(pair.primary_product) || !rows.insert(pair.secondary_product()) {
                return Err(SutError::InvalidPair {
                    what: format!("{}: product rows overlap another pair", pair.material),
                });
            }
            if !cols.insert(pair.secondary_industry()) {
                return Err(SutError::InvalidPair {
                    what: format!(
                        "{}: secondary industry column overlaps another pair",
                        pair.material
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self::exiobase()
    }
}

/// Corrected matrices produced by [`reallocate`].
#[derive(Clone, Debug)]
pub struct Reallocation {
    pub supply: DMatrix<f64>,
    pub use_table: DMatrix<f64>,
    pub final_use: DMatrix<f64>,
    /// Applied ratios, countries x pairs.
    pub shares: DMatrix<f64>,
}

/// Move misplaced secondary output onto the secondary rows.
///
/// The input table is left untouched; only the three matrices that change
/// are copied.
pub fn reallocate(sut: &Sut, config: &SecondaryConfig) -> SutResult<Reallocation> {
    let dims = *sut.dims();
    config.validate(&dims)?;

    let mut supply = sut.supply()?.clone();
    let mut use_table = sut.use_table()?.clone();
    let mut final_use = sut.final_use()?.clone();
    let mut shares = DMatrix::zeros(dims.countries, config.pairs.len());

    for country in 0..dims.countries {
        for (k, pair) in config.pairs.iter().enumerate() {
            let primary = dims.product_index(country, pair.primary_product);
            let secondary = dims.product_index(country, pair.secondary_product());
            let industry = dims.industry_index(country, pair.secondary_industry());

            let total = supply.row(primary).sum();
            let misplaced = supply[(primary, industry)];
            supply[(secondary, industry)] += misplaced;
            supply[(primary, industry)] = 0.0;

            let ratio = if total == 0.0 { 0.0 } else { misplaced / total };
            shares[(country, k)] = ratio;

            split_row(&mut use_table, primary, secondary, ratio);
            split_row(&mut final_use, primary, secondary, ratio);

            if misplaced != 0.0 {
                debug!(
                    country,
                    material = %pair.material,
                    misplaced,
                    ratio,
                    "moved secondary output"
                );
            }
        }
    }

    info!(
        countries = dims.countries,
        pairs = config.pairs.len(),
        "secondary materials reallocated"
    );

    Ok(Reallocation {
        supply,
        use_table,
        final_use,
        shares,
    })
}

/// Move `ratio` of every cell of row `primary` onto row `secondary`.
fn split_row(m: &mut DMatrix<f64>, primary: usize, secondary: usize, ratio: f64) {
    if ratio == 0.0 {
        return;
    }
    for j in 0..m.ncols() {
        let original = m[(primary, j)];
        let moved = ratio * original;
        m[(secondary, j)] += moved;
        m[(primary, j)] = original - moved;
    }
}

impl Sut {
    /// Table with secondary flows moved; factor inputs, extensions and labels
    /// are shared with `self`.
    pub fn with_secondary(&self, config: &SecondaryConfig) -> SutResult<Sut> {
        let moved = reallocate(self, config)?;
        self.with_reallocation(moved)
    }

    pub fn with_reallocation(&self, moved: Reallocation) -> SutResult<Sut> {
        self.with_matrices(moved.supply, moved.use_table, moved.final_use)
    }
}
