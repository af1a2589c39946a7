//! Structural dimensions of a multi-regional supply-use table.
//!
//! Every product/industry/final-demand axis is laid out as `countries`
//! consecutive blocks of the per-country count.

use crate::{SioError, SioResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub products: usize,
    pub industries: usize,
    pub final_demand: usize,
    pub countries: usize,
}

impl Dimensions {
    pub fn new(products: usize, industries: usize, final_demand: usize, countries: usize) -> Self {
        Self {
            products,
            industries,
            final_demand,
            countries,
        }
    }

    /// EXIOBASE 3.3 product-by-industry layout.
    pub fn exiobase() -> Self {
        Self::new(200, 163, 7, 49)
    }

    /// Rows of supply, use and final use (P·C).
    pub fn product_rows(&self) -> usize {
        self.products * self.countries
    }

    /// Columns of supply, use, factor inputs and extensions (I·C).
    pub fn industry_cols(&self) -> usize {
        self.industries * self.countries
    }

    /// Columns of final use and direct extensions (F·C).
    pub fn final_demand_cols(&self) -> usize {
        self.final_demand * self.countries
    }

    /// Global row index of `product` in the block of `country`.
    pub fn product_index(&self, country: usize, product: usize) -> usize {
        country * self.products + product
    }

    /// Global column index of `industry` in the block of `country`.
    pub fn industry_index(&self, country: usize, industry: usize) -> usize {
        country * self.industries + industry
    }

    pub fn validate(&self) -> SioResult<()> {
        if self.products == 0 {
            return Err(SioError::InvalidArg {
                what: "products must be > 0",
            });
        }
        if self.industries == 0 {
            return Err(SioError::InvalidArg {
                what: "industries must be > 0",
            });
        }
        if self.final_demand == 0 {
            return Err(SioError::InvalidArg {
                what: "final_demand must be > 0",
            });
        }
        if self.countries == 0 {
            return Err(SioError::InvalidArg {
                what: "countries must be > 0",
            });
        }
        Ok(())
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::exiobase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exiobase_block_sizes() {
        let d = Dimensions::exiobase();
        assert_eq!(d.product_rows(), 9800);
        assert_eq!(d.industry_cols(), 7987);
        assert_eq!(d.final_demand_cols(), 343);
    }

    #[test]
    fn block_offsets() {
        let d = Dimensions::new(4, 3, 2, 5);
        assert_eq!(d.product_index(0, 2), 2);
        assert_eq!(d.product_index(3, 1), 13);
        assert_eq!(d.industry_index(2, 2), 8);
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(Dimensions::new(2, 0, 1, 1).validate().is_err());
        assert!(Dimensions::new(2, 2, 1, 1).validate().is_ok());
    }
}
