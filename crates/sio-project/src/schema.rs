//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use sio_core::{DEFAULT_RAW_BALANCE_TOL, DEFAULT_REL_TOL, Dimensions};
use sio_sut::{DEFAULT_VALUE_ADDED_ROWS, MaterialPair, SecondaryConfig};

pub const LATEST_VERSION: u32 = 1;

/// Placeholder replaced by the dataset year in file names.
pub const YEAR_PLACEHOLDER: &str = "{year}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub version: u32,
    pub name: String,
    pub dimensions: Dimensions,
    #[serde(default = "default_value_added_rows")]
    pub value_added_rows: Vec<usize>,
    #[serde(default)]
    pub secondary: SecondaryDef,
    #[serde(default)]
    pub verification: VerificationDef,
    #[serde(default)]
    pub files: FilesDef,
}

impl ProjectConfig {
    /// EXIOBASE 3.3 multi-regional tables as published.
    pub fn exiobase() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "exiobase-3.3".to_string(),
            dimensions: Dimensions::exiobase(),
            value_added_rows: default_value_added_rows(),
            secondary: SecondaryDef::default(),
            verification: VerificationDef::default(),
            files: FilesDef::default(),
        }
    }

    pub fn secondary_config(&self) -> SecondaryConfig {
        SecondaryConfig::new(
            self.secondary
                .pairs
                .iter()
                .map(|p| MaterialPair::new(p.material.clone(), p.primary_product, p.primary_industry))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecondaryDef {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<MaterialPairDef>,
}

impl Default for SecondaryDef {
    fn default() -> Self {
        Self {
            enabled: true,
            pairs: default_pairs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialPairDef {
    pub material: String,
    pub primary_product: usize,
    pub primary_industry: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationDef {
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,
    #[serde(default = "default_raw_balance_tol")]
    pub raw_balance_abs_tol: f64,
}

impl Default for VerificationDef {
    fn default() -> Self {
        Self {
            rel_tol: DEFAULT_REL_TOL,
            raw_balance_abs_tol: DEFAULT_RAW_BALANCE_TOL,
        }
    }
}

/// A tab-delimited table with `row_header_cols` leading label columns and
/// `col_header_rows` leading label rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableFileDef {
    pub path: String,
    #[serde(default)]
    pub row_header_cols: usize,
    #[serde(default)]
    pub col_header_rows: usize,
}

impl TableFileDef {
    pub fn new(path: impl Into<String>, row_header_cols: usize, col_header_rows: usize) -> Self {
        Self {
            path: path.into(),
            row_header_cols,
            col_header_rows,
        }
    }

    /// File name with the year placeholder filled in.
    pub fn resolve(&self, year: Option<i32>) -> String {
        match year {
            Some(y) => self.path.replace(YEAR_PLACEHOLDER, &y.to_string()),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilesDef {
    pub supply: TableFileDef,
    #[serde(rename = "use")]
    pub use_table: TableFileDef,
    pub final_demand: TableFileDef,
    pub factor_inputs: TableFileDef,
    /// Stacked vertically in this order.
    #[serde(default)]
    pub extensions: Vec<TableFileDef>,
    #[serde(default)]
    pub direct_extensions: Vec<TableFileDef>,
}

impl Default for FilesDef {
    fn default() -> Self {
        Self {
            supply: TableFileDef::new("mrSupply_3.3_{year}.txt", 3, 2),
            use_table: TableFileDef::new("mrUse_3.3_{year}.txt", 3, 2),
            final_demand: TableFileDef::new("mrFinalDemand_3.3_{year}.txt", 3, 2),
            factor_inputs: TableFileDef::new("mrFactorInputs_3.3_{year}.txt", 2, 2),
            extensions: vec![
                TableFileDef::new("mrEmissions_3.3_{year}.txt", 3, 2),
                TableFileDef::new("mrMaterials_3.3_{year}.txt", 2, 2),
                TableFileDef::new("mrResources_3.3_{year}.txt", 3, 2),
            ],
            direct_extensions: vec![
                TableFileDef::new("mrFDEmissions_3.3_{year}.txt", 3, 2),
                TableFileDef::new("mrFDMaterials_3.3_{year}.txt", 2, 2),
                TableFileDef::new("mrFDResources_3.3_{year}.txt", 3, 2),
            ],
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_value_added_rows() -> Vec<usize> {
    DEFAULT_VALUE_ADDED_ROWS.to_vec()
}

fn default_rel_tol() -> f64 {
    DEFAULT_REL_TOL
}

fn default_raw_balance_tol() -> f64 {
    DEFAULT_RAW_BALANCE_TOL
}

fn default_pairs() -> Vec<MaterialPairDef> {
    SecondaryConfig::exiobase()
        .pairs
        .into_iter()
        .map(|p| MaterialPairDef {
            material: p.material,
            primary_product: p.primary_product,
            primary_industry: p.primary_industry,
        })
        .collect()
}
