//! Output storage API.
//!
//! Layout: `<root>/<year>/{A,L,Y,B,W,Y_country}.tsv` plus `manifest.json`.

use crate::table::{read_matrix, write_matrix};
use crate::types::{MatrixEntry, YearManifest};
use crate::{StoreError, StoreResult};
use nalgebra::DMatrix;
use sio_transform::IoTables;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const MANIFEST: &str = "manifest.json";

#[derive(Clone)]
pub struct OutputStore {
    root_dir: PathBuf,
}

impl OutputStore {
    pub fn new(root_dir: PathBuf) -> StoreResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn year_dir(&self, year: i32) -> PathBuf {
        self.root_dir.join(year.to_string())
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.year_dir(year).join(MANIFEST).exists()
    }

    /// Write the artifacts and the manifest. The returned manifest lists the
    /// matrices actually written.
    pub fn save_year(
        &self,
        mut manifest: YearManifest,
        tables: &IoTables,
        final_demand_by_country: &DMatrix<f64>,
    ) -> StoreResult<YearManifest> {
        let year_dir = self.year_dir(manifest.year);
        fs::create_dir_all(&year_dir)?;

        let artifacts: [(&str, &DMatrix<f64>); 6] = [
            ("A", &tables.a),
            ("L", &tables.l),
            ("Y", &tables.y),
            ("B", &tables.b),
            ("W", &tables.w),
            ("Y_country", final_demand_by_country),
        ];

        manifest.matrices.clear();
        for (name, m) in artifacts {
            let file = format!("{name}.tsv");
            write_matrix(&year_dir.join(&file), m)?;
            manifest.matrices.push(MatrixEntry {
                name: name.to_string(),
                file,
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(year_dir.join(MANIFEST), manifest_json)?;

        info!(year = manifest.year, dir = %year_dir.display(), "stored year");
        Ok(manifest)
    }

    pub fn load_manifest(&self, year: i32) -> StoreResult<YearManifest> {
        let manifest_path = self.year_dir(year).join(MANIFEST);

        if !manifest_path.exists() {
            return Err(StoreError::YearNotFound { year });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_matrix(&self, year: i32, name: &str) -> StoreResult<DMatrix<f64>> {
        let manifest = self.load_manifest(year)?;
        let entry = manifest
            .matrices
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| StoreError::MatrixNotFound {
                year,
                name: name.to_string(),
            })?;
        read_matrix(&self.year_dir(year).join(&entry.file))
    }

    /// Stored years in ascending order.
    pub fn list_years(&self) -> StoreResult<Vec<i32>> {
        let mut years = Vec::new();

        if !self.root_dir.exists() {
            return Ok(years);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir()
                && let Some(year) = entry.file_name().to_str().and_then(|s| s.parse().ok())
                && self.has_year(year)
            {
                years.push(year);
            }
        }

        years.sort_unstable();
        Ok(years)
    }
}
