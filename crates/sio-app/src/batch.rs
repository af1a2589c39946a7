//! Multi-year batch service.

use crate::error::{AppError, AppResult};
use crate::pipeline::{RunOptions, run_year};
use rayon::prelude::*;
use sio_project::ProjectConfig;
use sio_store::{OutputStore, YearManifest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug)]
pub struct YearFailure {
    pub year: i32,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Stored manifests in ascending year order.
    pub completed: Vec<YearManifest>,
    pub failed: Vec<YearFailure>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sub-directories of `input_root` named by a year, in ascending order.
pub fn discover_years(input_root: &Path) -> AppResult<Vec<(i32, PathBuf)>> {
    let mut years = Vec::new();
    for entry in fs::read_dir(input_root)? {
        let path = entry?.path();
        if path.is_dir()
            && let Some(year) = sio_store::year_from_dir(&path)
        {
            years.push((year, path));
        }
    }
    years.sort_by_key(|(year, _)| *year);
    Ok(years)
}

/// Run and store every year under `input_root`.
///
/// A failing year is recorded in the summary; the others still run.
pub fn run_batch(
    config: &ProjectConfig,
    input_root: &Path,
    output_root: &Path,
    options: &RunOptions,
) -> AppResult<BatchSummary> {
    let mut years = discover_years(input_root)?;
    if let Some(only) = options.year {
        years.retain(|(year, _)| *year == only);
        if years.is_empty() {
            return Err(AppError::YearNotFound(only));
        }
    }
    if years.is_empty() {
        return Err(AppError::NoYears {
            path: input_root.to_path_buf(),
        });
    }

    let store = OutputStore::new(output_root.to_path_buf())?;
    info!(
        years = years.len(),
        parallel = options.parallel,
        "starting batch"
    );

    let process = |(year, dir): &(i32, PathBuf)| {
        let result = run_year(config, dir, options).and_then(|outcome| {
            let manifest = outcome.manifest(&config.name)?;
            Ok(store.save_year(manifest, &outcome.tables, &outcome.final_demand_by_country)?)
        });
        (*year, result)
    };
    let results: Vec<(i32, AppResult<YearManifest>)> = if options.parallel {
        years.par_iter().map(process).collect()
    } else {
        years.iter().map(process).collect()
    };

    let mut summary = BatchSummary::default();
    for (year, result) in results {
        match result {
            Ok(manifest) => summary.completed.push(manifest),
            Err(e) => {
                error!(year, error = %e, "year failed");
                summary.failed.push(YearFailure { year, error: e });
            }
        }
    }
    info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        "batch finished"
    );
    Ok(summary)
}
