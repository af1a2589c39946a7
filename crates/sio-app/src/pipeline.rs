//! Single-year pipeline: load, diagnose, reallocate, transform, verify.

use crate::error::{AppError, AppResult};
use nalgebra::DMatrix;
use sio_project::ProjectConfig;
use sio_store::{
    RawImbalanceSummary, YearManifest, compute_input_hash, load_sut, summarize_report,
};
use sio_sut::SutImbalances;
use sio_transform::{BalanceReport, BalanceVerifier, IoTables, ModelB};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overrides `secondary.enabled` from the configuration.
    pub secondary: Option<bool>,
    pub skip_verification: bool,
    /// Process independent years on the rayon pool. Each year in flight holds
    /// its own dense product-by-product matrices, so peak memory grows with
    /// the number of threads.
    pub parallel: bool,
    /// Restrict a batch to one year.
    pub year: Option<i32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            secondary: None,
            skip_verification: false,
            parallel: false,
            year: None,
        }
    }
}

/// Wall-clock seconds per stage.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub load_s: f64,
    pub diagnose_s: f64,
    pub transform_s: f64,
    pub verify_s: f64,
    pub total_s: f64,
}

#[derive(Debug, Clone)]
pub struct YearOutcome {
    pub year: Option<i32>,
    pub secondary_applied: bool,
    pub tables: IoTables,
    pub final_demand_by_country: DMatrix<f64>,
    /// `None` when verification was skipped.
    pub report: Option<BalanceReport>,
    pub raw_imbalances: RawImbalanceSummary,
    pub input_hash: String,
    pub timings: StageTimings,
}

impl YearOutcome {
    pub fn verified(&self) -> bool {
        self.report.as_ref().is_some_and(BalanceReport::passed)
    }

    /// Manifest for the output store, stamped with the current time.
    pub fn manifest(&self, dataset: &str) -> AppResult<YearManifest> {
        let year = self.year.ok_or_else(|| {
            AppError::InvalidInput("dataset directory name is not a year".to_string())
        })?;
        Ok(YearManifest {
            dataset: dataset.to_string(),
            year,
            input_hash: self.input_hash.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            secondary_applied: self.secondary_applied,
            matrices: Vec::new(),
            checks: self.report.as_ref().map(summarize_report).unwrap_or_default(),
            raw_imbalances: self.raw_imbalances,
            elapsed_s: self.timings.total_s,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// Load one year's table and report where it is not balanced.
pub fn check_year(config: &ProjectConfig, year_dir: &Path) -> AppResult<SutImbalances> {
    let sut = load_sut(year_dir, config)?;
    Ok(sut.imbalances(config.verification.raw_balance_abs_tol)?)
}

pub fn run_year(
    config: &ProjectConfig,
    year_dir: &Path,
    options: &RunOptions,
) -> AppResult<YearOutcome> {
    let started = Instant::now();
    let mut timings = StageTimings::default();

    let stage = Instant::now();
    let input_hash = compute_input_hash(year_dir, config)?;
    let sut = load_sut(year_dir, config)?;
    let year = sut.year();
    timings.load_s = stage.elapsed().as_secs_f64();

    let stage = Instant::now();
    let imbalances = sut.imbalances(config.verification.raw_balance_abs_tol)?;
    let raw_imbalances = RawImbalanceSummary {
        products: imbalances.products.len(),
        industries: imbalances.industries.len(),
    };
    if !imbalances.is_balanced() {
        warn!(
            ?year,
            products = raw_imbalances.products,
            industries = raw_imbalances.industries,
            "supply-use table is not balanced"
        );
    }
    timings.diagnose_s = stage.elapsed().as_secs_f64();

    let stage = Instant::now();
    let secondary = options.secondary.unwrap_or(config.secondary.enabled);
    let model = if secondary {
        ModelB::with_secondary(&sut, &config.secondary_config())?
    } else {
        ModelB::new(&sut)?
    };
    let tables = model.outputs()?;
    let final_demand_by_country = model.final_demand_by_country();
    timings.transform_s = stage.elapsed().as_secs_f64();
    info!(?year, secondary, products = tables.a.nrows(), "transformed");

    let stage = Instant::now();
    let report = if options.skip_verification {
        None
    } else {
        let report =
            BalanceVerifier::with_tolerance(&model, config.verification.rel_tol).verify_all()?;
        if !report.passed() {
            let failed: Vec<&str> = report.failures().map(|c| c.kind.label()).collect();
            warn!(?year, ?failed, "balance verification failed");
        }
        Some(report)
    };
    timings.verify_s = stage.elapsed().as_secs_f64();
    timings.total_s = started.elapsed().as_secs_f64();
    info!(
        ?year,
        load_s = timings.load_s,
        transform_s = timings.transform_s,
        verify_s = timings.verify_s,
        total_s = timings.total_s,
        "year finished"
    );

    Ok(YearOutcome {
        year,
        secondary_applied: model.secondary_applied(),
        tables,
        final_demand_by_country,
        report,
        raw_imbalances,
        input_hash,
        timings,
    })
}
