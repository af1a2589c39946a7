//! Assemble a validated [`Sut`] from one dataset directory.

use crate::table::{LabeledTable, read_table, stack_rows};
use crate::StoreResult;
use sio_project::{ProjectConfig, TableFileDef};
use sio_sut::Sut;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The year encoded in a directory name such as `.../2011`.
pub fn year_from_dir(dir: &Path) -> Option<i32> {
    dir.file_name()?.to_str()?.parse().ok()
}

/// Every configured input file for `dir`, in configuration order.
pub fn input_files(dir: &Path, config: &ProjectConfig) -> Vec<PathBuf> {
    let year = year_from_dir(dir);
    let files = &config.files;
    [
        &files.supply,
        &files.use_table,
        &files.final_demand,
        &files.factor_inputs,
    ]
    .into_iter()
    .chain(&files.extensions)
    .chain(&files.direct_extensions)
    .map(|def| dir.join(def.resolve(year)))
    .collect()
}

fn read(dir: &Path, year: Option<i32>, def: &TableFileDef) -> StoreResult<LabeledTable> {
    let path = dir.join(def.resolve(year));
    debug!(path = %path.display(), "reading table");
    read_table(&path, def.row_header_cols, def.col_header_rows)
}

fn read_stacked(
    dir: &Path,
    year: Option<i32>,
    defs: &[TableFileDef],
) -> StoreResult<Option<LabeledTable>> {
    if defs.is_empty() {
        return Ok(None);
    }
    let tables = defs
        .iter()
        .map(|def| read(dir, year, def))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Some(stack_rows(tables)?))
}

/// Load the configured tables found in `dir`.
///
/// Product labels come from the final-demand rows, industry labels from the
/// factor-input columns.
pub fn load_sut(dir: &Path, config: &ProjectConfig) -> StoreResult<Sut> {
    let year = year_from_dir(dir);
    let files = &config.files;
    info!(dir = %dir.display(), ?year, "loading supply-use table");

    let supply = read(dir, year, &files.supply)?;
    let use_table = read(dir, year, &files.use_table)?;
    let final_demand = read(dir, year, &files.final_demand)?;
    let factor_inputs = read(dir, year, &files.factor_inputs)?;

    let mut sut = Sut::new(config.dimensions)?;
    if let Some(y) = year {
        sut.set_year(y);
    }
    sut.set_supply(supply.values)?;
    sut.set_use_table(use_table.values)?;
    sut.set_final_use(final_demand.values)?;
    sut.set_value_added_rows(config.value_added_rows.clone())?;
    sut.set_factor_inputs(factor_inputs.values)?;

    sut.set_product_labels(final_demand.row_labels)?;
    sut.set_final_use_labels(final_demand.col_labels)?;
    sut.set_industry_labels(factor_inputs.col_labels)?;
    sut.set_factor_input_labels(factor_inputs.row_labels)?;

    if let Some(ext) = read_stacked(dir, year, &files.extensions)? {
        sut.set_extensions(ext.values)?;
        sut.set_extension_labels(ext.row_labels)?;
    }
    if let Some(direct) = read_stacked(dir, year, &files.direct_extensions)? {
        sut.set_direct_extensions(direct.values)?;
    }

    Ok(sut)
}
