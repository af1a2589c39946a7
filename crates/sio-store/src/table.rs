//! Tab-delimited matrix files.
//!
//! A table may carry leading label columns (one per row) and leading label
//! rows (one per column). Everything else must parse as `f64`.

use crate::{StoreError, StoreResult};
use nalgebra::DMatrix;
use sio_sut::Label;
use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledTable {
    pub values: DMatrix<f64>,
    /// One entry per data row, taken from the label columns.
    pub row_labels: Vec<Label>,
    /// One entry per data column, taken from the label rows.
    pub col_labels: Vec<Label>,
}

pub fn read_table(
    path: &Path,
    row_header_cols: usize,
    col_header_rows: usize,
) -> StoreResult<LabeledTable> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut header_rows: Vec<Vec<String>> = Vec::with_capacity(col_header_rows);
    let mut row_labels = Vec::new();
    let mut values = Vec::new();
    let mut width: Option<usize> = None;

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(idx as u64 + 1, |p| p.line());

        if idx < col_header_rows {
            header_rows.push(
                record
                    .iter()
                    .skip(row_header_cols)
                    .map(str::to_string)
                    .collect(),
            );
            continue;
        }

        let actual = record.len().saturating_sub(row_header_cols);
        let expected = *width.get_or_insert(actual);
        if record.len() < row_header_cols || actual != expected {
            return Err(StoreError::Ragged {
                path: display,
                line,
                expected,
                actual,
            });
        }

        row_labels.push(
            record
                .iter()
                .take(row_header_cols)
                .map(str::to_string)
                .collect(),
        );
        for (column, field) in record.iter().enumerate().skip(row_header_cols) {
            let value: f64 = field.trim().parse().map_err(|_| StoreError::Parse {
                path: display.clone(),
                line,
                column: column + 1,
                value: field.to_string(),
            })?;
            values.push(value);
        }
    }

    let ncols = width.unwrap_or(0);
    let col_labels = (0..ncols)
        .map(|j| {
            header_rows
                .iter()
                .map(|row| row.get(j).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(LabeledTable {
        values: DMatrix::from_row_slice(row_labels.len(), ncols, &values),
        row_labels,
        col_labels,
    })
}

/// A table with no label rows or columns.
pub fn read_matrix(path: &Path) -> StoreResult<DMatrix<f64>> {
    Ok(read_table(path, 0, 0)?.values)
}

/// Write `m` without labels. Values use the shortest round-trip formatting.
pub fn write_matrix(path: &Path, m: &DMatrix<f64>) -> StoreResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;
    for row in m.row_iter() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Stack tables vertically; all must have the same number of columns.
/// Column labels are taken from the first table.
pub fn stack_rows(tables: Vec<LabeledTable>) -> StoreResult<LabeledTable> {
    let Some(first) = tables.first() else {
        return Err(StoreError::Stack {
            what: "no tables given".to_string(),
        });
    };
    let ncols = first.values.ncols();
    let col_labels = first.col_labels.clone();
    let nrows = tables.iter().map(|t| t.values.nrows()).sum();

    let mut values = DMatrix::zeros(nrows, ncols);
    let mut row_labels = Vec::with_capacity(nrows);
    let mut offset = 0;
    for (i, table) in tables.into_iter().enumerate() {
        if table.values.ncols() != ncols {
            return Err(StoreError::Stack {
                what: format!(
                    "table {i} has {} columns, expected {ncols}",
                    table.values.ncols()
                ),
            });
        }
        let rows = table.values.nrows();
        values.rows_mut(offset, rows).copy_from(&table.values);
        row_labels.extend(table.row_labels);
        offset += rows;
    }

    Ok(LabeledTable {
        values,
        row_labels,
        col_labels,
    })
}
