//! Configuration validation logic.

use crate::schema::{LATEST_VERSION, ProjectConfig, TableFileDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_config(config: &ProjectConfig) -> Result<(), ValidationError> {
    if config.version == 0 || config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    let dims = &config.dimensions;
    dims.validate().map_err(|e| ValidationError::InvalidValue {
        field: "dimensions".to_string(),
        value: format!("{dims:?}"),
        reason: e.to_string(),
    })?;

    let mut seen_rows = HashSet::new();
    for &row in &config.value_added_rows {
        if !seen_rows.insert(row) {
            return Err(ValidationError::DuplicateId {
                id: row.to_string(),
                context: "value_added_rows".to_string(),
            });
        }
    }

    let mut materials = HashSet::new();
    for pair in &config.secondary.pairs {
        if !materials.insert(pair.material.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: pair.material.clone(),
                context: "secondary.pairs".to_string(),
            });
        }
    }
    config
        .secondary_config()
        .validate(dims)
        .map_err(|e| ValidationError::InvalidValue {
            field: "secondary.pairs".to_string(),
            value: format!("{} pairs", config.secondary.pairs.len()),
            reason: e.to_string(),
        })?;

    check_tolerance("verification.rel_tol", config.verification.rel_tol)?;
    check_tolerance(
        "verification.raw_balance_abs_tol",
        config.verification.raw_balance_abs_tol,
    )?;

    let files = &config.files;
    check_file("files.supply", &files.supply)?;
    check_file("files.use", &files.use_table)?;
    check_file("files.final_demand", &files.final_demand)?;
    check_file("files.factor_inputs", &files.factor_inputs)?;
    for f in &files.extensions {
        check_file("files.extensions", f)?;
    }
    for f in &files.direct_extensions {
        check_file("files.direct_extensions", f)?;
    }

    Ok(())
}

fn check_tolerance(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn check_file(field: &str, file: &TableFileDef) -> Result<(), ValidationError> {
    if file.path.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: String::new(),
            reason: "file path must not be empty".to_string(),
        });
    }
    Ok(())
}
