//! sio-project: dataset configuration file format and validation.
//!
//! A configuration names the structural dimensions of a dataset, the
//! value-added rows, the secondary-material pair table, the verification
//! tolerances and the input file layout. Nothing is discovered at runtime.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported config format: {path}")]
    Format { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_yaml(path: &std::path::Path, config: &ProjectConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &std::path::Path, config: &ProjectConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by file extension: `.yaml`/`.yml` or `.json`.
pub fn load(path: &std::path::Path) -> ProjectResult<ProjectConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::Format {
            path: path.display().to_string(),
        }),
    }
}

/// Save by file extension: `.yaml`/`.yml` or `.json`.
pub fn save(path: &std::path::Path, config: &ProjectConfig) -> ProjectResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => save_yaml(path, config),
        Some("json") => save_json(path, config),
        _ => Err(ProjectError::Format {
            path: path.display().to_string(),
        }),
    }
}
