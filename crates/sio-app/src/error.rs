//! Error types for the sio-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Store error: {0}")]
    Store(#[from] sio_store::StoreError),

    #[error("Table error: {0}")]
    Sut(#[from] sio_sut::SutError),

    #[error("Transformation error: {0}")]
    Transform(#[from] sio_transform::TransformError),

    #[error("No dataset years found under {path}")]
    NoYears { path: PathBuf },

    #[error("Year not found: {0}")]
    YearNotFound(i32),

    #[error("{failed} of {total} years failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The Leontief system of this year could not be inverted.
    pub fn is_singular(&self) -> bool {
        matches!(self, AppError::Transform(e) if e.is_singular())
    }
}

/// Result type for sio-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sio_project::ProjectError> for AppError {
    fn from(err: sio_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}
