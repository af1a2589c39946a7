//! Error types for transformation operations.

use sio_core::SioError;
use sio_sut::SutError;
use thiserror::Error;

/// Errors that can occur while building input-output tables.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("SUT error: {0}")]
    Sut(#[from] SutError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] SioError),
}

impl TransformError {
    /// `I - A` (or the inverse rebuilt by a balance check) is not invertible.
    pub fn is_singular(&self) -> bool {
        matches!(self, TransformError::Numeric(SioError::Singular { .. }))
    }
}

pub type TransformResult<T> = Result<T, TransformError>;
