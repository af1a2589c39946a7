//! Error types for SUT validation and reallocation.

use sio_core::SioError;
use thiserror::Error;

/// Errors raised when a supply-use table is assembled or transformed.
#[derive(Error, Debug)]
pub enum SutError {
    #[error("Shape mismatch for {matrix}: expected {expected:?}, got {actual:?}")]
    Shape {
        matrix: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Column count mismatch for {matrix}: expected {expected}, got {actual}")]
    Columns {
        matrix: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Label count mismatch for {axis}: expected {expected}, got {actual}")]
    LabelLength {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite value in {matrix} at [{row}, {col}]: {value}")]
    NonFinite {
        matrix: &'static str,
        row: usize,
        col: usize,
        value: f64,
    },

    #[error("Missing matrix: {what}")]
    Missing { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid material pair: {what}")]
    InvalidPair { what: String },

    #[error("Numeric error: {0}")]
    Core(#[from] SioError),
}

pub type SutResult<T> = Result<T, SutError>;
