//! sio-store: tab-delimited table I/O, dataset loading and the output store.

pub mod dataset;
pub mod hash;
pub mod store;
pub mod table;
pub mod types;

pub use dataset::{input_files, load_sut, year_from_dir};
pub use hash::compute_input_hash;
pub use store::OutputStore;
pub use table::{LabeledTable, read_matrix, read_table, stack_rows, write_matrix};
pub use types::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}:{line}:{column}: cannot parse {value:?} as a number")]
    Parse {
        path: String,
        line: u64,
        column: usize,
        value: String,
    },

    #[error("{path}:{line}: expected {expected} values, found {actual}")]
    Ragged {
        path: String,
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot stack tables: {what}")]
    Stack { what: String },

    #[error("Table error: {0}")]
    Sut(#[from] sio_sut::SutError),

    #[error("Year not found: {year}")]
    YearNotFound { year: i32 },

    #[error("Matrix not found: {name} for year {year}")]
    MatrixNotFound { year: i32, name: String },
}
