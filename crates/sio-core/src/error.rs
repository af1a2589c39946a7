use thiserror::Error;

pub type SioResult<T> = Result<T, SioError>;

#[derive(Error, Debug)]
pub enum SioError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Singular matrix: {what}")]
    Singular { what: String },
}
