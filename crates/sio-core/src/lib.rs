//! sio-core: stable foundation for sut2iot.
//!
//! Contains:
//! - numeric (Real, default tolerances, relative closeness)
//! - dims (structural dimension counts of a multi-regional table)
//! - matrix (zero-guarded reciprocals, Leontief inverse, row/column totals)
//! - error (shared error types)

pub mod dims;
pub mod error;
pub mod matrix;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use dims::Dimensions;
pub use error::{SioError, SioResult};
pub use matrix::*;
pub use numeric::*;
