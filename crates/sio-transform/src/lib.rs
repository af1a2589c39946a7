//! Supply-use to input-output transformation.
//!
//! This crate turns a validated multi-regional supply-use table into a
//! product-by-product input-output table under the industry-technology
//! assumption (Eurostat model B), derives the Leontief inverse and the
//! extension/factor-input coefficients, and checks that no flow was created
//! or destroyed on the way.

pub mod error;
pub mod model_b;
pub mod verify;

pub use error::{TransformError, TransformResult};
pub use model_b::{IoTables, ModelB};
pub use verify::{BalanceCheck, BalanceReport, BalanceVerifier, CheckKind, Discrepancy, compare};
