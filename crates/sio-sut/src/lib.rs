//! sio-sut: the supply-use table container and the transforms applied to it
//! before it becomes an input-output table.

pub mod balance;
pub mod error;
pub mod secondary;
pub mod sut;

pub use balance::{Imbalance, SutImbalances};
pub use error::{SutError, SutResult};
pub use secondary::{MaterialPair, Reallocation, SecondaryConfig, reallocate};
pub use sut::{DEFAULT_VALUE_ADDED_ROWS, Label, Sut};
