pub mod ecc;
pub mod error;

pub use ecc::{compute, verify, EccStatus, NandEcc};
pub use error::{Error, Result};
