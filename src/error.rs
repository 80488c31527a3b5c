//! Error types shared by the ECC routines.

use crate::ecc::status::EccStatus;
use thiserror::Error;

/// Result type for ECC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when a caller breaks the buffer contract.
///
/// Read classifications (corrected, corrupted code, uncorrectable) are not
/// errors; they come back as [`EccStatus`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data length {length} is not a positive multiple of 256 bytes")]
    InvalidLength { length: usize },

    #[error("code buffer holds {actual} bytes, expected {expected}")]
    CodeLengthMismatch { expected: usize, actual: usize },

    #[error("block {block} is unreadable ({status})")]
    Uncorrectable { block: usize, status: EccStatus },
}
