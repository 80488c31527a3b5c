//! Error correction codes for raw NAND flash.
//!
//! This module provides the 3-byte-per-256-byte Hamming code used by NAND
//! flash translation layers:
//! - [`hamming`]: per-block compute and verify
//! - [`page`]: whole-buffer wrappers and page geometry
//! - [`status`]: read classifications
//!
//! # Examples
//!
//! ```rust
//! use nand_ecc::ecc::{ErrorCorrection, NandEcc};
//!
//! let ecc = NandEcc::new(512).unwrap();
//! let mut stored = ecc.encode(&[0xC3; 512]).unwrap();
//! stored[7] ^= 0x10;
//! assert_eq!(ecc.decode(&stored).unwrap(), vec![0xC3; 512]);
//! ```

use crate::error::Result;

/// Trait for error correction code implementations
pub trait ErrorCorrection {
    /// Encode data with error correction symbols
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decode data and correct errors if possible
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Hamming code over 256-byte blocks
pub mod hamming;
pub use hamming::{compute256, count_bits, verify256, Syndrome, Verdict, BLOCK_SIZE, CODE_SIZE};

/// Multi-block wrappers and page geometry
pub mod page;
#[cfg(feature = "parallel")]
pub use page::compute_parallel;
pub use page::{code_len, compute, verify, verify_page, Correction, NandEcc, PageReport};

/// Read classifications
pub mod status;
pub use status::EccStatus;
