//! Page-level ECC: applies the 256-byte block code across whole buffers.
//!
//! A buffer of `n * 256` bytes is paired with a code buffer of `n * 3`
//! bytes, block `i` owning code bytes `3i..3i+3`. [`NandEcc`] adds a page
//! geometry on top and stores each page's codes right after its data, the
//! way a driver places them in the spare area.
//!
//! # Examples
//!
//! ```
//! use nand_ecc::ecc::page::{compute, verify};
//! use nand_ecc::ecc::status::EccStatus;
//!
//! let mut page = vec![0x5Au8; 512];
//! let mut code = [0u8; 6];
//! compute(&page, &mut code).unwrap();
//!
//! page[300] ^= 0x04;
//! assert_eq!(verify(&mut page, &code).unwrap(), EccStatus::SingleBitCorrected);
//! assert!(page.iter().all(|&b| b == 0x5A));
//! ```

use crate::ecc::hamming::{compute256, verify256, Verdict, BLOCK_SIZE, CODE_SIZE};
use crate::ecc::status::EccStatus;
use crate::ecc::ErrorCorrection;
use crate::error::{Error, Result};
use log::{debug, trace, warn};

/// Number of code bytes needed for `data_len` bytes of data.
pub fn code_len(data_len: usize) -> Result<usize> {
    if data_len == 0 || data_len % BLOCK_SIZE != 0 {
        return Err(Error::InvalidLength { length: data_len });
    }
    Ok(data_len / BLOCK_SIZE * CODE_SIZE)
}

fn check_lengths(data_len: usize, code_len_actual: usize) -> Result<()> {
    let expected = code_len(data_len)?;
    if code_len_actual != expected {
        return Err(Error::CodeLengthMismatch {
            expected,
            actual: code_len_actual,
        });
    }
    Ok(())
}

fn as_block(chunk: &[u8]) -> Result<&[u8; BLOCK_SIZE]> {
    chunk
        .try_into()
        .map_err(|_| Error::InvalidLength { length: chunk.len() })
}

fn as_block_mut(chunk: &mut [u8]) -> Result<&mut [u8; BLOCK_SIZE]> {
    let length = chunk.len();
    chunk
        .try_into()
        .map_err(|_| Error::InvalidLength { length })
}

fn as_code(chunk: &[u8]) -> Result<&[u8; CODE_SIZE]> {
    chunk.try_into().map_err(|_| Error::CodeLengthMismatch {
        expected: CODE_SIZE,
        actual: chunk.len(),
    })
}

/// Writes the code of every 256-byte block of `data` into `code`.
///
/// `data` must be a positive multiple of 256 bytes and `code` exactly
/// `3 * data.len() / 256` bytes; anything else is rejected before any
/// byte of `code` is written.
pub fn compute(data: &[u8], code: &mut [u8]) -> Result<()> {
    check_lengths(data.len(), code.len())?;

    for (block, out) in data
        .chunks_exact(BLOCK_SIZE)
        .zip(code.chunks_exact_mut(CODE_SIZE))
    {
        out.copy_from_slice(&compute256(as_block(block)?));
    }
    Ok(())
}

/// Same as [`compute`], with blocks spread over the rayon thread pool.
#[cfg(feature = "parallel")]
pub fn compute_parallel(data: &[u8], code: &mut [u8]) -> Result<()> {
    use rayon::prelude::*;

    check_lengths(data.len(), code.len())?;

    data.par_chunks_exact(BLOCK_SIZE)
        .zip(code.par_chunks_exact_mut(CODE_SIZE))
        .try_for_each(|(block, out)| {
            out.copy_from_slice(&compute256(as_block(block)?));
            Ok(())
        })
}

/// A corrected bit, addressed within the whole buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Correction {
    /// Index of the 256-byte block
    pub block: usize,
    /// Byte offset within the block
    pub byte: usize,
    /// Bit offset within the byte, 0 = least significant
    pub bit: u8,
}

impl Correction {
    /// Byte offset within the whole buffer
    pub fn offset(&self) -> usize {
        self.block * BLOCK_SIZE + self.byte
    }
}

/// Detailed result of a page verification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageReport {
    /// Aggregate classification
    pub status: EccStatus,
    /// Bits fixed before the scan finished or stopped
    pub corrections: Vec<Correction>,
    /// Block that stopped the scan, if any
    pub failed_block: Option<usize>,
}

impl PageReport {
    /// Number of blocks that needed a correction
    pub fn corrected_blocks(&self) -> usize {
        self.corrections.len()
    }
}

/// Verifies `data` against `code`, correcting single-bit errors in place,
/// and reports every correction made.
///
/// Blocks are checked in order. A corrected block does not stop the scan;
/// the first block whose code is corrupted or whose data is uncorrectable
/// does, and its status becomes the page status. Later blocks are left
/// untouched in that case.
pub fn verify_page(data: &mut [u8], code: &[u8]) -> Result<PageReport> {
    check_lengths(data.len(), code.len())?;

    let mut report = PageReport::default();
    for (index, (block, stored)) in data
        .chunks_exact_mut(BLOCK_SIZE)
        .zip(code.chunks_exact(CODE_SIZE))
        .enumerate()
    {
        match verify256(as_block_mut(block)?, as_code(stored)?) {
            Verdict::Clean => {}
            Verdict::Corrected { byte, bit } => {
                debug!("ecc: corrected bit {bit} of byte {byte} in block {index}");
                report.status = EccStatus::SingleBitCorrected;
                report.corrections.push(Correction {
                    block: index,
                    byte,
                    bit,
                });
            }
            verdict => {
                warn!("ecc: block {index} failed verification: {}", verdict.status());
                report.status = verdict.status();
                report.failed_block = Some(index);
                return Ok(report);
            }
        }
    }

    trace!(
        "ecc: verified {} blocks, {} corrected",
        data.len() / BLOCK_SIZE,
        report.corrected_blocks()
    );
    Ok(report)
}

/// Verifies `data` against `code`, correcting single-bit errors in place.
///
/// Returns [`EccStatus::SingleBitCorrected`] if any block was repaired and
/// no block failed; a corrupted code or uncorrectable block takes
/// precedence and is returned as soon as it is found.
pub fn verify(data: &mut [u8], code: &[u8]) -> Result<EccStatus> {
    verify_page(data, code).map(|report| report.status)
}

/// Page geometry for a NAND device.
///
/// The encoded form of a page is its data followed by its code bytes, one
/// page after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NandEcc {
    /// Bytes of data per page
    page_size: usize,
}

impl Default for NandEcc {
    /// 2 KiB large-page NAND, 24 code bytes per page
    fn default() -> Self {
        NandEcc { page_size: 2048 }
    }
}

impl NandEcc {
    /// Creates a geometry for pages of `page_size` data bytes.
    ///
    /// `page_size` must be a positive multiple of 256.
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidInput("Page size must be positive".to_string()));
        }
        code_len(page_size)?;
        Ok(NandEcc { page_size })
    }

    /// Bytes of data per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Code bytes per page
    pub fn code_size(&self) -> usize {
        self.page_size / BLOCK_SIZE * CODE_SIZE
    }

    /// Bytes per page in encoded form
    pub fn encoded_page_size(&self) -> usize {
        self.page_size + self.code_size()
    }

    fn check_multiple(&self, length: usize, unit: usize) -> Result<usize> {
        if length % unit != 0 {
            return Err(Error::InvalidInput(format!(
                "Length {} is not a multiple of {} bytes",
                length, unit
            )));
        }
        Ok(length / unit)
    }

    fn check_page(&self, length: usize) -> Result<()> {
        if length != self.page_size {
            return Err(Error::InvalidInput(format!(
                "Page holds {} bytes, expected {}",
                length, self.page_size
            )));
        }
        Ok(())
    }

    /// Computes the code bytes of one page.
    pub fn compute_page(&self, page: &[u8]) -> Result<Vec<u8>> {
        self.check_page(page.len())?;
        let mut code = vec![0u8; self.code_size()];
        compute(page, &mut code)?;
        Ok(code)
    }

    /// Verifies one page against its code bytes, correcting in place.
    pub fn verify_page(&self, page: &mut [u8], code: &[u8]) -> Result<PageReport> {
        self.check_page(page.len())?;
        verify_page(page, code)
    }
}

impl ErrorCorrection for NandEcc {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let pages = self.check_multiple(data.len(), self.page_size)?;
        let mut encoded = Vec::with_capacity(pages * self.encoded_page_size());

        for page in data.chunks_exact(self.page_size) {
            encoded.extend_from_slice(page);
            encoded.extend_from_slice(&self.compute_page(page)?);
        }
        Ok(encoded)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let pages = self.check_multiple(data.len(), self.encoded_page_size())?;
        let mut decoded = Vec::with_capacity(pages * self.page_size);

        for (index, encoded) in data.chunks_exact(self.encoded_page_size()).enumerate() {
            let (page, code) = encoded.split_at(self.page_size);
            let mut page = page.to_vec();
            let report = self.verify_page(&mut page, code)?;

            if !report.status.is_data_valid() {
                let block = report.failed_block.unwrap_or(0);
                return Err(Error::Uncorrectable {
                    block: index * (self.page_size / BLOCK_SIZE) + block,
                    status: report.status,
                });
            }
            decoded.extend_from_slice(&page);
        }
        Ok(decoded)
    }
}
