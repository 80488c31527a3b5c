//! Read classification returned by the verifier.

use std::fmt::{Display, Formatter};

/// MTD-style result of a read that needed a correction
pub const MTD_EECC_CORRECT: i32 = 105;

/// Classification of a verified block or page.
///
/// Variants are ordered by severity, so `max` over several blocks yields the
/// worst outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EccStatus {
    /// Data matches its code
    #[default]
    NoError,
    /// One data bit was flipped back; no data lost
    SingleBitCorrected,
    /// The stored code is damaged, the data is intact
    EccCorrupted,
    /// Data cannot be trusted
    MultipleBitsUncorrectable,
}

impl EccStatus {
    /// Status number used by raw NAND drivers (0 = no error, 1 = single bit,
    /// 2 = ECC corrupted, 3 = multiple bits).
    pub fn raw(&self) -> u8 {
        match self {
            EccStatus::NoError => 0,
            EccStatus::SingleBitCorrected => 1,
            EccStatus::EccCorrupted => 2,
            EccStatus::MultipleBitsUncorrectable => 3,
        }
    }

    /// Inverse of [`EccStatus::raw`]
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(EccStatus::NoError),
            1 => Some(EccStatus::SingleBitCorrected),
            2 => Some(EccStatus::EccCorrupted),
            3 => Some(EccStatus::MultipleBitsUncorrectable),
            _ => None,
        }
    }

    /// Return code in the MTD convention: 0 for a clean read,
    /// `-MTD_EECC_CORRECT` for a corrected one, and the positive raw status
    /// for failures.
    pub fn mtd_code(&self) -> i32 {
        match self {
            EccStatus::NoError => 0,
            EccStatus::SingleBitCorrected => -MTD_EECC_CORRECT,
            other => other.raw() as i32,
        }
    }

    /// Whether the data can be used as read (after correction, if any)
    pub fn is_data_valid(&self) -> bool {
        !matches!(self, EccStatus::MultipleBitsUncorrectable)
    }

    /// Whether the page scan was aborted on this status
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EccStatus::EccCorrupted | EccStatus::MultipleBitsUncorrectable
        )
    }
}

impl Display for EccStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EccStatus::NoError => "no error",
            EccStatus::SingleBitCorrected => "single bit corrected",
            EccStatus::EccCorrupted => "ecc corrupted",
            EccStatus::MultipleBitsUncorrectable => "multiple bits uncorrectable",
        };
        f.write_str(text)
    }
}
