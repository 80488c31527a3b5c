//! Hamming code over 256-byte blocks, 3 code bytes per block.
//!
//! This is the single-error-correcting, double-error-detecting layout used by
//! most raw NAND flash drivers. Every byte of the block is addressed twice:
//!
//! - by its index (0..=255), giving the 16 *line* parities P1..P128 and
//!   their complements P1'..P128'
//! - by the bit position inside the XOR of all bytes (the *column sum*),
//!   giving the 6 *column* parities P1..P4 and P1'..P4'
//!
//! The three code bytes are laid out as
//!
//! ```text
//! code[0] = P128' P128 P64' P64 P32' P32 P16' P16
//! code[1] = P8'   P8   P4'  P4  P2'  P2  P1'  P1
//! code[2] = P4'   P4   P2'  P2  P1'  P1  1    1     (column parities)
//! ```
//!
//! and every byte is inverted before it is returned, so an erased block
//! (all `0xFF`) and its erased spare bytes already form a valid pair.
//!
//! A flipped data bit changes exactly one of each line pair and one of each
//! column pair, i.e. 11 bits of the syndrome, and those bits spell out the
//! byte index and bit index of the error.
//!
//! # Examples
//!
//! ```
//! use nand_ecc::ecc::hamming::{compute256, verify256, Verdict, BLOCK_SIZE};
//!
//! let mut block = [0u8; BLOCK_SIZE];
//! let code = compute256(&block);
//! assert_eq!(code, [0xFF, 0xFF, 0xFF]);
//!
//! block[17] ^= 0x20;
//! assert_eq!(verify256(&mut block, &code), Verdict::Corrected { byte: 17, bit: 5 });
//! assert_eq!(block, [0u8; BLOCK_SIZE]);
//! ```

use crate::ecc::status::EccStatus;
use bitvec::prelude::*;

/// Number of data bytes protected by one code
pub const BLOCK_SIZE: usize = 256;

/// Number of code bytes per block
pub const CODE_SIZE: usize = 3;

/// Syndrome weight of a single flipped data bit: 8 line bits + 3 column bits
const SINGLE_BIT_WEIGHT: u32 = 11;

/// Syndrome weight of a single flipped code bit
const CODE_BIT_WEIGHT: u32 = 1;

/// Counts the set bits of a byte.
pub fn count_bits(byte: u8) -> u32 {
    byte.count_ones()
}

/// Computes the 3-byte code of a 256-byte block.
pub fn compute256(data: &[u8; BLOCK_SIZE]) -> [u8; CODE_SIZE] {
    let mut column_sum: u8 = 0;
    let mut even_line: u8 = 0;
    let mut odd_line: u8 = 0;

    // Index bit k of a byte decides whether its parity lands in Px (bit k
    // clear) or Px' (bit k set), x = 2^k. Folding 255-i and i into two
    // accumulators builds all eight pairs at once:
    //   even_line = P128  P64  .. P1
    //   odd_line  = P128' P64' .. P1'
    for (i, &byte) in data.iter().enumerate() {
        column_sum ^= byte;
        if count_bits(byte) & 1 == 1 {
            let index = i as u8;
            even_line ^= !index;
            odd_line ^= index;
        }
    }

    // Same trick on the column sum, with a 3-bit index space.
    let mut even_column: u8 = 0;
    let mut odd_column: u8 = 0;
    for bit in 0..8u8 {
        if column_sum & (1 << bit) != 0 {
            even_column ^= 7 - bit;
            odd_column ^= bit;
        }
    }

    let code = [
        interleave(odd_line >> 4, even_line >> 4, 4),
        interleave(odd_line, even_line, 4),
        interleave(odd_column, even_column, 3) << 2,
    ];

    // Inverted on media, as the Linux MTD software ECC does.
    code.map(|byte| !byte)
}

/// Pairs the low `width` bits of `odd` and `even`, most significant first,
/// odd bit above even bit.
fn interleave(odd: u8, even: u8, width: u8) -> u8 {
    let mut packed = 0u8;
    for bit in (0..width).rev() {
        packed <<= 2;
        packed |= ((odd >> bit) & 1) << 1;
        packed |= (even >> bit) & 1;
    }
    packed
}

/// XOR of a freshly computed code and a stored code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Syndrome([u8; CODE_SIZE]);

impl Syndrome {
    /// Builds the syndrome of two codes of the same block.
    pub fn new(computed: &[u8; CODE_SIZE], stored: &[u8; CODE_SIZE]) -> Self {
        Syndrome([
            computed[0] ^ stored[0],
            computed[1] ^ stored[1],
            computed[2] ^ stored[2],
        ])
    }

    /// Raw syndrome bytes
    pub fn bytes(&self) -> [u8; CODE_SIZE] {
        self.0
    }

    /// True when both codes agree
    pub fn is_zero(&self) -> bool {
        self.0 == [0; CODE_SIZE]
    }

    /// Total number of disagreeing parity bits
    pub fn weight(&self) -> u32 {
        self.0.iter().map(|&b| count_bits(b)).sum()
    }

    /// Byte and bit offset addressed by a single-bit syndrome.
    ///
    /// The odd (primed) parity of each pair is set exactly where the index
    /// bit of the faulty position is 1, so reading the odd half of every
    /// pair back gives the index. Only meaningful when the weight is 11.
    pub fn error_position(&self) -> (usize, u8) {
        let [line_hi, line_lo, column] = self.0;
        let byte = (odd_bits(line_hi) << 4) | odd_bits(line_lo);
        let bit = odd_bits(column) >> 1;
        (byte as usize, bit)
    }

    /// Classifies the syndrome without touching any data.
    pub fn classify(&self) -> EccStatus {
        if self.is_zero() {
            return EccStatus::NoError;
        }
        match self.weight() {
            SINGLE_BIT_WEIGHT => EccStatus::SingleBitCorrected,
            CODE_BIT_WEIGHT => EccStatus::EccCorrupted,
            _ => EccStatus::MultipleBitsUncorrectable,
        }
    }
}

/// Gathers bits 7, 5, 3, 1 into a nibble.
fn odd_bits(byte: u8) -> u8 {
    ((byte >> 4) & 0x08) | ((byte >> 3) & 0x04) | ((byte >> 2) & 0x02) | ((byte >> 1) & 0x01)
}

/// Outcome of verifying one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Data and code agree
    Clean,
    /// One data bit was wrong and has been flipped back
    Corrected { byte: usize, bit: u8 },
    /// One code bit is wrong, the data is intact
    EccCorrupted,
    /// More errors than the code can locate
    Uncorrectable,
}

impl Verdict {
    /// The classification reported to callers
    pub fn status(&self) -> EccStatus {
        match self {
            Verdict::Clean => EccStatus::NoError,
            Verdict::Corrected { .. } => EccStatus::SingleBitCorrected,
            Verdict::EccCorrupted => EccStatus::EccCorrupted,
            Verdict::Uncorrectable => EccStatus::MultipleBitsUncorrectable,
        }
    }
}

/// Checks a block against its stored code, fixing a single-bit error in
/// place.
///
/// `data` is only modified when the result is [`Verdict::Corrected`], and
/// then in exactly one bit.
pub fn verify256(data: &mut [u8; BLOCK_SIZE], stored: &[u8; CODE_SIZE]) -> Verdict {
    let syndrome = Syndrome::new(&compute256(data), stored);

    match syndrome.classify() {
        EccStatus::NoError => Verdict::Clean,
        EccStatus::SingleBitCorrected => {
            let (byte, bit) = syndrome.error_position();
            flip_bit(data, byte, bit);
            Verdict::Corrected { byte, bit }
        }
        EccStatus::EccCorrupted => Verdict::EccCorrupted,
        EccStatus::MultipleBitsUncorrectable => Verdict::Uncorrectable,
    }
}

/// Inverts bit `bit` (0 = least significant) of byte `byte`.
pub(crate) fn flip_bit(data: &mut [u8], byte: usize, bit: u8) {
    let bits = data.view_bits_mut::<Lsb0>();
    let index = byte * 8 + bit as usize;
    let value = bits[index];
    bits.set(index, !value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_block(rng: &mut StdRng) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        rng.fill(&mut block[..]);
        block
    }

    #[test]
    fn test_count_bits() {
        assert_eq!(count_bits(0x00), 0);
        assert_eq!(count_bits(0x01), 1);
        assert_eq!(count_bits(0x80), 1);
        assert_eq!(count_bits(0xA5), 4);
        assert_eq!(count_bits(0xFF), 8);
    }

    #[test]
    fn test_zero_block_code() {
        let block = [0u8; BLOCK_SIZE];
        assert_eq!(hex::encode(compute256(&block)), "ffffff");
    }

    #[test]
    fn test_pinned_codes() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0x01;
        assert_eq!(hex::encode(compute256(&block)), "aaaaab");

        let mut block = [0u8; BLOCK_SIZE];
        block[255] = 0x80;
        assert_eq!(hex::encode(compute256(&block)), "555557");

        // Every byte has odd parity and the column sum cancels out.
        let block = [0x01u8; BLOCK_SIZE];
        assert_eq!(hex::encode(compute256(&block)), "ffffff");
    }

    #[test]
    fn test_padding_bits_are_set() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..64 {
            let block = random_block(&mut rng);
            assert_eq!(compute256(&block)[2] & 0x03, 0x03);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let block = random_block(&mut rng);
        assert_eq!(compute256(&block), compute256(&block));
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..32 {
            let block = random_block(&mut rng);
            let code = compute256(&block);
            let mut copy = block;
            assert_eq!(verify256(&mut copy, &code), Verdict::Clean);
            assert_eq!(copy, block);
        }
    }

    #[test]
    fn test_zero_block_bit_zero_correction() {
        let mut block = [0u8; BLOCK_SIZE];
        let code = compute256(&block);
        block[0] ^= 0x01;

        let verdict = verify256(&mut block, &code);
        assert_eq!(verdict, Verdict::Corrected { byte: 0, bit: 0 });
        assert_eq!(verdict.status(), EccStatus::SingleBitCorrected);
        assert_eq!(block, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn test_every_single_bit_error_is_corrected() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..4 {
            let original = random_block(&mut rng);
            let code = compute256(&original);
            for byte in 0..BLOCK_SIZE {
                for bit in 0..8u8 {
                    let mut block = original;
                    block[byte] ^= 1 << bit;
                    assert_eq!(
                        verify256(&mut block, &code),
                        Verdict::Corrected { byte, bit }
                    );
                    assert_eq!(block, original);
                }
            }
        }
    }

    #[test]
    fn test_every_code_bit_error_is_detected() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..8 {
            let original = random_block(&mut rng);
            let code = compute256(&original);
            for byte in 0..CODE_SIZE {
                for bit in 0..8u8 {
                    let mut damaged = code;
                    damaged[byte] ^= 1 << bit;
                    let mut block = original;
                    assert_eq!(verify256(&mut block, &damaged), Verdict::EccCorrupted);
                    assert_eq!(block, original);
                }
            }
        }
    }

    #[test]
    fn test_double_bit_errors_are_never_clean() {
        let mut rng = StdRng::seed_from_u64(5);
        let original = random_block(&mut rng);
        let code = compute256(&original);
        let total_bits = BLOCK_SIZE * 8;

        for _ in 0..2000 {
            let p1 = rng.gen_range(0..total_bits);
            let mut p2 = rng.gen_range(0..total_bits);
            while p2 == p1 {
                p2 = rng.gen_range(0..total_bits);
            }

            let mut block = original;
            flip_bit(&mut block, p1 / 8, (p1 % 8) as u8);
            flip_bit(&mut block, p2 / 8, (p2 % 8) as u8);
            let damaged = block;

            assert_eq!(verify256(&mut block, &code), Verdict::Uncorrectable);
            assert_eq!(block, damaged);
        }
    }

    #[test]
    fn test_double_bit_in_same_byte() {
        let original = [0x3Cu8; BLOCK_SIZE];
        let code = compute256(&original);
        let mut block = original;
        block[42] ^= 0x81;
        assert_eq!(verify256(&mut block, &code), Verdict::Uncorrectable);
    }

    #[test]
    fn test_syndrome_classification() {
        let code = [0x12, 0x34, 0x57];
        assert_eq!(Syndrome::new(&code, &code).classify(), EccStatus::NoError);
        assert!(Syndrome::new(&code, &code).is_zero());

        let one_bit = Syndrome::new(&code, &[0x12, 0x34, 0x56]);
        assert_eq!(one_bit.weight(), 1);
        assert_eq!(one_bit.classify(), EccStatus::EccCorrupted);

        let two_bits = Syndrome::new(&code, &[0x13, 0x34, 0x56]);
        assert_eq!(two_bits.classify(), EccStatus::MultipleBitsUncorrectable);
    }

    #[test]
    fn test_syndrome_error_position() {
        let mut block = [0u8; BLOCK_SIZE];
        let clean = compute256(&block);
        block[0xB6] ^= 1 << 6;
        let syndrome = Syndrome::new(&compute256(&block), &clean);
        assert_eq!(syndrome.weight(), 11);
        assert_eq!(syndrome.error_position(), (0xB6, 6));
    }

    #[test]
    fn test_flip_bit() {
        let mut data = [0u8; 4];
        flip_bit(&mut data, 2, 7);
        assert_eq!(data, [0, 0, 0x80, 0]);
        flip_bit(&mut data, 2, 7);
        assert_eq!(data, [0; 4]);
    }
}
