//! BCH codes protecting the format and version fields.
//!
//! Format: BCH(15,5) over generator 0b10100110111, masked with
//! 0b101010000010010. Version: BCH(18,6) over generator 0b1111100100101.

use crate::error::QrError;
use crate::models::{EcLevel, Mask, Version};

const FORMAT_GENERATOR: u16 = 0b101_0011_0111;
const FORMAT_MASK: u16 = 0b101_0100_0001_0010;
const VERSION_GENERATOR: u32 = 0b1_1111_0010_0101;

/// 15-bit format code for an (ecc, mask) pair.
pub fn format_bits(ecc: EcLevel, mask: Mask) -> u16 {
    let data = ((ecc.bits() as u16) << 3) | mask.index() as u16;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ (((rem >> 9) & 1) * FORMAT_GENERATOR);
    }
    ((data << 10) | rem) ^ FORMAT_MASK
}

/// 18-bit version code for versions 7..=40.
pub fn version_bits(version: Version) -> u32 {
    let data = version.number() as u32;
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ (((rem >> 11) & 1) * VERSION_GENERATOR);
    }
    (data << 12) | rem
}

/// Match two read copies of the format field against all 32 candidates.
/// An exact match on either copy wins; otherwise the candidate nearest in
/// Hamming distance is accepted up to distance 3.
pub fn match_format(copy_a: u16, copy_b: u16) -> Result<(EcLevel, Mask), QrError> {
    let mut best: Option<(EcLevel, Mask, u32)> = None;
    for ecc_bits in 0..4u8 {
        let ecc = EcLevel::from_bits(ecc_bits)?;
        for index in 0..8u8 {
            let mask = Mask::new(index)?;
            let code = format_bits(ecc, mask);
            if code == copy_a || code == copy_b {
                return Ok((ecc, mask));
            }
            let dist = (code ^ copy_a)
                .count_ones()
                .min((code ^ copy_b).count_ones());
            match best {
                Some((_, _, d)) if d <= dist => {}
                _ => best = Some((ecc, mask, dist)),
            }
        }
    }
    match best {
        Some((ecc, mask, dist)) if dist <= 3 => Ok((ecc, mask)),
        _ => Err(QrError::WrongFormatPattern),
    }
}

/// Match two read copies of the version field against versions 7..=40.
pub fn match_version(copy_a: u32, copy_b: u32) -> Result<Version, QrError> {
    let mut best: Option<(Version, u32)> = None;
    for n in 7..=40u8 {
        let version = Version::new(n)?;
        let code = version_bits(version);
        if code == copy_a || code == copy_b {
            return Ok(version);
        }
        let dist = (code ^ copy_a)
            .count_ones()
            .min((code ^ copy_b).count_ones());
        match best {
            Some((_, d)) if d <= dist => {}
            _ => best = Some((version, dist)),
        }
    }
    match best {
        Some((version, dist)) if dist <= 3 => Ok(version),
        _ => Err(QrError::WrongVersionPattern),
    }
}
