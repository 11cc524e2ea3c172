//! Symbol encoder
//!
//! Classifies the payload into a segment mode, assembles the bit stream,
//! picks the smallest fitting version, interleaves Reed-Solomon blocks,
//! and renders the module matrix under the penalty-optimal mask.

/// MSB-first bit stream buffers
pub mod bits;

use rayon::prelude::*;

use crate::codec::blocks::{self, BlockLayout};
use crate::error::QrError;
use crate::layout::{self, penalty};
use crate::models::{Bitmap, EcLevel, Mask, Module, Segment, SegmentMode, Version};
use bits::BitWriter;

/// The 45-character alphanumeric alphabet, indexed by value.
pub(crate) const ALPHANUMERIC: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Alternating pad codewords filling leftover capacity.
const PAD_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

/// Encoder options; defaults follow the documented entry-point table.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Error-correction level.
    pub ecc: EcLevel,
    /// Force a segment mode instead of auto-classifying.
    pub mode: Option<SegmentMode>,
    /// Force a version instead of picking the smallest that fits.
    pub version: Option<Version>,
    /// Force a mask instead of the penalty-optimal one.
    pub mask: Option<Mask>,
    /// Quiet-zone width in modules.
    pub border: usize,
    /// Pixel scale factor.
    pub scale: usize,
    /// Emit SVG as one compact path instead of one rect per module.
    pub svg_optimize: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ecc: EcLevel::Medium,
            mode: None,
            version: None,
            mask: None,
            border: 2,
            scale: 1,
            svg_optimize: true,
        }
    }
}

/// Value of an alphanumeric character, if it is in the alphabet.
pub(crate) fn alphanumeric_value(c: u8) -> Option<u32> {
    ALPHANUMERIC.iter().position(|&a| a == c).map(|v| v as u32)
}

/// Pick the tightest mode whose alphabet covers every character.
pub fn classify(text: &str) -> SegmentMode {
    if !text.is_empty() && text.bytes().all(|c| c.is_ascii_digit()) {
        SegmentMode::Numeric
    } else if !text.is_empty() && text.bytes().all(|c| alphanumeric_value(c).is_some()) {
        SegmentMode::Alphanumeric
    } else {
        SegmentMode::Byte
    }
}

/// Character count as carried in the length field (bytes for byte mode,
/// characters otherwise).
fn char_count(segment: &Segment) -> usize {
    match segment.mode {
        SegmentMode::Byte => segment.text.len(),
        _ => segment.text.chars().count(),
    }
}

/// Payload bits for a segment, excluding mode and length fields.
fn payload_bits(mode: SegmentMode, count: usize) -> Result<usize, QrError> {
    match mode {
        SegmentMode::Numeric => Ok(10 * (count / 3) + [0, 4, 7][count % 3]),
        SegmentMode::Alphanumeric => Ok(11 * (count / 2) + 6 * (count % 2)),
        SegmentMode::Byte => Ok(8 * count),
        SegmentMode::Kanji | SegmentMode::Eci => Err(QrError::UnsupportedMode),
    }
}

/// Total bit-stream length of a segment at a version.
fn segment_bit_length(segment: &Segment, version: Version) -> Result<usize, QrError> {
    let count = char_count(segment);
    Ok(4 + segment.mode.length_bits(version) + payload_bits(segment.mode, count)?)
}

/// Serialize `mode || length || payload` for one segment.
fn segment_bits(segment: &Segment, version: Version) -> Result<BitWriter, QrError> {
    let mut w = BitWriter::new();
    let count = char_count(segment);
    w.append_bits(segment.mode.indicator() as u32, 4);
    w.append_bits(count as u32, segment.mode.length_bits(version));

    match segment.mode {
        SegmentMode::Numeric => {
            let digits = segment.text.as_bytes();
            if !digits.iter().all(|c| c.is_ascii_digit()) {
                return Err(QrError::InvalidEncoding);
            }
            for chunk in digits.chunks(3) {
                let mut value = 0u32;
                for &d in chunk {
                    value = value * 10 + (d - b'0') as u32;
                }
                w.append_bits(value, [0, 4, 7, 10][chunk.len()]);
            }
        }
        SegmentMode::Alphanumeric => {
            let mut values = Vec::with_capacity(count);
            for c in segment.text.bytes() {
                values.push(alphanumeric_value(c).ok_or(QrError::InvalidEncoding)?);
            }
            for pair in values.chunks(2) {
                match *pair {
                    [a, b] => w.append_bits(45 * a + b, 11),
                    [a] => w.append_bits(a, 6),
                    _ => unreachable!(),
                }
            }
        }
        SegmentMode::Byte => {
            for byte in segment.text.bytes() {
                w.append_bits(byte as u32, 8);
            }
        }
        SegmentMode::Kanji | SegmentMode::Eci => return Err(QrError::UnsupportedMode),
    }
    Ok(w)
}

/// Smallest version whose capacity holds the segment, or the forced one
/// checked against its capacity. The overflow from the last tried version
/// surfaces when nothing fits.
pub fn fit_version(
    segment: &Segment,
    ecc: EcLevel,
    forced: Option<Version>,
) -> Result<Version, QrError> {
    if let Some(version) = forced {
        let bits = segment_bit_length(segment, version)?;
        let capacity = BlockLayout::new(version, ecc).data_bit_capacity;
        if bits > capacity {
            return Err(QrError::CapacityOverflow { bits, capacity });
        }
        return Ok(version);
    }

    let mut last_err = QrError::CapacityOverflow { bits: 0, capacity: 0 };
    for version in Version::all() {
        let bits = segment_bit_length(segment, version)?;
        let capacity = BlockLayout::new(version, ecc).data_bit_capacity;
        if bits <= capacity {
            return Ok(version);
        }
        last_err = QrError::CapacityOverflow { bits, capacity };
    }
    Err(last_err)
}

/// Data codewords for a segment: bit stream, terminator, byte padding,
/// then alternating pad codewords up to capacity.
pub fn data_codewords(
    segment: &Segment,
    version: Version,
    ecc: EcLevel,
) -> Result<Vec<u8>, QrError> {
    let layout = BlockLayout::new(version, ecc);
    let mut w = segment_bits(segment, version)?;
    let capacity = layout.data_bit_capacity;
    if w.bit_len() > capacity {
        return Err(QrError::CapacityOverflow { bits: w.bit_len(), capacity });
    }

    let terminator = 4.min(capacity - w.bit_len());
    w.append_bits(0, terminator);
    let partial = w.bit_len() % 8;
    if partial != 0 {
        w.append_bits(0, 8 - partial);
    }

    let mut bytes = w.into_bytes();
    let mut pad = 0usize;
    while bytes.len() < layout.data_codewords() {
        bytes.push(PAD_CODEWORDS[pad % 2]);
        pad += 1;
    }
    Ok(bytes)
}

/// Full interleaved codeword stream (data plus Reed-Solomon parity).
pub fn codeword_stream(
    segment: &Segment,
    version: Version,
    ecc: EcLevel,
) -> Result<Vec<u8>, QrError> {
    let layout = BlockLayout::new(version, ecc);
    let data = data_codewords(segment, version, ecc)?;
    blocks::interleave(&data, &layout)
}

/// Render the symbol for a chosen mask, on a test-mode template when the
/// caller is scoring trials.
fn render(
    version: Version,
    ecc: EcLevel,
    mask: Mask,
    stream: &[u8],
    test_mode: bool,
) -> Result<Bitmap, QrError> {
    let mut matrix = layout::template(version, ecc, mask, test_mode)?;
    layout::place_data(&mut matrix, mask, stream)?;
    matrix.assert_drawn()?;
    Ok(matrix)
}

/// Encode `text` into a bare module matrix (no quiet zone, no scaling).
///
/// Mask trials run in parallel; ties resolve to the lowest mask index so
/// the winner is deterministic.
pub fn encode_matrix(text: &str, opts: &EncodeOptions) -> Result<Bitmap, QrError> {
    let mode = match opts.mode {
        Some(SegmentMode::Kanji) | Some(SegmentMode::Eci) => {
            return Err(QrError::UnsupportedMode)
        }
        Some(mode) => mode,
        None => classify(text),
    };
    let segment = Segment { mode, text };
    let version = fit_version(&segment, opts.ecc, opts.version)?;
    let stream = codeword_stream(&segment, version, opts.ecc)?;

    let mask = match opts.mask {
        Some(mask) => mask,
        None => {
            let scored: Vec<(u32, Mask)> = Mask::all()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|mask| {
                    let trial = render(version, opts.ecc, mask, &stream, true)?;
                    Ok((penalty::penalty(&trial), mask))
                })
                .collect::<Result<_, QrError>>()?;
            scored
                .into_iter()
                .min_by_key(|&(score, mask)| (score, mask.index()))
                .map(|(_, mask)| mask)
                .expect("eight masks always produce a winner")
        }
    };

    render(version, opts.ecc, mask, &stream, false)
}

/// Encode plus quiet zone and pixel scaling, the common output shape.
pub fn encode_symbol(text: &str, opts: &EncodeOptions) -> Result<Bitmap, QrError> {
    let matrix = encode_matrix(text, opts)?;
    matrix.border(opts.border, Module::Light).scale(opts.scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("0123456789"), SegmentMode::Numeric);
        assert_eq!(classify("HELLO WORLD"), SegmentMode::Alphanumeric);
        assert_eq!(classify("AC-42:/"), SegmentMode::Alphanumeric);
        assert_eq!(classify("hello"), SegmentMode::Byte);
        assert_eq!(classify("Ünïcode"), SegmentMode::Byte);
        assert_eq!(classify(""), SegmentMode::Byte);
    }

    #[test]
    fn test_numeric_codewords_iso_example() {
        // "01234567" at version 1-M is the worked example from the
        // specification annex.
        let segment = Segment { mode: SegmentMode::Numeric, text: "01234567" };
        let version = Version::new(1).unwrap();
        let data = data_codewords(&segment, version, EcLevel::Medium).unwrap();
        assert_eq!(
            data,
            vec![16, 32, 12, 86, 97, 128, 236, 17, 236, 17, 236, 17, 236, 17, 236, 17]
        );
    }

    #[test]
    fn test_alphanumeric_packing() {
        let segment = Segment { mode: SegmentMode::Alphanumeric, text: "AC-42" };
        let version = Version::new(1).unwrap();
        let w = segment_bits(&segment, version).unwrap();
        // 4 + 9 + 11 + 11 + 6 bits.
        assert_eq!(w.bit_len(), 41);
        let bytes = w.into_bytes();
        // 0010 000000101 00111001110 11100111001 000010 (0-padded).
        assert_eq!(
            bytes,
            vec![0b0010_0000, 0b0010_1001, 0b1100_1110, 0b1110_0111, 0b0010_0001, 0b0000_0000]
        );
    }

    #[test]
    fn test_invalid_encoding_rejected() {
        let version = Some(Version::new(1).unwrap());
        let opts = EncodeOptions {
            mode: Some(SegmentMode::Numeric),
            version,
            ..EncodeOptions::default()
        };
        assert_eq!(encode_matrix("中", &opts), Err(QrError::InvalidEncoding));

        let opts = EncodeOptions { mode: Some(SegmentMode::Kanji), ..EncodeOptions::default() };
        assert_eq!(encode_matrix("x", &opts), Err(QrError::UnsupportedMode));
    }

    #[test]
    fn test_capacity_overflow() {
        let text = "X".repeat(10_000);
        let opts = EncodeOptions::default();
        assert!(matches!(
            encode_matrix(&text, &opts),
            Err(QrError::CapacityOverflow { .. })
        ));

        // Forced version that is too small overflows immediately.
        let opts = EncodeOptions {
            version: Some(Version::new(1).unwrap()),
            ..EncodeOptions::default()
        };
        assert!(matches!(
            encode_matrix("this string does not fit in a version one symbol at medium", &opts),
            Err(QrError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn test_fit_version_picks_smallest() {
        let segment = Segment { mode: SegmentMode::Numeric, text: "1" };
        assert_eq!(
            fit_version(&segment, EcLevel::Low, None).unwrap(),
            Version::new(1).unwrap()
        );

        let text = "7".repeat(200);
        let segment = Segment { mode: SegmentMode::Numeric, text: &text };
        let version = fit_version(&segment, EcLevel::Low, None).unwrap();
        // 200 digits need more than v1 (41-digit) capacity.
        assert!(version.number() > 1);
        let smaller = Version::new(version.number() - 1).unwrap();
        assert!(fit_version(&segment, EcLevel::Low, Some(smaller)).is_err());
    }

    #[test]
    fn test_mask_selection_deterministic() {
        let opts = EncodeOptions::default();
        let a = encode_matrix("determinism check", &opts).unwrap();
        let b = encode_matrix("determinism check", &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_forced_mask_is_honored() {
        for index in 0..8 {
            let mask = Mask::new(index).unwrap();
            let opts = EncodeOptions {
                mask: Some(mask),
                version: Some(Version::new(2).unwrap()),
                ..EncodeOptions::default()
            };
            let a = encode_matrix("MASK CHECK", &opts).unwrap();
            let b = encode_matrix("MASK CHECK", &opts).unwrap();
            assert_eq!(a, b, "mask {}", index);
            a.assert_drawn().unwrap();
        }
    }

    #[test]
    fn test_encode_symbol_applies_border_and_scale() {
        let opts = EncodeOptions {
            version: Some(Version::new(1).unwrap()),
            border: 3,
            scale: 2,
            ..EncodeOptions::default()
        };
        let symbol = encode_symbol("0", &opts).unwrap();
        assert_eq!(symbol.width(), (21 + 6) * 2);
        symbol.assert_drawn().unwrap();
    }
}
