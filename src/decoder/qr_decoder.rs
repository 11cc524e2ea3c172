//! Module-matrix decoder: format/version recovery, masked data readout,
//! de-interleaving, Reed-Solomon correction, and segment parsing.

use crate::codec::blocks::{self, BlockLayout};
use crate::debug::trace;
use crate::decoder::{format, modes, version};
use crate::encoder::bits::BitReader;
use crate::error::QrError;
use crate::layout;
use crate::models::{Bitmap, Decoded, SegmentMode, Version};

/// Decode a rectified, fully drawn module matrix into text and metadata.
pub fn decode_matrix(matrix: &Bitmap) -> Result<Decoded, QrError> {
    let side = matrix.width();
    if matrix.height() != side {
        return Err(QrError::InvalidVersion(0));
    }
    // Side lengths must be 4k + 1 with k >= 5; from_size enforces this.
    Version::from_size(side)?;

    let (ecc, mask) = format::extract(matrix)?;
    let version = version::extract(matrix)?;
    trace!(
        "DECODE: v{} ecc {:?} mask {}",
        version.number(),
        ecc,
        mask.index()
    );

    let block_layout = BlockLayout::new(version, ecc);
    let template = layout::template(version, ecc, mask, true)?;
    let stream = layout::read_data(matrix, &template, mask, block_layout.total_codewords)?;
    let data = blocks::deinterleave(&stream, &block_layout)?;
    let text = parse_segments(&data, version)?;

    Ok(Decoded { text, version, ecc, mask })
}

/// Walk the segment stream: 4-bit mode, length field, payload; stop on the
/// terminator or when fewer than four bits remain. ECI headers are parsed
/// and skipped; the following segments decode normally.
fn parse_segments(data: &[u8], version: Version) -> Result<String, QrError> {
    let mut r = BitReader::new(data);
    let mut out = String::new();

    loop {
        if r.remaining() < 4 {
            break;
        }
        let indicator = r.read_bits(4).ok_or(QrError::SegmentParse)? as u8;
        if indicator == 0 {
            break;
        }
        let mode = SegmentMode::from_indicator(indicator)?;
        match mode {
            SegmentMode::Eci => skip_eci_designator(&mut r)?,
            SegmentMode::Kanji => return Err(QrError::UnsupportedMode),
            _ => {
                let count = r
                    .read_bits(mode.length_bits(version))
                    .ok_or(QrError::SegmentParse)? as usize;
                let part = match mode {
                    SegmentMode::Numeric => modes::numeric(&mut r, count)?,
                    SegmentMode::Alphanumeric => modes::alphanumeric(&mut r, count)?,
                    SegmentMode::Byte => modes::byte(&mut r, count)?,
                    _ => unreachable!(),
                };
                out.push_str(&part);
            }
        }
    }
    Ok(out)
}

/// ECI assignment numbers come in one, two, or three bytes, selected by
/// the leading bits of the first byte.
fn skip_eci_designator(r: &mut BitReader<'_>) -> Result<(), QrError> {
    let first = r.read_bits(8).ok_or(QrError::SegmentParse)?;
    let extra = match first {
        b if b & 0x80 == 0 => 0,
        b if b & 0xC0 == 0x80 => 8,
        b if b & 0xE0 == 0xC0 => 16,
        _ => return Err(QrError::SegmentParse),
    };
    if extra > 0 {
        r.read_bits(extra).ok_or(QrError::SegmentParse)?;
    }
    Ok(())
}
