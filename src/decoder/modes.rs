//! Segment payload parsers, one per data mode.

use crate::encoder::bits::BitReader;
use crate::encoder::ALPHANUMERIC;
use crate::error::QrError;

/// Decode `count` digits: groups of three in ten bits, two in seven,
/// one in four.
pub fn numeric(r: &mut BitReader<'_>, count: usize) -> Result<String, QrError> {
    let mut out = String::with_capacity(count);
    let mut remaining = count;
    while remaining > 0 {
        let group = remaining.min(3);
        let bits = [0, 4, 7, 10][group];
        let value = r.read_bits(bits).ok_or(QrError::SegmentParse)?;
        let limit = [0, 10, 100, 1000][group];
        if value >= limit {
            return Err(QrError::SegmentParse);
        }
        let digits = value.to_string();
        for _ in 0..group - digits.len() {
            out.push('0');
        }
        out.push_str(&digits);
        remaining -= group;
    }
    Ok(out)
}

/// Decode `count` alphanumeric characters: pairs in eleven bits, a
/// trailing singleton in six.
pub fn alphanumeric(r: &mut BitReader<'_>, count: usize) -> Result<String, QrError> {
    let mut out = String::with_capacity(count);
    let mut remaining = count;
    while remaining > 0 {
        if remaining >= 2 {
            let value = r.read_bits(11).ok_or(QrError::SegmentParse)?;
            if value >= 45 * 45 {
                return Err(QrError::SegmentParse);
            }
            out.push(ALPHANUMERIC[(value / 45) as usize] as char);
            out.push(ALPHANUMERIC[(value % 45) as usize] as char);
            remaining -= 2;
        } else {
            let value = r.read_bits(6).ok_or(QrError::SegmentParse)?;
            if value >= 45 {
                return Err(QrError::SegmentParse);
            }
            out.push(ALPHANUMERIC[value as usize] as char);
            remaining -= 1;
        }
    }
    Ok(out)
}

/// Decode `count` raw bytes and interpret them as UTF-8.
pub fn byte(r: &mut BitReader<'_>, count: usize) -> Result<String, QrError> {
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        bytes.push(r.read_bits(8).ok_or(QrError::SegmentParse)? as u8);
    }
    String::from_utf8(bytes).map_err(|_| QrError::SegmentParse)
}
