//! Symbol layout engine
//!
//! Builds the function-pattern template for a version (finders, separators,
//! alignment, timing, format/version fields, dark module) and walks the
//! zig-zag data path over the remaining cells. The encoder places masked
//! bits along the path; the decoder rebuilds the same template to know
//! which cells carry data.

/// Mask penalty scoring (rules R1-R4)
pub mod penalty;

use crate::codec::bch;
use crate::error::QrError;
use crate::models::{Bitmap, EcLevel, Mask, Module, Version};

/// Alignment pattern center coordinates for a version; empty for v1.
/// First center is 6, last is `size - 7`, interior spacing follows the
/// published even-interval rule.
pub fn alignment_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let size = version.size();
    let count = v / 7 + 2;
    let first = 6usize;
    let last = size - 7;
    let intervals = count - 1;
    let distance = last - first;
    let mut step = distance / intervals;
    if step % 2 == 1 {
        step += 1;
    } else if 2 * (distance % intervals) >= intervals {
        step += 2;
    }
    let mut positions = vec![0usize; count];
    positions[0] = first;
    for i in 1..count {
        positions[count - i] = last - (i - 1) * step;
    }
    positions
}

/// Cell of format-field copy A (around the top-left finder) for bit `i`,
/// least significant bit first.
fn format_position_a(i: usize) -> (i32, i32) {
    match i {
        0..=5 => (8, i as i32),
        6 => (8, 7),
        7 => (8, 8),
        8 => (7, 8),
        _ => (14 - i as i32, 8),
    }
}

/// Cell of format-field copy B (split between the top-right and
/// bottom-left finders) for bit `i`.
fn format_position_b(i: usize, size: usize) -> (i32, i32) {
    let size = size as i32;
    if i < 8 {
        (size - 1 - i as i32, 8)
    } else {
        (8, size - 15 + i as i32)
    }
}

/// The two cells holding bit `i` of the version field (bottom-left and
/// top-right copies).
fn version_positions(i: usize, size: usize) -> [(i32, i32); 2] {
    let a = (size - 11 + i % 3) as i32;
    let b = (i / 3) as i32;
    [(b, a), (a, b)]
}

/// Read format copy A from a fully drawn matrix.
pub(crate) fn read_format_a(matrix: &Bitmap) -> u16 {
    let mut bits = 0u16;
    for i in 0..15 {
        let (x, y) = format_position_a(i);
        bits |= (matrix.dark(x as usize, y as usize) as u16) << i;
    }
    bits
}

/// Read format copy B from a fully drawn matrix.
pub(crate) fn read_format_b(matrix: &Bitmap) -> u16 {
    let mut bits = 0u16;
    for i in 0..15 {
        let (x, y) = format_position_b(i, matrix.width());
        bits |= (matrix.dark(x as usize, y as usize) as u16) << i;
    }
    bits
}

/// Read both version copies from a fully drawn matrix.
pub(crate) fn read_version_copies(matrix: &Bitmap) -> (u32, u32) {
    let size = matrix.width();
    let (mut bl, mut tr) = (0u32, 0u32);
    for i in 0..18 {
        let [(bx, by), (tx, ty)] = version_positions(i, size);
        bl |= (matrix.dark(bx as usize, by as usize) as u32) << i;
        tr |= (matrix.dark(tx as usize, ty as usize) as u32) << i;
    }
    (bl, tr)
}

fn stamp_finder(m: &mut Bitmap, x: usize, y: usize) -> Result<(), QrError> {
    // Light separator ring first, clamped at the symbol edge.
    let sx = x.saturating_sub(1);
    let sy = y.saturating_sub(1);
    m.fill_rect(sx as i32, sy as i32, x + 8 - sx, y + 8 - sy, Module::Light)?;
    // Dark ring, light ring, dark core.
    m.fill_rect(x as i32, y as i32, 7, 7, Module::Dark)?;
    m.fill_rect(x as i32 + 1, y as i32 + 1, 5, 5, Module::Light)?;
    m.fill_rect(x as i32 + 2, y as i32 + 2, 3, 3, Module::Dark)?;
    Ok(())
}

fn stamp_alignment(m: &mut Bitmap, cx: usize, cy: usize) -> Result<(), QrError> {
    let (cx, cy) = (cx as i32, cy as i32);
    m.fill_rect(cx - 2, cy - 2, 5, 5, Module::Dark)?;
    m.fill_rect(cx - 1, cy - 1, 3, 3, Module::Light)?;
    m.set(cx, cy, Module::Dark)
}

/// Build the function-pattern template for `(version, ecc, mask)`.
///
/// Every structural module comes out defined and every data position stays
/// `Unset`. In `test_mode` the format/version bits and the dark module are
/// written light, reserving their cells without committing values; mask
/// penalty trials run on such templates.
pub fn template(
    version: Version,
    ecc: EcLevel,
    mask: Mask,
    test_mode: bool,
) -> Result<Bitmap, QrError> {
    let size = version.size();
    let mut m = Bitmap::square(size);

    stamp_finder(&mut m, 0, 0)?;
    stamp_finder(&mut m, size - 7, 0)?;
    stamp_finder(&mut m, 0, size - 7)?;

    let positions = alignment_positions(version);
    for &cy in &positions {
        for &cx in &positions {
            // Centers inside finder corners are already drawn; skip them.
            if m.get(cx as i32, cy as i32)?.is_set() {
                continue;
            }
            stamp_alignment(&mut m, cx, cy)?;
        }
    }

    for i in 0..size {
        let (x, y) = (i as i32, 6i32);
        if !m.is_defined(x, y)? {
            m.set(x, y, Module::from_dark(i % 2 == 0))?;
        }
        if !m.is_defined(y, x)? {
            m.set(y, x, Module::from_dark(i % 2 == 0))?;
        }
    }

    let format = bch::format_bits(ecc, mask);
    for i in 0..15 {
        let bit = !test_mode && (format >> i) & 1 == 1;
        let (ax, ay) = format_position_a(i);
        m.set(ax, ay, Module::from_dark(bit))?;
        let (bx, by) = format_position_b(i, size);
        m.set(bx, by, Module::from_dark(bit))?;
    }
    m.set(8, (size - 8) as i32, Module::from_dark(!test_mode))?;

    if version.number() >= 7 {
        let bits = bch::version_bits(version);
        for i in 0..18 {
            let bit = !test_mode && (bits >> i) & 1 == 1;
            for (x, y) in version_positions(i, size) {
                m.set(x, y, Module::from_dark(bit))?;
            }
        }
    }

    Ok(m)
}

/// Data-cell visit order: two-column sweeps from the right edge leftward,
/// skipping the vertical timing column, alternating up and down. Cells
/// already defined in the template are skipped.
pub fn data_path(template: &Bitmap) -> Vec<(usize, usize)> {
    let size = template.width();
    let mut path = Vec::new();
    let mut right = size as i32 - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = ((right + 1) & 2) == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for j in 0..2 {
                let x = (right - j) as usize;
                if !template.defined_at(x, y) {
                    path.push((x, y));
                }
            }
        }
        right -= 2;
    }
    path
}

/// Place codeword bits (MSB first) along the data path, XORing each with
/// the mask predicate. Path cells past the stream carry masked zero bits.
pub fn place_data(
    template: &mut Bitmap,
    mask: Mask,
    codewords: &[u8],
) -> Result<(), QrError> {
    let path = data_path(template);
    let total_bits = codewords.len() * 8;
    for (idx, (x, y)) in path.into_iter().enumerate() {
        let bit = if idx < total_bits {
            (codewords[idx / 8] >> (7 - idx % 8)) & 1 == 1
        } else {
            false
        };
        let dark = bit ^ mask.is_masked(x, y);
        template.set(x as i32, y as i32, Module::from_dark(dark))?;
    }
    Ok(())
}

/// Read `num_codewords` bytes back off the data path of a drawn matrix,
/// undoing the mask.
pub fn read_data(
    matrix: &Bitmap,
    template: &Bitmap,
    mask: Mask,
    num_codewords: usize,
) -> Result<Vec<u8>, QrError> {
    let path = data_path(template);
    let total_bits = num_codewords * 8;
    if path.len() < total_bits {
        return Err(QrError::LayoutMismatch);
    }
    let mut out = vec![0u8; num_codewords];
    for (idx, (x, y)) in path.into_iter().take(total_bits).enumerate() {
        let bit = matrix.dark(x, y) ^ mask.is_masked(x, y);
        if bit {
            out[idx / 8] |= 1 << (7 - idx % 8);
        }
    }
    Ok(out)
}
