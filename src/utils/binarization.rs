//! Adaptive local-threshold binarization.
//!
//! The image is tiled into 8x8 blocks. Each block contributes a local
//! black point (its mean, or a floor for near-uniform blocks); the final
//! per-pixel threshold averages the 5x5 neighborhood of block points.

use crate::error::QrError;
use crate::models::{Bitmap, Module};

const BLOCK: usize = 8;
/// A block whose luma range is at most this is treated as featureless.
const MIN_DYNAMIC_RANGE: u16 = 24;
/// Smallest image the scanner accepts, in pixels per side.
const MIN_IMAGE_SIDE: usize = 40;

/// Binarize a luma buffer into a fully drawn matrix (dark = true ink).
pub fn binarize(gray: &[u8], width: usize, height: usize) -> Result<Bitmap, QrError> {
    if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
        return Err(QrError::ImageTooSmall);
    }
    debug_assert_eq!(gray.len(), width * height);

    let bw = (width + BLOCK - 1) / BLOCK;
    let bh = (height + BLOCK - 1) / BLOCK;

    // First pass: one black point per block.
    let mut black_points = vec![0u16; bw * bh];
    for by in 0..bh {
        // Edge blocks are pulled inward so the 8x8 window stays in bounds.
        let y0 = (by * BLOCK).min(height - BLOCK);
        for bx in 0..bw {
            let x0 = (bx * BLOCK).min(width - BLOCK);

            let (mut sum, mut min, mut max) = (0u32, u8::MAX, u8::MIN);
            for y in y0..y0 + BLOCK {
                for &v in &gray[y * width + x0..y * width + x0 + BLOCK] {
                    sum += v as u32;
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            let mut average = (sum / (BLOCK * BLOCK) as u32) as u16;
            if (max - min) as u16 <= MIN_DYNAMIC_RANGE {
                // Featureless block: assume background, bias the point low.
                average = min as u16 / 2;
                if bx > 0 && by > 0 {
                    let top = black_points[(by - 1) * bw + bx];
                    let left = black_points[by * bw + bx - 1];
                    let top_left = black_points[(by - 1) * bw + bx - 1];
                    let neighbor = (top + 2 * left + top_left) / 4;
                    if (min as u16) < neighbor {
                        average = neighbor;
                    }
                }
            }
            black_points[by * bw + bx] = average;
        }
    }

    // Second pass: threshold each block against the smoothed neighborhood.
    let mut out = Bitmap::new(width, height);
    for by in 0..bh {
        let y0 = (by * BLOCK).min(height - BLOCK);
        let cy = by.clamp(2, bh - 3);
        for bx in 0..bw {
            let x0 = (bx * BLOCK).min(width - BLOCK);
            let cx = bx.clamp(2, bw - 3);

            let mut sum = 0u32;
            for ny in cy - 2..=cy + 2 {
                for nx in cx - 2..=cx + 2 {
                    sum += black_points[ny * bw + nx] as u32;
                }
            }
            let threshold = (sum / 25) as u8;

            for y in y0..y0 + BLOCK {
                for x in x0..x0 + BLOCK {
                    let dark = gray[y * width + x] <= threshold;
                    out.set(x as i32, y as i32, Module::from_dark(dark))?;
                }
            }
        }
    }
    Ok(out)
}
