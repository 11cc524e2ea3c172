//! qrcodec - QR Code encoder and image decoder
//!
//! A pure Rust codec for ISO/IEC 18004 model-2 symbols, versions 1-40,
//! all four error-correction levels. The encoder turns text into a module
//! matrix (with ASCII, terminal, SVG, GIF, and raw-image renderers); the
//! decoder recovers text from raw RGB/RGBA pixel buffers through adaptive
//! binarization, finder/alignment detection, and perspective
//! rectification.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Shared symbol-level coding (GF(256), Reed-Solomon, blocks, BCH)
pub mod codec;
/// Symbol decoding (format/version recovery, segment parsing)
pub mod decoder;
/// Detection in binarized images (finder, alignment, perspective)
pub mod detector;
/// Symbol encoding (segments, version/mask selection)
pub mod encoder;
/// Layout engine (templates, zig-zag walk, penalty)
pub mod layout;
/// Core data structures (Bitmap, Point, metadata types)
pub mod models;
/// Output renderers for drawn matrices
pub mod render;
/// Grayscale conversion and binarization
pub mod utils;

mod debug;
mod error;

pub use encoder::EncodeOptions;
pub use error::QrError;
pub use models::{Bitmap, Decoded, EcLevel, Mask, Module, Point, Segment, SegmentMode, Version};

use detector::finder::{FinderDetector, PatternHit};
use detector::transform::{self, PerspectiveTransform};

/// A borrowed pixel buffer, 3 (RGB) or 4 (RGBA) bytes per pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelImage<'a> {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Flat row-major pixel data.
    pub data: &'a [u8],
}

/// The located pattern centers handed to the `on_detect` callback.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    /// Top-left finder center.
    pub top_left: PatternHit,
    /// Top-right finder center.
    pub top_right: PatternHit,
    /// Bottom-left finder center.
    pub bottom_left: PatternHit,
    /// Bottom-right corner: the alignment center when one was found,
    /// otherwise the parallelogram estimate.
    pub bottom_right: Point,
}

/// Decoder options and stage observers. Each callback receives its
/// snapshot as soon as the stage completes; a later failure does not
/// revoke earlier callbacks.
#[derive(Default)]
pub struct DecodeOptions<'a> {
    /// Center-crop the larger dimension before decoding.
    pub crop_to_square: bool,
    /// Observes the binarized image.
    pub on_bitmap: Option<&'a mut dyn FnMut(&Bitmap)>,
    /// Observes the located pattern centers.
    pub on_detect: Option<&'a mut dyn FnMut(&Detection)>,
    /// Observes the rectified module matrix.
    pub on_result: Option<&'a mut dyn FnMut(&Bitmap)>,
}

/// Encode `text` into a module matrix with the quiet zone and pixel
/// scale applied. This is the `raw` output kind; the other kinds are the
/// `encode_*` helpers below.
pub fn encode(text: &str, opts: &EncodeOptions) -> Result<Bitmap, QrError> {
    encoder::encode_symbol(text, opts)
}

/// Encode to a 2-D darkness array.
pub fn encode_raw(text: &str, opts: &EncodeOptions) -> Result<Vec<Vec<bool>>, QrError> {
    Ok(encode(text, opts)?.to_raw())
}

/// Encode to a Unicode half-block string.
pub fn encode_ascii(text: &str, opts: &EncodeOptions) -> Result<String, QrError> {
    Ok(encode(text, opts)?.to_ascii())
}

/// Encode to an ANSI background-color string.
pub fn encode_term(text: &str, opts: &EncodeOptions) -> Result<String, QrError> {
    Ok(encode(text, opts)?.to_term())
}

/// Encode to an SVG document.
pub fn encode_svg(text: &str, opts: &EncodeOptions) -> Result<String, QrError> {
    Ok(encode(text, opts)?.to_svg(opts.svg_optimize))
}

/// Encode to an uncompressed GIF87a byte vector.
pub fn encode_gif(text: &str, opts: &EncodeOptions) -> Result<Vec<u8>, QrError> {
    Ok(encode(text, opts)?.to_gif())
}

/// Decode the first symbol in a pixel buffer to text.
pub fn decode(image: &PixelImage<'_>, opts: &mut DecodeOptions<'_>) -> Result<String, QrError> {
    decode_full(image, opts).map(|d| d.text)
}

/// Decode to text plus the recovered version, ECC level, and mask.
pub fn decode_full(
    image: &PixelImage<'_>,
    opts: &mut DecodeOptions<'_>,
) -> Result<Decoded, QrError> {
    let (gray, width, height) = prepare_luma(image, opts.crop_to_square)?;
    let binary = utils::binarization::binarize(&gray, width, height)?;
    if let Some(cb) = opts.on_bitmap.as_mut() {
        cb(&binary);
    }

    // The adaptive row schedule first; the exhaustive parallel sweep as a
    // fallback when the skip heuristics come up short.
    let [tl, tr, bl] = FinderDetector::detect(&binary)
        .or_else(|_| FinderDetector::detect_parallel(&binary))?;
    let module_size = (tl.module_size + tr.module_size + bl.module_size) / 3.0;

    let version = estimate_version(&tl, &tr, &bl, module_size)?;
    let size = version.size();

    // Parallelogram estimate of the fourth corner, corrected toward the
    // alignment center sitting three modules inside it.
    let parallelogram = Point::new(tr.x + bl.x - tl.x, tr.y + bl.y - tl.y);
    let mut bottom_right = parallelogram;
    let mut br_grid = size as f32 - 3.5;
    if version.number() >= 2 {
        let c = 1.0 - 3.0 / (size as f32 - 7.0);
        let estimate = Point::new(
            tl.x + c * (parallelogram.x - tl.x),
            tl.y + c * (parallelogram.y - tl.y),
        );
        if let Some(hit) = detector::alignment::find(&binary, estimate, module_size) {
            bottom_right = hit.center();
            br_grid = size as f32 - 6.5;
        }
    }

    if let Some(cb) = opts.on_detect.as_mut() {
        cb(&Detection {
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right,
        });
    }

    let grid_quad = [
        Point::new(3.5, 3.5),
        Point::new(size as f32 - 3.5, 3.5),
        Point::new(br_grid, br_grid),
        Point::new(3.5, size as f32 - 3.5),
    ];
    let image_quad = [tl.center(), tr.center(), bottom_right, bl.center()];
    let grid_to_image = PerspectiveTransform::quadrilateral_to_quadrilateral(grid_quad, image_quad);
    let modules = transform::sample_grid(&binary, &grid_to_image, size);
    if let Some(cb) = opts.on_result.as_mut() {
        cb(&modules);
    }

    decoder::qr_decoder::decode_matrix(&modules)
}

/// Luma conversion plus the optional center crop to a square.
fn prepare_luma(
    image: &PixelImage<'_>,
    crop_to_square: bool,
) -> Result<(Vec<u8>, usize, usize), QrError> {
    let gray = utils::grayscale::luminance(image.data, image.width, image.height)?;
    let (w, h) = (image.width, image.height);
    if !crop_to_square || w == h {
        return Ok((gray, w, h));
    }

    let side = w.min(h);
    let x0 = (w - side) / 2;
    let y0 = (h - side) / 2;
    let mut cropped = Vec::with_capacity(side * side);
    for y in y0..y0 + side {
        cropped.extend_from_slice(&gray[y * w + x0..y * w + x0 + side]);
    }
    Ok((cropped, side, side))
}

/// Version guess from finder geometry: average the two edge lengths in
/// modules and snap to the nearest valid symbol size.
fn estimate_version(
    tl: &PatternHit,
    tr: &PatternHit,
    bl: &PatternHit,
    module_size: f32,
) -> Result<Version, QrError> {
    if module_size < 1.0 {
        return Err(QrError::FinderNotFound);
    }
    let d_top = (tr.center() - tl.center()).length();
    let d_left = (bl.center() - tl.center()).length();
    let dimension = (d_top + d_left) / (2.0 * module_size) + 7.0;
    let number = ((dimension - 17.0) / 4.0).round() as i32;
    Version::new(number.clamp(1, 40) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(text: &str, scale: usize, border: usize) -> (Vec<u8>, usize, usize) {
        let opts = EncodeOptions { scale, border, ..EncodeOptions::default() };
        let matrix = encode(text, &opts).unwrap();
        (matrix.to_image(), matrix.width(), matrix.height())
    }

    #[test]
    fn test_end_to_end_roundtrip() {
        let (data, width, height) = rendered("hello from the image pipeline", 4, 4);
        let image = PixelImage { width, height, data: &data };
        let text = decode(&image, &mut DecodeOptions::default()).unwrap();
        assert_eq!(text, "hello from the image pipeline");
    }

    #[test]
    fn test_callbacks_fire_in_order() {
        let (data, width, height) = rendered("CALLBACKS", 4, 4);
        let image = PixelImage { width, height, data: &data };

        let mut saw_bitmap = false;
        let mut saw_detect = false;
        let mut saw_result = false;
        let mut on_bitmap = |m: &Bitmap| {
            saw_bitmap = m.width() == width;
        };
        let mut on_detect = |d: &Detection| {
            saw_detect = d.top_left.x < d.top_right.x;
        };
        let mut on_result = |m: &Bitmap| {
            saw_result = m.width() == 21;
        };
        let mut opts = DecodeOptions {
            crop_to_square: false,
            on_bitmap: Some(&mut on_bitmap),
            on_detect: Some(&mut on_detect),
            on_result: Some(&mut on_result),
        };
        let text = decode(&image, &mut opts).unwrap();
        drop(opts);
        assert_eq!(text, "CALLBACKS");
        assert!(saw_bitmap);
        assert!(saw_detect);
        assert!(saw_result);
    }

    #[test]
    fn test_crop_to_square() {
        let (data, width, height) = rendered("CROPPED", 4, 4);
        // Pad the image asymmetrically to a wide canvas, symbol centered.
        let wide = width + 60;
        let mut padded = vec![255u8; wide * height * 3];
        for y in 0..height {
            let src = &data[y * width * 3..(y + 1) * width * 3];
            let dst = (y * wide + 30) * 3;
            padded[dst..dst + width * 3].copy_from_slice(src);
        }
        let image = PixelImage { width: wide, height, data: &padded };
        let mut opts = DecodeOptions { crop_to_square: true, ..DecodeOptions::default() };
        assert_eq!(decode(&image, &mut opts).unwrap(), "CROPPED");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let data = vec![0u8; 100];
        let image = PixelImage { width: 7, height: 7, data: &data };
        assert_eq!(
            decode(&image, &mut DecodeOptions::default()),
            Err(QrError::UnknownPixelFormat)
        );

        let data = vec![255u8; 30 * 30 * 3];
        let image = PixelImage { width: 30, height: 30, data: &data };
        assert_eq!(
            decode(&image, &mut DecodeOptions::default()),
            Err(QrError::ImageTooSmall)
        );

        let data = vec![255u8; 100 * 100 * 3];
        let image = PixelImage { width: 100, height: 100, data: &data };
        assert_eq!(
            decode(&image, &mut DecodeOptions::default()),
            Err(QrError::FinderNotFound)
        );
    }
}
