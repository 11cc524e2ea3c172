//! Pixel-buffer to luminance conversion.

use crate::error::QrError;

/// Convert an RGB or RGBA buffer to one luma byte per pixel using the
/// integer weighting `(R + 2G + B) / 4`. The channel count is inferred
/// from the buffer length; anything else is rejected.
pub fn luminance(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, QrError> {
    let pixels = width * height;
    let channels = if data.len() == pixels * 3 {
        3
    } else if data.len() == pixels * 4 {
        4
    } else {
        return Err(QrError::UnknownPixelFormat);
    };

    let mut gray = Vec::with_capacity(pixels);
    for px in data.chunks_exact(channels) {
        let (r, g, b) = (px[0] as u16, px[1] as u16, px[2] as u16);
        gray.push(((r + 2 * g + b) / 4) as u8);
    }
    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_weighting() {
        let data = [255, 255, 255, 0, 0, 0, 100, 200, 40];
        let gray = luminance(&data, 3, 1).unwrap();
        assert_eq!(gray, vec![255, 0, ((100u32 + 400 + 40) / 4) as u8]);
    }

    #[test]
    fn test_rgba_accepted() {
        let data = [10, 20, 30, 255, 40, 50, 60, 0];
        let gray = luminance(&data, 2, 1).unwrap();
        assert_eq!(gray.len(), 2);
        assert_eq!(gray[0], (10 + 40 + 30) / 4);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let data = [0u8; 10];
        assert_eq!(luminance(&data, 2, 1), Err(QrError::UnknownPixelFormat));
    }
}
