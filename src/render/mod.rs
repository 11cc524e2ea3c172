//! Output renderers for a drawn matrix.
//!
//! Undefined cells render as light everywhere; encoders always pass fully
//! drawn matrices, but the renderers stay total just in case.

use crate::models::Bitmap;

/// Terminal escape for a dark cell (black background, two columns).
const TERM_DARK: &str = "\x1b[40m  \x1b[0m";
/// Terminal escape for a light cell.
const TERM_LIGHT: &str = "\x1b[47m  \x1b[0m";

/// Pixels per GIF literal sub-block (after the clear code).
const GIF_SUB_BLOCK: usize = 126;

impl Bitmap {
    /// Plain 2-D darkness array.
    pub fn to_raw(&self) -> Vec<Vec<bool>> {
        (0..self.height())
            .map(|y| (0..self.width()).map(|x| self.dark(x, y)).collect())
            .collect()
    }

    /// Unicode half-block rendering, two matrix rows per text line.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        for y in (0..self.height()).step_by(2) {
            for x in 0..self.width() {
                let upper = self.dark(x, y);
                let lower = y + 1 < self.height() && self.dark(x, y + 1);
                out.push(match (upper, lower) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
        }
        out
    }

    /// ANSI background-color rendering, one reset per cell.
    pub fn to_term(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.push_str(if self.dark(x, y) { TERM_DARK } else { TERM_LIGHT });
            }
            out.push('\n');
        }
        out
    }

    /// SVG rendering: one unit rect per dark cell, or a single compact
    /// path when `optimize` is set.
    pub fn to_svg(&self, optimize: bool) -> String {
        let mut out = format!(
            "<svg viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\">",
            self.width(),
            self.height()
        );
        if optimize {
            out.push_str("<path d=\"");
            let mut prev: Option<(usize, usize)> = None;
            for y in 0..self.height() {
                for x in 0..self.width() {
                    if !self.dark(x, y) {
                        continue;
                    }
                    let absolute = format!("M{} {}", x, y);
                    let command = match prev {
                        Some((px, py)) => {
                            let relative = format!(
                                "m{} {}",
                                x as isize - px as isize,
                                y as isize - py as isize
                            );
                            if relative.len() < absolute.len() {
                                relative
                            } else {
                                absolute
                            }
                        }
                        None => absolute,
                    };
                    out.push_str(&command);
                    if x >= 10 {
                        out.push_str("h1v1h-1Z");
                    } else {
                        out.push_str(&format!("h1v1H{}Z", x));
                    }
                    prev = Some((x, y));
                }
            }
            out.push_str("\"/>");
        } else {
            for y in 0..self.height() {
                for x in 0..self.width() {
                    if self.dark(x, y) {
                        out.push_str(&format!(
                            "<rect x=\"{}\" y=\"{}\" width=\"1\" height=\"1\"/>",
                            x, y
                        ));
                    }
                }
            }
        }
        out.push_str("</svg>");
        out
    }

    /// Uncompressed GIF87a, one pixel per module. The "LZW" stream is the
    /// fixed-table trick: every sub-block re-emits the clear code and then
    /// literal 8-bit pixel codes, so no dictionary ever builds up.
    pub fn to_gif(&self) -> Vec<u8> {
        let (w, h) = (self.width() as u16, self.height() as u16);
        let mut out = Vec::new();
        out.extend_from_slice(b"GIF87a");
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        // Global color table flag, 8-bit color resolution, 128 entries.
        out.push(0xF6);
        out.push(0x00); // background color index
        out.push(0x00); // aspect ratio
        out.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // entry 0: white
        out.extend(std::iter::repeat(0x00).take(127 * 3)); // the rest: black

        // Image descriptor at the origin, no local table.
        out.push(0x2C);
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        out.push(0x00);

        out.push(0x07); // minimum LZW code size

        let pixels: Vec<u8> = (0..self.height())
            .flat_map(|y| (0..self.width()).map(move |x| self.dark(x, y) as u8))
            .collect();
        for chunk in pixels.chunks(GIF_SUB_BLOCK) {
            out.push(chunk.len() as u8 + 1);
            out.push(0x80); // clear code
            out.extend_from_slice(chunk);
        }
        out.push(0x01);
        out.push(0x81); // end of information
        out.push(0x00); // block terminator
        out.push(0x3B); // trailer
        out
    }

    /// Gray RGB buffer: dark = 0, light = 255.
    pub fn to_image(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width() * self.height() * 3);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let v = if self.dark(x, y) { 0 } else { 255 };
                out.extend_from_slice(&[v, v, v]);
            }
        }
        out
    }

    /// Gray RGBA buffer: dark = 0, light = 255, alpha 255.
    pub fn to_image_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width() * self.height() * 4);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let v = if self.dark(x, y) { 0 } else { 255 };
                out.extend_from_slice(&[v, v, v, 255]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Bitmap, Module};

    fn checker(size: usize) -> Bitmap {
        let mut m = Bitmap::square(size);
        for y in 0..size {
            for x in 0..size {
                m.set(x as i32, y as i32, Module::from_dark((x + y) % 2 == 0))
                    .unwrap();
            }
        }
        m
    }

    #[test]
    fn test_ascii_shape() {
        let m = checker(4);
        let text = m.to_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), 4);
        // Checkerboard columns alternate half blocks.
        assert_eq!(lines[0].chars().next().unwrap(), '▀');
        assert_eq!(lines[0].chars().nth(1).unwrap(), '▄');
    }

    #[test]
    fn test_ascii_odd_height() {
        let mut m = Bitmap::new(2, 3);
        m.fill_rect(0, 0, 2, 3, Module::Dark).unwrap();
        let lines: Vec<String> = m.to_ascii().lines().map(String::from).collect();
        assert_eq!(lines.len(), 2);
        // The dangling last row pairs with light.
        assert_eq!(lines[1], "▀▀");
    }

    #[test]
    fn test_term_resets_every_cell() {
        let m = checker(2);
        let text = m.to_term();
        assert_eq!(text.matches("\x1b[0m").count(), 4);
        assert!(text.contains("\x1b[40m"));
        assert!(text.contains("\x1b[47m"));
    }

    #[test]
    fn test_svg_rects() {
        let mut m = Bitmap::square(3);
        m.fill_rect(0, 0, 3, 3, Module::Light).unwrap();
        m.set(1, 2, Module::Dark).unwrap();
        let svg = m.to_svg(false);
        assert!(svg.starts_with("<svg viewBox=\"0 0 3 3\""));
        assert!(svg.contains("<rect x=\"1\" y=\"2\" width=\"1\" height=\"1\"/>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_svg_path_commands() {
        let mut m = Bitmap::square(12);
        m.fill_rect(0, 0, 12, 12, Module::Light).unwrap();
        m.set(0, 0, Module::Dark).unwrap();
        m.set(11, 0, Module::Dark).unwrap();
        let svg = m.to_svg(true);
        assert!(svg.contains("<path d=\""));
        // First cell is absolute with an H close; the far cell at x >= 10
        // uses the relative close.
        assert!(svg.contains("M0 0h1v1H0Z"));
        assert!(svg.contains("h1v1h-1Z"));
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_gif_header_and_size() {
        let m = checker(21);
        let gif = m.to_gif();
        assert_eq!(&gif[..6], &[0x47, 0x49, 0x46, 0x38, 0x37, 0x61]);
        assert_eq!(&gif[6..10], &[21, 0, 21, 0]);
        assert_eq!(gif[10], 0xF6);
        // Palette entry 0 is white.
        assert_eq!(&gif[13..16], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(*gif.last().unwrap(), 0x3B);
        // 441 pixels split into ceil(441/126) sub-blocks.
        let descriptor = 13 + 128 * 3;
        assert_eq!(gif[descriptor], 0x2C);
        assert_eq!(gif[descriptor + 10], 0x07);
    }

    #[test]
    fn test_gif_pixel_stream() {
        let mut m = Bitmap::new(2, 2);
        m.set(0, 0, Module::Dark).unwrap();
        m.set(1, 0, Module::Light).unwrap();
        m.set(0, 1, Module::Light).unwrap();
        m.set(1, 1, Module::Dark).unwrap();
        let gif = m.to_gif();
        let data = 13 + 128 * 3 + 10 + 1;
        // One sub-block: count+1, clear, four pixels; then EOI, end, trailer.
        assert_eq!(
            &gif[data..],
            &[5, 0x80, 1, 0, 0, 1, 0x01, 0x81, 0x00, 0x3B]
        );
    }

    #[test]
    fn test_image_buffers() {
        let m = checker(2);
        let rgb = m.to_image();
        assert_eq!(rgb.len(), 12);
        assert_eq!(&rgb[..6], &[0, 0, 0, 255, 255, 255]);
        let rgba = m.to_image_rgba();
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[..8], &[0, 0, 0, 255, 255, 255, 255, 255]);
    }
}
