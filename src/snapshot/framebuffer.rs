//! In-memory RGB canvas used to synthesize page screenshots.
//!
//! The mock browser paints each page state onto a [`MockFramebuffer`] and
//! encodes it as PNG, so recorder tests get real image bytes whose content
//! changes when an interaction changes the page.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use super::types::{SnapshotError, SnapshotResult};

/// Width and height of one glyph in pixels
pub const GLYPH_SIZE: u32 = 8;

/// Page canvas backed by an [`RgbImage`]. Every drawing call clips to the
/// canvas bounds, so callers can lay out rows without bounds checks.
#[derive(Debug, Clone)]
pub struct MockFramebuffer {
    image: RgbImage,
}

impl MockFramebuffer {
    /// Black canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Decode a PNG (or any format `image` recognizes) into a canvas
    pub fn from_png_bytes(data: &[u8]) -> SnapshotResult<Self> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| SnapshotError::Capture(format!("cannot decode screenshot: {}", e)))?;
        Ok(Self {
            image: decoded.to_rgb8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Filled rectangle with its top-left corner at (x, y)
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        let right = x.saturating_add(w).min(self.width());
        let bottom = y.saturating_add(h).min(self.height());
        for py in y..bottom {
            for px in x..right {
                self.image.put_pixel(px, py, Rgb(color));
            }
        }
    }

    /// One-pixel border; used for the focus ring
    pub fn draw_outline(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        if w == 0 || h == 0 {
            return;
        }
        let (x2, y2) = (x.saturating_add(w - 1), y.saturating_add(h - 1));
        self.draw_rect(x, y, w, 1, color);
        self.draw_rect(x, y2, w, 1, color);
        self.draw_rect(x, y, 1, h, color);
        self.draw_rect(x2, y, 1, h, color);
    }

    /// Single line of 8x8 text; characters past the right edge are dropped
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let columns = text
            .chars()
            .zip((x..self.width()).step_by(GLYPH_SIZE as usize));
        for (ch, left) in columns {
            let glyph = BASIC_FONTS.get(ch).unwrap_or_default();
            for (dy, bits) in (0..GLYPH_SIZE).zip(glyph) {
                for dx in 0..GLYPH_SIZE {
                    // bit 0 is the leftmost column
                    let color = if bits & (1 << dx) != 0 { fg } else { bg };
                    self.set_pixel(left + dx, y + dy, color);
                }
            }
        }
    }

    /// Pixel color; reads outside the canvas return black
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image
            .get_pixel_checked(x, y)
            .map_or([0, 0, 0], |p| p.0)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            *pixel = Rgb(color);
        }
    }

    pub fn to_png(&self) -> SnapshotResult<Vec<u8>> {
        let mut png = Cursor::new(Vec::new());
        self.image.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];

    #[test]
    fn test_rect_clips_at_edges() {
        let mut fb = MockFramebuffer::new(20, 10);
        fb.draw_rect(15, 5, 100, 100, RED);
        assert_eq!(fb.get_pixel(14, 5), [0, 0, 0]);
        assert_eq!(fb.get_pixel(19, 9), RED);
        assert_eq!(fb.get_pixel(40, 40), [0, 0, 0]);
    }

    #[test]
    fn test_focus_ring_outline() {
        let mut fb = MockFramebuffer::with_color(30, 30, [240, 240, 240]);
        fb.draw_outline(4, 4, 12, 8, [0, 120, 255]);
        assert_eq!(fb.get_pixel(4, 4), [0, 120, 255]);
        assert_eq!(fb.get_pixel(15, 11), [0, 120, 255]);
        assert_eq!(fb.get_pixel(9, 8), [240, 240, 240]);
    }

    #[test]
    fn test_label_text_uses_both_colors() {
        let mut fb = MockFramebuffer::new(64, 8);
        fb.draw_text(0, 0, "Go", [255, 255, 255], [0, 0, 90]);

        let glyph_pixels: Vec<[u8; 3]> = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .map(|(x, y)| fb.get_pixel(x, y))
            .collect();
        assert!(glyph_pixels.contains(&[255, 255, 255]));
        assert!(glyph_pixels.contains(&[0, 0, 90]));
        // nothing drawn past the two glyphs
        assert_eq!(fb.get_pixel(20, 3), [0, 0, 0]);
    }

    #[test]
    fn test_png_encoding_keeps_pixels() {
        let mut fb = MockFramebuffer::with_color(24, 16, [10, 20, 30]);
        fb.set_pixel(3, 4, RED);

        let png = fb.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = MockFramebuffer::from_png_bytes(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));
        assert_eq!(decoded.get_pixel(3, 4), RED);
        assert_eq!(decoded.get_pixel(0, 0), [10, 20, 30]);
    }

    #[test]
    fn test_garbage_is_not_an_image() {
        assert!(MockFramebuffer::from_png_bytes(b"not a png").is_err());
    }
}
