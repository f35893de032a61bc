// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug visualisation of page usage.

use alloc::vec;
use alloc::vec::Vec;

use crate::Color;

/// An RGBA8 image visualising how a page's space is used.
///
/// Produced by [`TexturePage::usage_preview`](crate::TexturePage::usage_preview)
/// for debugging; it is never consulted when placing glyphs.
#[derive(Clone, PartialEq, Eq)]
pub struct UsagePreview {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl UsagePreview {
    /// Creates a fully transparent preview.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The pixel at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Fills a rectangle, clipped to the image.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        let rgba = color.to_rgba8();
        let rgba = [rgba.r, rgba.g, rgba.b, rgba.a];
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let stride = self.width as usize * 4;
        for row in y..y_end {
            let start = row as usize * stride + x as usize * 4;
            let end = row as usize * stride + x_end as usize * 4;
            if start >= end {
                continue;
            }
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Encodes the preview as a PNG image.
    #[cfg(feature = "png")]
    pub fn encode_png(&self) -> Result<Vec<u8>, png::EncodingError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }

    /// Writes the preview to a PNG file, creating parent directories as needed.
    #[cfg(feature = "png")]
    pub fn write_png(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = self.encode_png().map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }
}

impl core::fmt::Debug for UsagePreview {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UsagePreview")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::color::palette::css::RED;

    #[test]
    fn fill_is_clipped() {
        let mut preview = UsagePreview::new(4, 4);
        preview.fill_rect(2, 2, 10, 10, RED);
        assert_eq!(preview.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(preview.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(preview.pixel(4, 0), None);
    }

    #[test]
    fn fill_outside_is_noop() {
        let mut preview = UsagePreview::new(2, 2);
        preview.fill_rect(5, 0, 1, 1, RED);
        assert!(preview.pixels().iter().all(|b| *b == 0), "nothing was drawn");
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_signature() {
        let png = UsagePreview::new(3, 2).encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
