// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterized and placed glyph records.

#![allow(
    unsafe_code,
    reason = "The `bytemuck` derives expand to `unsafe impl` of its marker traits."
)]

use alloc::vec::Vec;
use bytemuck::{Pod, Zeroable};

/// Pixels produced by a [`GlyphRasterizer`](crate::GlyphRasterizer).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RasterizedGlyph {
    /// Width of the bitmap in pixels.
    pub width: u32,
    /// Height of the bitmap in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, row-major, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Horizontal offset from the pen position to the left edge of the bitmap.
    pub origin_offset_x: i32,
    /// Vertical offset from the baseline to the top edge of the bitmap.
    pub origin_offset_y: i32,
}

impl RasterizedGlyph {
    /// Creates a glyph from RGBA8 pixels.
    ///
    /// `pixels` must hold exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "pixel buffer does not match glyph dimensions"
        );
        Self {
            width,
            height,
            pixels,
            origin_offset_x: 0,
            origin_offset_y: 0,
        }
    }

    /// A glyph without any pixels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the origin offset.
    pub fn with_origin_offset(mut self, x: i32, y: i32) -> Self {
        self.origin_offset_x = x;
        self.origin_offset_y = y;
        self
    }

    /// Returns true if the glyph covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A glyph that has been placed on an atlas page.
///
/// The layout matches what a shader reads from a glyph storage buffer, see
/// [`AtlasPage::glyph_data`](crate::AtlasPage::glyph_data). An all-zero record
/// describes the reserved empty glyph at slot zero of page zero, so zeroed draw
/// data draws nothing.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PlacedGlyph {
    /// Index of the page holding the glyph.
    pub page_index: u32,
    /// Position of the glyph in its page's placement order.
    pub glyph_index: u32,
    /// X position in the page texture (pixels).
    pub x: u32,
    /// Y position in the page texture (pixels).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Horizontal offset from the pen position to the left edge.
    pub origin_offset_x: i32,
    /// Vertical offset from the baseline to the top edge.
    pub origin_offset_y: i32,
}

impl PlacedGlyph {
    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}
