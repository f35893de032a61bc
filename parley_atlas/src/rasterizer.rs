// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Color, RasterizedGlyph};

/// Turns character sequences into glyph bitmaps.
///
/// Font selection, size and shaping are the rasterizer's own business; the atlas
/// only needs a stable identity so glyphs from different rasterizers never
/// collide and warm-up runs once per rasterizer.
pub trait GlyphRasterizer {
    /// Stable identity of this rasterizer.
    ///
    /// Two rasterizers with the same id must produce identical output for the same
    /// input.
    fn id(&self) -> u32;

    /// Rasterizes `chars` styled by the masked `metadata`.
    ///
    /// `colors` is the current foreground color table; the foreground index in
    /// `metadata` refers into it.
    fn rasterize(&self, chars: &str, metadata: u32, colors: &[Color]) -> RasterizedGlyph;
}
