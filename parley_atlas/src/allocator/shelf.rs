// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf allocator backed by `etagere`.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use etagere::{AtlasAllocator, Rectangle, Size};
use peniko::color::palette::css;

use super::{GlyphAllocator, percent};
use crate::UsagePreview;

/// Packs glyphs onto horizontal shelves.
///
/// Wastes less space than [`SlabAllocator`](super::SlabAllocator) when glyph sizes
/// vary a lot, at the cost of a search over shelves on every placement.
pub struct ShelfAllocator {
    page_size: u32,
    allocator: AtlasAllocator,
    glyphs: Vec<(u32, u32, u32, u32)>,
    used_pixels: u64,
    /// Area of the rectangles handed out by `etagere`, which can be taller than
    /// the glyph when it lands on a higher shelf.
    allocated_pixels: u64,
}

impl ShelfAllocator {
    /// Creates an allocator for a `page_size` × `page_size` page.
    pub fn new(page_size: u32) -> Self {
        let side = to_i32(page_size);
        Self {
            page_size,
            allocator: AtlasAllocator::new(Size::new(side, side)),
            glyphs: Vec::new(),
            used_pixels: 0,
            allocated_pixels: 0,
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn area(rectangle: &Rectangle) -> u64 {
    let size = rectangle.size();
    u64::try_from(size.width).unwrap_or(0) * u64::try_from(size.height).unwrap_or(0)
}

impl GlyphAllocator for ShelfAllocator {
    fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 {
            return Some((0, 0));
        }
        if width > self.page_size || height > self.page_size {
            return None;
        }
        let allocation = self
            .allocator
            .allocate(Size::new(to_i32(width), to_i32(height)))?;
        let x = u32::try_from(allocation.rectangle.min.x).ok()?;
        let y = u32::try_from(allocation.rectangle.min.y).ok()?;
        self.glyphs.push((x, y, width, height));
        self.used_pixels += u64::from(width) * u64::from(height);
        self.allocated_pixels += area(&allocation.rectangle);
        Some((x, y))
    }

    fn usage_preview(&self) -> UsagePreview {
        let mut preview = UsagePreview::new(self.page_size, self.page_size);
        for (i, &(x, y, width, height)) in self.glyphs.iter().enumerate() {
            let color = if i % 2 == 0 { css::LIME } else { css::GREEN };
            preview.fill_rect(x, y, width, height, color);
        }
        preview
    }

    fn stats(&self) -> String {
        let page_pixels = u64::from(self.page_size) * u64::from(self.page_size);
        let allocated = self.allocated_pixels.max(self.used_pixels);
        let wasted = allocated - self.used_pixels;
        format!(
            "page size: {page}x{page}\n\
             allocator: shelf\n\
             glyphs: {glyphs}\n\
             used: {used} px ({used_percent:.2}%)\n\
             wasted: {wasted} px ({wasted_percent:.2}% of allocated)",
            page = self.page_size,
            glyphs = self.glyphs.len(),
            used = self.used_pixels,
            used_percent = percent(self.used_pixels, page_pixels),
            wasted_percent = percent(wasted, allocated),
        )
    }
}

impl core::fmt::Debug for ShelfAllocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShelfAllocator")
            .field("page_size", &self.page_size)
            .field("glyphs", &self.glyphs.len())
            .field("used_pixels", &self.used_pixels)
            .field("allocated_pixels", &self.allocated_pixels)
            .finish_non_exhaustive()
    }
}
