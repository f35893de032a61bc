// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slab allocator.
//!
//! The page is divided into a grid of square slabs. Each slab serves a single
//! size class (glyph width and height rounded up to a power of two) and is split
//! into equal cells of that class. Glyphs larger than a slab take a dedicated run
//! of whole slabs. When the page is not a multiple of the slab size, the last
//! row and column of the grid are narrower slabs.
//!
//! Rounding to size classes wastes some space, but glyphs of similar size end up
//! next to each other and placing one is a constant-time lookup in the common
//! case.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use peniko::color::palette::css;

use super::{GlyphAllocator, percent};
use crate::UsagePreview;

/// Edge length of a slab in pixels, unless the page is smaller.
pub const DEFAULT_SLAB_SIZE: u32 = 64;

/// Packs glyphs into power-of-two size classes within fixed-size slabs.
#[derive(Debug)]
pub struct SlabAllocator {
    page_size: u32,
    slab_size: u32,
    /// Slabs per row and column of the page, counting a partial last one.
    grid: u32,
    /// Which slab cells of the grid are taken, row-major.
    occupied: Vec<bool>,
    slabs: Vec<Slab>,
    /// Slab with free cells for each size class.
    open_slabs: HashMap<(u32, u32), usize>,
    /// Placed rectangles, for previews.
    glyphs: Vec<Rect>,
    used_pixels: u64,
}

#[derive(Copy, Clone, Debug)]
struct Slab {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    cell_width: u32,
    cell_height: u32,
    next_cell: u32,
    cell_count: u32,
}

impl Slab {
    fn columns(&self) -> u32 {
        self.width / self.cell_width
    }

    fn is_full(&self) -> bool {
        self.next_cell >= self.cell_count
    }

    fn take_cell(&mut self) -> (u32, u32) {
        let columns = self.columns();
        let cell = self.next_cell;
        self.next_cell += 1;
        (
            self.x + (cell % columns) * self.cell_width,
            self.y + (cell / columns) * self.cell_height,
        )
    }
}

#[derive(Copy, Clone, Debug)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl SlabAllocator {
    /// Creates an allocator for a `page_size` × `page_size` page using
    /// [`DEFAULT_SLAB_SIZE`] slabs.
    pub fn new(page_size: u32) -> Self {
        Self::with_slab_size(page_size, DEFAULT_SLAB_SIZE)
    }

    /// Creates an allocator with a custom slab edge length.
    ///
    /// The slab size is clamped to `1..=page_size`.
    pub fn with_slab_size(page_size: u32, slab_size: u32) -> Self {
        let slab_size = slab_size.clamp(1, page_size.max(1));
        let grid = page_size.div_ceil(slab_size);
        Self {
            page_size,
            slab_size,
            grid,
            occupied: vec![false; grid as usize * grid as usize],
            slabs: Vec::new(),
            open_slabs: HashMap::new(),
            glyphs: Vec::new(),
            used_pixels: 0,
        }
    }

    /// Edge length of the slabs.
    pub fn slab_size(&self) -> u32 {
        self.slab_size
    }

    /// Number of slabs handed out so far.
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Pixel length of `count` grid cells starting at cell `start`, clipped to
    /// the page.
    fn extent(&self, start: u32, count: u32) -> u32 {
        ((start + count) * self.slab_size).min(self.page_size) - start * self.slab_size
    }

    /// Finds `columns` × `rows` free grid cells covering at least `width` ×
    /// `height` pixels, marks them taken and returns the claimed slab.
    fn claim_grid_cells(
        &mut self,
        columns: u32,
        rows: u32,
        width: u32,
        height: u32,
    ) -> Option<Slab> {
        if columns > self.grid || rows > self.grid {
            return None;
        }
        let grid = self.grid as usize;
        for gy in 0..=self.grid - rows {
            let slab_height = self.extent(gy, rows);
            if slab_height < height {
                continue;
            }
            for gx in 0..=self.grid - columns {
                let slab_width = self.extent(gx, columns);
                if slab_width < width {
                    continue;
                }
                let free = (gy..gy + rows).all(|y| {
                    (gx..gx + columns).all(|x| !self.occupied[y as usize * grid + x as usize])
                });
                if free {
                    for y in gy..gy + rows {
                        for x in gx..gx + columns {
                            self.occupied[y as usize * grid + x as usize] = true;
                        }
                    }
                    return Some(Slab {
                        x: gx * self.slab_size,
                        y: gy * self.slab_size,
                        width: slab_width,
                        height: slab_height,
                        cell_width: slab_width,
                        cell_height: slab_height,
                        next_cell: 0,
                        cell_count: 1,
                    });
                }
            }
        }
        None
    }

    fn open_slab(&mut self, cell_width: u32, cell_height: u32) -> Option<usize> {
        let slab = self.claim_grid_cells(1, 1, cell_width, cell_height)?;
        self.slabs.push(Slab {
            cell_width,
            cell_height,
            cell_count: (slab.width / cell_width) * (slab.height / cell_height),
            ..slab
        });
        Some(self.slabs.len() - 1)
    }

    /// Gives a glyph larger than a slab its own run of slabs.
    fn allocate_large(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        let columns = width.div_ceil(self.slab_size);
        let rows = height.div_ceil(self.slab_size);
        let slab = Slab {
            next_cell: 1,
            ..self.claim_grid_cells(columns, rows, width, height)?
        };
        self.slabs.push(slab);
        Some((slab.x, slab.y))
    }

    fn allocated_pixels(&self) -> u64 {
        self.slabs
            .iter()
            .map(|slab| u64::from(slab.width) * u64::from(slab.height))
            .sum()
    }
}

impl GlyphAllocator for SlabAllocator {
    fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 {
            return Some((0, 0));
        }
        if width > self.page_size || height > self.page_size {
            return None;
        }

        let class = (width.next_power_of_two(), height.next_power_of_two());
        let origin = if class.0 > self.slab_size || class.1 > self.slab_size {
            self.allocate_large(width, height)?
        } else {
            let index = match self.open_slabs.get(&class) {
                Some(&index) => index,
                None => {
                    let index = self.open_slab(class.0, class.1)?;
                    self.open_slabs.insert(class, index);
                    index
                }
            };
            let slab = &mut self.slabs[index];
            let origin = slab.take_cell();
            if slab.is_full() {
                self.open_slabs.remove(&class);
            }
            origin
        };

        self.glyphs.push(Rect {
            x: origin.0,
            y: origin.1,
            width,
            height,
        });
        self.used_pixels += u64::from(width) * u64::from(height);
        Some(origin)
    }

    fn usage_preview(&self) -> UsagePreview {
        let mut preview = UsagePreview::new(self.page_size, self.page_size);
        for slab in &self.slabs {
            preview.fill_rect(slab.x, slab.y, slab.width, slab.height, css::DIM_GRAY);
            // Cells of the slab that are handed out, including their padding.
            let columns = slab.columns();
            for cell in 0..slab.next_cell {
                preview.fill_rect(
                    slab.x + (cell % columns) * slab.cell_width,
                    slab.y + (cell / columns) * slab.cell_height,
                    slab.cell_width,
                    slab.cell_height,
                    css::ORANGE,
                );
            }
        }
        for (i, glyph) in self.glyphs.iter().enumerate() {
            let color = if i % 2 == 0 { css::LIME } else { css::GREEN };
            preview.fill_rect(glyph.x, glyph.y, glyph.width, glyph.height, color);
        }
        preview
    }

    fn stats(&self) -> String {
        let page_pixels = u64::from(self.page_size) * u64::from(self.page_size);
        let allocated = self.allocated_pixels();
        let wasted = allocated.saturating_sub(self.used_pixels);
        format!(
            "page size: {page}x{page}\n\
             allocator: slab ({slab}x{slab} slabs)\n\
             glyphs: {glyphs}\n\
             used: {used} px ({used_percent:.2}%)\n\
             wasted: {wasted} px ({wasted_percent:.2}% of allocated)\n\
             slabs: {slabs} of {total} ({open} open)",
            page = self.page_size,
            slab = self.slab_size,
            glyphs = self.glyphs.len(),
            used = self.used_pixels,
            used_percent = percent(self.used_pixels, page_pixels),
            wasted_percent = percent(wasted, allocated),
            slabs = self.slabs.len(),
            total = self.grid * self.grid,
            open = self.open_slabs.len(),
        )
    }
}

impl Default for SlabAllocator {
    fn default() -> Self {
        Self::new(crate::BASE_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_class_shares_a_slab() {
        let mut allocator = SlabAllocator::new(256);
        assert_eq!(allocator.allocate(7, 12), Some((0, 0)));
        // 7x12 rounds up to 8x16, so the next cell is 8 pixels to the right.
        assert_eq!(allocator.allocate(8, 16), Some((8, 0)));
        assert_eq!(allocator.slab_count(), 1);
    }

    #[test]
    fn different_classes_get_different_slabs() {
        let mut allocator = SlabAllocator::new(256);
        assert_eq!(allocator.allocate(8, 8), Some((0, 0)));
        assert_eq!(allocator.allocate(16, 16), Some((64, 0)));
        assert_eq!(allocator.slab_count(), 2);
    }

    #[test]
    fn cells_wrap_to_next_row() {
        let mut allocator = SlabAllocator::new(64);
        for i in 0..2 {
            assert_eq!(allocator.allocate(32, 32), Some((i * 32, 0)));
        }
        assert_eq!(allocator.allocate(32, 32), Some((0, 32)));
        assert_eq!(allocator.allocate(32, 32), Some((32, 32)));
        assert_eq!(allocator.allocate(32, 32), None, "page is full");
    }

    #[test]
    fn large_glyph_spans_slabs() {
        let mut allocator = SlabAllocator::new(256);
        assert_eq!(allocator.allocate(8, 8), Some((0, 0)));
        assert_eq!(allocator.allocate(100, 70), Some((64, 0)));
        // The large glyph covers a 2x2 block of slabs; the next free slab is right of it.
        assert_eq!(allocator.allocate(16, 16), Some((192, 0)));
        assert_eq!(allocator.allocate(32, 32), Some((0, 64)));
        assert_eq!(allocator.allocate(300, 1), None, "wider than the page");
    }

    #[test]
    fn exhaustion() {
        let mut allocator = SlabAllocator::new(128);
        let mut placed = 0;
        while allocator.allocate(64, 64).is_some() {
            placed += 1;
        }
        assert_eq!(placed, 4);
        assert_eq!(allocator.allocate(0, 0), Some((0, 0)), "empty glyphs always fit");
    }

    #[test]
    fn small_page_uses_page_sized_slab() {
        let mut allocator = SlabAllocator::new(32);
        assert_eq!(allocator.slab_size(), 32);
        assert_eq!(allocator.allocate(32, 32), Some((0, 0)));
        assert_eq!(allocator.allocate(1, 1), None);
    }

    #[test]
    fn partial_grid_edge_is_usable() {
        // 100 is not a multiple of 64, so the grid is one full and one 36 px slab wide.
        let mut allocator = SlabAllocator::new(100);
        assert_eq!(allocator.allocate(80, 80), Some((0, 0)));
        assert_eq!(allocator.allocate(1, 1), None, "the 80x80 glyph took the whole grid");

        let mut allocator = SlabAllocator::new(100);
        assert_eq!(allocator.allocate(100, 100), Some((0, 0)));

        let mut allocator = SlabAllocator::new(100);
        assert_eq!(allocator.allocate(64, 64), Some((0, 0)));
        assert_eq!(allocator.allocate(32, 32), Some((64, 0)), "fits the narrow column");
        assert_eq!(allocator.allocate(64, 64), None, "no other slab is 64 px wide and tall");
        assert_eq!(allocator.allocate(40, 20), Some((0, 64)), "flat glyphs use the short row");
    }

    #[test]
    fn stats_and_preview() {
        let mut allocator = SlabAllocator::new(128);
        allocator.allocate(3, 3);
        let stats = allocator.stats();
        assert!(stats.contains("glyphs: 1"), "{stats}");
        assert!(stats.contains("used: 9 px"), "{stats}");
        assert!(stats.contains("slabs: 1 of 4"), "{stats}");

        let preview = allocator.usage_preview();
        assert_eq!(preview.width(), 128);
        let lime = css::LIME.to_rgba8();
        assert_eq!(preview.pixel(1, 1), Some([lime.r, lime.g, lime.b, lime.a]));
        let orange = css::ORANGE.to_rgba8();
        assert_eq!(
            preview.pixel(3, 3),
            Some([orange.r, orange.g, orange.b, orange.a]),
            "cell padding is drawn as waste"
        );
        assert_eq!(preview.pixel(100, 100), Some([0, 0, 0, 0]));
    }
}
