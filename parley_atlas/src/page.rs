// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas pages.
//!
//! A page is one square texture plus the bookkeeping needed to find glyphs on
//! it. The atlas talks to pages only through [`TexturePage`], so hosts can
//! substitute their own storage (for example one that writes straight into a GPU
//! texture) by providing a [`PageFactory`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::key::{GlyphLookupKey, PageGlyphKey, PageGlyphLookupKey};
use crate::{
    AllocatorKind, Color, GlyphAllocator, GlyphRasterizer, PlacedGlyph, RasterizedGlyph,
    UsagePreview,
};

/// One fixed-size texture page of an atlas.
pub trait TexturePage {
    /// Position of this page in the atlas.
    fn index(&self) -> u32;

    /// Edge length in pixels.
    fn size(&self) -> u32;

    /// Returns the glyph for `chars` and the already masked `metadata`, placing it
    /// if it isn't on this page yet.
    ///
    /// Returns `None` if the glyph is not on this page and there is no room for
    /// it.
    fn get_glyph(
        &mut self,
        rasterizer: &dyn GlyphRasterizer,
        chars: &str,
        metadata: u32,
        colors: &[Color],
    ) -> Option<PlacedGlyph>;

    /// Number of glyphs placed on this page.
    fn glyph_count(&self) -> usize;

    /// Draws the page's used and wasted space. Must not change the page.
    fn usage_preview(&self) -> UsagePreview;

    /// A human-readable utilisation summary.
    fn stats(&self) -> String;
}

/// Creates the pages of an atlas.
pub trait PageFactory {
    /// Creates page `index` of `size` × `size` pixels packed with `allocator`.
    fn create_page(
        &mut self,
        index: u32,
        size: u32,
        allocator: AllocatorKind,
    ) -> Box<dyn TexturePage>;
}

/// Creates [`AtlasPage`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultPageFactory;

impl PageFactory for DefaultPageFactory {
    fn create_page(
        &mut self,
        index: u32,
        size: u32,
        allocator: AllocatorKind,
    ) -> Box<dyn TexturePage> {
        Box::new(AtlasPage::new(index, size, allocator.create(size)))
    }
}

/// A page that keeps its texture in memory.
///
/// Pixels are premultiplied RGBA8. Each placement bumps [`version`](Self::version),
/// so a host can tell which pages need to be uploaded again.
pub struct AtlasPage {
    index: u32,
    size: u32,
    allocator: Box<dyn GlyphAllocator>,
    pixels: Vec<u8>,
    glyph_map: HashMap<PageGlyphKey, PlacedGlyph>,
    /// Glyphs in placement order; `glyph_index` points in here.
    glyphs: Vec<PlacedGlyph>,
    version: u32,
}

impl AtlasPage {
    /// Creates an empty page of `size` × `size` pixels.
    pub fn new(index: u32, size: u32, allocator: Box<dyn GlyphAllocator>) -> Self {
        Self {
            index,
            size,
            allocator,
            pixels: vec![0; size as usize * size as usize * 4],
            glyph_map: HashMap::new(),
            glyphs: Vec::new(),
            version: 0,
        }
    }

    /// The texture contents.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Incremented every time a glyph is placed.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Placed glyphs, in placement order.
    #[inline]
    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }

    /// Placed glyphs as bytes, ready for a GPU storage buffer.
    #[inline]
    pub fn glyph_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.glyphs)
    }

    fn place(&mut self, key: PageGlyphKey, raster: &RasterizedGlyph) -> Option<PlacedGlyph> {
        let (x, y) = self.allocator.allocate(raster.width, raster.height)?;
        let glyph = PlacedGlyph {
            page_index: self.index,
            glyph_index: u32::try_from(self.glyphs.len()).ok()?,
            x,
            y,
            width: raster.width,
            height: raster.height,
            origin_offset_x: raster.origin_offset_x,
            origin_offset_y: raster.origin_offset_y,
        };
        self.blit(&glyph, raster);
        self.glyphs.push(glyph);
        self.glyph_map.insert(key, glyph);
        self.version = self.version.wrapping_add(1);
        Some(glyph)
    }

    fn blit(&mut self, glyph: &PlacedGlyph, raster: &RasterizedGlyph) {
        if raster.is_empty() {
            return;
        }
        let src_stride = raster.width as usize * 4;
        let dst_stride = self.size as usize * 4;
        for (row, src) in raster
            .pixels
            .chunks_exact(src_stride)
            .take(raster.height as usize)
            .enumerate()
        {
            let start = (glyph.y as usize + row) * dst_stride + glyph.x as usize * 4;
            if let Some(dst) = self.pixels.get_mut(start..start + src_stride) {
                dst.copy_from_slice(src);
            }
        }
    }
}

impl TexturePage for AtlasPage {
    fn index(&self) -> u32 {
        self.index
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn get_glyph(
        &mut self,
        rasterizer: &dyn GlyphRasterizer,
        chars: &str,
        metadata: u32,
        colors: &[Color],
    ) -> Option<PlacedGlyph> {
        let lookup = PageGlyphLookupKey {
            rasterizer_id: rasterizer.id(),
            glyph: GlyphLookupKey::new(chars, metadata),
        };
        if let Some(glyph) = self.glyph_map.get(&lookup) {
            return Some(*glyph);
        }
        let raster = rasterizer.rasterize(chars, metadata, colors);
        let key = PageGlyphKey {
            rasterizer_id: lookup.rasterizer_id,
            glyph: lookup.glyph.to_key(),
        };
        self.place(key, &raster)
    }

    fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    fn usage_preview(&self) -> UsagePreview {
        self.allocator.usage_preview()
    }

    fn stats(&self) -> String {
        let mut stats = self.allocator.stats();
        stats.insert_str(0, &alloc::format!("page {}:\n", self.index));
        stats
    }
}

impl core::fmt::Debug for AtlasPage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasPage")
            .field("index", &self.index)
            .field("size", &self.size)
            .field("glyphs", &self.glyphs.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Produces `size` × `size` glyphs filled with the character's first byte.
    struct SquareRasterizer {
        size: u32,
        calls: Cell<usize>,
    }

    impl SquareRasterizer {
        fn new(size: u32) -> Self {
            Self {
                size,
                calls: Cell::new(0),
            }
        }
    }

    impl GlyphRasterizer for SquareRasterizer {
        fn id(&self) -> u32 {
            1
        }

        fn rasterize(&self, chars: &str, _metadata: u32, _colors: &[Color]) -> RasterizedGlyph {
            self.calls.set(self.calls.get() + 1);
            if chars.is_empty() {
                return RasterizedGlyph::empty();
            }
            let fill = chars.as_bytes()[0];
            let len = self.size as usize * self.size as usize * 4;
            RasterizedGlyph::new(self.size, self.size, vec![fill; len])
        }
    }

    #[test]
    fn glyph_is_cached() {
        let mut page = DefaultPageFactory.create_page(0, 64, AllocatorKind::Slab);
        let rasterizer = SquareRasterizer::new(8);
        let first = page.get_glyph(&rasterizer, "a", 0, &[]).unwrap();
        let second = page.get_glyph(&rasterizer, "a", 0, &[]).unwrap();
        assert_eq!(first, second);
        assert_eq!(rasterizer.calls.get(), 1, "second lookup is a cache hit");
        assert_eq!(page.glyph_count(), 1);
    }

    #[test]
    fn pixels_are_copied() {
        let mut page = AtlasPage::new(2, 32, AllocatorKind::Shelf.create(32));
        let rasterizer = SquareRasterizer::new(4);
        let glyph = page.get_glyph(&rasterizer, "z", 0, &[]).unwrap();
        assert_eq!(glyph.page_index, 2);
        assert_eq!(glyph.glyph_index, 0);
        let offset = ((glyph.y as usize + 3) * 32 + glyph.x as usize + 3) * 4;
        assert_eq!(page.pixels()[offset], b'z');
        assert_eq!(page.version(), 1);
        assert_eq!(page.glyph_data().len(), 32);
    }

    #[test]
    fn full_page_returns_none() {
        let mut page = AtlasPage::new(0, 16, AllocatorKind::Slab.create(16));
        let rasterizer = SquareRasterizer::new(16);
        assert!(page.get_glyph(&rasterizer, "a", 0, &[]).is_some(), "first fits");
        assert_eq!(page.get_glyph(&rasterizer, "b", 0, &[]), None);
        assert_eq!(page.glyph_count(), 1);
        assert_eq!(page.version(), 1);
    }

    #[test]
    fn rasterizers_do_not_share_glyphs() {
        struct Other;
        impl GlyphRasterizer for Other {
            fn id(&self) -> u32 {
                2
            }
            fn rasterize(&self, _: &str, _: u32, _: &[Color]) -> RasterizedGlyph {
                RasterizedGlyph::new(2, 2, vec![0; 16])
            }
        }
        let mut page = AtlasPage::new(0, 64, AllocatorKind::Slab.create(64));
        let a = page.get_glyph(&SquareRasterizer::new(2), "q", 0, &[]).unwrap();
        let b = page.get_glyph(&Other, "q", 0, &[]).unwrap();
        assert_ne!(a.glyph_index, b.glyph_index);
    }

    #[test]
    fn stats_name_the_page() {
        let page = AtlasPage::new(5, 64, AllocatorKind::Slab.create(64));
        assert!(page.stats().starts_with("page 5:\n"), "{}", page.stats());
    }
}
