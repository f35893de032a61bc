// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packing strategies for glyph rectangles within one page.
//!
//! An allocator only hands out positions; pixel storage and glyph bookkeeping
//! live in [`AtlasPage`](crate::AtlasPage). Two strategies are provided:
//! - [`SlabAllocator`] (the default) groups glyphs of the same size class into
//!   fixed-size slabs.
//! - [`ShelfAllocator`] packs glyphs onto shelves using `etagere`.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use crate::UsagePreview;

mod shelf;
mod slab;

pub use shelf::ShelfAllocator;
pub use slab::{DEFAULT_SLAB_SIZE, SlabAllocator};

/// Reserves rectangles within a square page.
pub trait GlyphAllocator {
    /// Reserves a `width` × `height` rectangle, returning its top-left corner.
    ///
    /// A zero-area request is placed at `(0, 0)` without consuming space.
    /// Returns `None` when the page has no room for the rectangle.
    fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)>;

    /// Draws used and wasted space for debugging.
    fn usage_preview(&self) -> UsagePreview;

    /// A human-readable utilisation summary.
    fn stats(&self) -> String;
}

/// Selects the packing strategy of every page in an atlas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AllocatorKind {
    /// Fixed-size slabs, one power-of-two size class each.
    #[default]
    Slab,
    /// Shelf packing.
    Shelf,
}

impl AllocatorKind {
    /// The lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slab => "slab",
            Self::Shelf => "shelf",
        }
    }

    /// Creates an allocator of this kind for a page of `page_size` × `page_size` pixels.
    pub fn create(self, page_size: u32) -> Box<dyn GlyphAllocator> {
        match self {
            Self::Slab => Box::new(SlabAllocator::new(page_size)),
            Self::Shelf => Box::new(ShelfAllocator::new(page_size)),
        }
    }
}

impl fmt::Display for AllocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocatorKind {
    type Err = ParseAllocatorKindError;

    /// Parses `slab` or `shelf`, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("slab") {
            Ok(Self::Slab)
        } else if s.eq_ignore_ascii_case("shelf") {
            Ok(Self::Shelf)
        } else {
            Err(ParseAllocatorKindError)
        }
    }
}

/// An error returned from parsing an [`AllocatorKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAllocatorKindError;

impl fmt::Display for ParseAllocatorKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown allocator kind, expected `slab` or `shelf`")
    }
}

impl core::error::Error for ParseAllocatorKindError {}

/// Percentage of `part` in `whole`, for stats output.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn parse_kind() {
        assert_eq!("slab".parse(), Ok(AllocatorKind::Slab));
        assert_eq!("Shelf".parse(), Ok(AllocatorKind::Shelf));
        assert_eq!(
            "guillotine".parse::<AllocatorKind>(),
            Err(ParseAllocatorKindError)
        );
        assert_eq!(AllocatorKind::default(), AllocatorKind::Slab);
    }

    #[test]
    fn display_round_trips() {
        for kind in [AllocatorKind::Slab, AllocatorKind::Shelf] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn every_kind_places_zero_area_at_origin() {
        for kind in [AllocatorKind::Slab, AllocatorKind::Shelf] {
            let mut allocator = kind.create(64);
            assert_eq!(allocator.allocate(0, 0), Some((0, 0)));
            assert_eq!(allocator.allocate(0, 10), Some((0, 0)));
            // The origin is still free for a real glyph.
            assert_eq!(allocator.allocate(8, 8), Some((0, 0)), "{kind} reused origin");
        }
    }
}
