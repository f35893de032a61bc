// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parley Atlas caches rasterized glyphs in fixed-size texture pages so text can be
//! drawn as textured quads instead of being rasterized every frame.
//!
//! The entry point is [`TextureAtlas`]. It owns an ordered list of pages, an
//! advisory hint index recording where the search for a glyph should start, and
//! a cooperative warm-up queue that pre-populates common glyphs while the host
//! is idle.
//!
//! Rasterization, page storage and packing are pluggable:
//! - [`GlyphRasterizer`] turns a character sequence into pixels.
//! - [`PageFactory`] creates [`TexturePage`]s; [`DefaultPageFactory`] builds an
//!   [`AtlasPage`] backed by one of the [`AllocatorKind`] strategies.
//!
//! ## Features
//!
//! - `std` (enabled by default): Use the standard library.
//! - `libm`: Use floating point implementations from [libm].
//! - `png`: Enables PNG encoding of [`UsagePreview`]s.
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("parley_atlas requires either the `std` or `libm` feature to be enabled");

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod atlas;
mod config;
mod error;
mod glyph;
mod idle;
mod key;
mod page;
mod preview;
mod rasterizer;
mod theme;

pub mod allocator;
pub mod metadata;

pub use peniko::Color;

pub use allocator::{AllocatorKind, GlyphAllocator, ParseAllocatorKindError};
pub use atlas::{PAGE_COUNT_WARNING_THRESHOLD, TextureAtlas};
pub use config::{AtlasConfig, BASE_PAGE_SIZE};
pub use error::{Error, ErrorKind};
pub use glyph::{PlacedGlyph, RasterizedGlyph};
#[cfg(feature = "std")]
pub use idle::InstantDeadline;
pub use idle::{IdleDeadline, IdleTaskQueue, TaskBudget};
pub use key::GlyphKey;
pub use page::{AtlasPage, DefaultPageFactory, PageFactory, TexturePage};
pub use preview::UsagePreview;
pub use rasterizer::GlyphRasterizer;
pub use theme::ThemeSource;
