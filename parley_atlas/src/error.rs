// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Error type for atlas operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the page size and, when relevant,
/// the index of the page involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// Edge length of the atlas pages in pixels.
    page_size: u32,

    /// The page that failed to place a glyph.
    page_index: Option<u32>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The page edge length in pixels at the time of the error.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The index of the page involved, if any.
    pub fn page_index(&self) -> Option<u32> {
        self.page_index
    }

    pub(crate) fn invalid_config(page_size: u32) -> Self {
        Self {
            kind: ErrorKind::InvalidConfig,
            page_size,
            page_index: None,
        }
    }

    pub(crate) fn glyph_exceeds_page(page_size: u32, page_index: u32) -> Self {
        Self {
            kind: ErrorKind::GlyphExceedsPage,
            page_size,
            page_index: Some(page_index),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidConfig => write!(
                f,
                "invalid atlas configuration (page size {})",
                self.page_size
            ),
            ErrorKind::GlyphExceedsPage => {
                write!(
                    f,
                    "glyph does not fit an empty {0}x{0} page",
                    self.page_size
                )?;
                if let Some(index) = self.page_index {
                    write!(f, " (page {index})")?;
                }
                Ok(())
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The maximum texture dimension was zero or the device pixel ratio was not a
    /// positive finite number.
    InvalidConfig,

    /// A newly created, empty page could not hold the glyph.
    ///
    /// Pages must be at least as large as the largest glyph a rasterizer produces.
    GlyphExceedsPage,
}
