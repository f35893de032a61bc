// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit layout of packed token metadata.
//!
//! A glyph request carries a `u32` describing how the characters were classified
//! and styled:
//!
//! ```text
//!  31        24 23            15 14    11 10 9  8 7          0
//! | background | foreground      | style  |bb|type| language   |
//! ```
//!
//! The language id, token type and balanced-bracket bits don't change what a
//! glyph looks like, so they are cleared with [`mask_metadata`] before the value
//! takes part in any cache key.

/// Language id (bits 0-7).
pub const LANGUAGE_ID_MASK: u32 = 0b0000_0000_0000_0000_0000_0000_1111_1111;
/// Token type (bits 8-9).
pub const TOKEN_TYPE_MASK: u32 = 0b0000_0000_0000_0000_0000_0011_0000_0000;
/// Balanced bracket flag (bit 10).
pub const BALANCED_BRACKETS_MASK: u32 = 0b0000_0000_0000_0000_0000_0100_0000_0000;
/// Font style flags (bits 11-14), see [`FontStyle`].
pub const FONT_STYLE_MASK: u32 = 0b0000_0000_0000_0000_0111_1000_0000_0000;
/// Foreground color index (bits 15-23).
pub const FOREGROUND_MASK: u32 = 0b0000_0000_1111_1111_1000_0000_0000_0000;
/// Background color index (bits 24-31).
pub const BACKGROUND_MASK: u32 = 0b1111_1111_0000_0000_0000_0000_0000_0000;

/// Offset of the token type field.
pub const TOKEN_TYPE_OFFSET: u32 = 8;
/// Offset of the font style field.
pub const FONT_STYLE_OFFSET: u32 = 11;
/// Offset of the foreground color index.
pub const FOREGROUND_OFFSET: u32 = 15;
/// Offset of the background color index.
pub const BACKGROUND_OFFSET: u32 = 24;

/// Fields that never affect a glyph's appearance.
pub const APPEARANCE_IRRELEVANT_MASK: u32 =
    LANGUAGE_ID_MASK | TOKEN_TYPE_MASK | BALANCED_BRACKETS_MASK;

/// Font style flags stored in [`FONT_STYLE_MASK`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontStyle(u8);

impl FontStyle {
    /// No styling.
    pub const NONE: Self = Self(0);
    /// Italic.
    pub const ITALIC: Self = Self(1);
    /// Bold.
    pub const BOLD: Self = Self(2);
    /// Underline.
    pub const UNDERLINE: Self = Self(4);
    /// Strikethrough.
    pub const STRIKETHROUGH: Self = Self(8);

    /// Returns true if every flag in `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw flag bits.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl core::ops::BitOr for FontStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Clears the language id, token type and balanced-bracket fields.
#[inline]
pub const fn mask_metadata(metadata: u32) -> u32 {
    metadata & !APPEARANCE_IRRELEVANT_MASK
}

/// Builds metadata with only the foreground color index set.
///
/// Indices that don't fit the 9-bit field are truncated to it.
#[inline]
pub const fn foreground_metadata(color_index: u32) -> u32 {
    (color_index << FOREGROUND_OFFSET) & FOREGROUND_MASK
}

/// Extracts the foreground color index.
#[inline]
pub const fn foreground_index(metadata: u32) -> u32 {
    (metadata & FOREGROUND_MASK) >> FOREGROUND_OFFSET
}

/// Extracts the background color index.
#[inline]
pub const fn background_index(metadata: u32) -> u32 {
    (metadata & BACKGROUND_MASK) >> BACKGROUND_OFFSET
}

/// Extracts the font style flags.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the style field is four bits wide"
)]
#[inline]
pub const fn font_style(metadata: u32) -> FontStyle {
    FontStyle(((metadata & FONT_STYLE_MASK) >> FONT_STYLE_OFFSET) as u8)
}
