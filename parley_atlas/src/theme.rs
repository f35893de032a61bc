// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::Color;

/// Supplies the ordered foreground color table.
///
/// The foreground index stored in glyph metadata refers into this list. The atlas
/// reads it once at construction and again on every
/// [`TextureAtlas::update_theme`](crate::TextureAtlas::update_theme).
pub trait ThemeSource {
    /// The current foreground colors, in index order.
    fn foreground_colors(&self) -> Vec<Color>;
}

impl ThemeSource for [Color] {
    fn foreground_colors(&self) -> Vec<Color> {
        self.to_vec()
    }
}

impl ThemeSource for Vec<Color> {
    fn foreground_colors(&self) -> Vec<Color> {
        self.clone()
    }
}

impl<const N: usize> ThemeSource for [Color; N] {
    fn foreground_colors(&self) -> Vec<Color> {
        self.to_vec()
    }
}
