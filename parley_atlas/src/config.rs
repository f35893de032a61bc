// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas configuration.

use crate::{AllocatorKind, Error};

/// Page edge length in pixels at a device pixel ratio of 1.
pub const BASE_PAGE_SIZE: u32 = 1024;

/// Configuration of a [`TextureAtlas`](crate::TextureAtlas).
///
/// The host supplies these values explicitly; the atlas never queries ambient
/// display state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtlasConfig {
    /// The largest texture edge the GPU supports, in pixels.
    pub max_texture_dimension: u32,
    /// Ratio of physical to logical pixels of the target surface.
    pub device_pixel_ratio: f32,
    /// Packing strategy used for every page.
    pub allocator: AllocatorKind,
}

impl AtlasConfig {
    /// Creates a configuration bound to the given maximum texture dimension.
    pub fn new(max_texture_dimension: u32) -> Self {
        Self {
            max_texture_dimension,
            ..Self::default()
        }
    }

    /// Sets the device pixel ratio.
    pub fn with_device_pixel_ratio(mut self, device_pixel_ratio: f32) -> Self {
        self.device_pixel_ratio = device_pixel_ratio;
        self
    }

    /// Sets the packing strategy.
    pub fn with_allocator(mut self, allocator: AllocatorKind) -> Self {
        self.allocator = allocator;
        self
    }

    /// Edge length of every page in pixels.
    ///
    /// This is [`BASE_PAGE_SIZE`] scaled by the device pixel ratio rounded down
    /// (but at least 1), capped at the maximum texture dimension.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "flooring the ratio is the intent; absurd ratios saturate"
    )]
    pub fn page_size(&self) -> u32 {
        // `as` saturates and maps NaN to 0.
        let scale = (self.device_pixel_ratio as u32).max(1);
        BASE_PAGE_SIZE
            .saturating_mul(scale)
            .min(self.max_texture_dimension)
    }

    /// Checks that the configuration can produce usable pages.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_texture_dimension == 0
            || !self.device_pixel_ratio.is_finite()
            || self.device_pixel_ratio <= 0.0
        {
            return Err(Error::invalid_config(self.page_size()));
        }
        Ok(())
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_texture_dimension: 4096,
            device_pixel_ratio: 1.0,
            allocator: AllocatorKind::default(),
        }
    }
}
