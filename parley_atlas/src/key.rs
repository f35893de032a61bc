// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph cache keys.

use alloc::string::String;
use core::hash::{Hash, Hasher};

use crate::metadata::mask_metadata;

/// Identifies a glyph independent of where it is stored.
///
/// The metadata is always masked, so two requests differing only in language id,
/// token type or balanced-bracket bits produce equal keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphKey {
    chars: String,
    metadata: u32,
}

impl GlyphKey {
    /// Creates a key, masking out the appearance-irrelevant metadata fields.
    pub fn new(chars: &str, metadata: u32) -> Self {
        Self {
            chars: chars.into(),
            metadata: mask_metadata(metadata),
        }
    }

    /// The character sequence.
    #[inline]
    pub fn chars(&self) -> &str {
        &self.chars
    }

    /// The masked metadata.
    #[inline]
    pub fn metadata(&self) -> u32 {
        self.metadata
    }
}

// Must hash identically to `GlyphLookupKey`.
impl Hash for GlyphKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chars.as_str().hash(state);
        self.metadata.hash(state);
    }
}

/// Borrowed form of [`GlyphKey`] used for lookups without allocating.
///
/// The metadata must already be masked.
#[derive(Copy, Clone, Debug)]
pub(crate) struct GlyphLookupKey<'a> {
    pub(crate) chars: &'a str,
    pub(crate) metadata: u32,
}

impl<'a> GlyphLookupKey<'a> {
    #[inline]
    pub(crate) fn new(chars: &'a str, masked_metadata: u32) -> Self {
        Self {
            chars,
            metadata: masked_metadata,
        }
    }

    pub(crate) fn to_key(self) -> GlyphKey {
        GlyphKey {
            chars: self.chars.into(),
            metadata: self.metadata,
        }
    }
}

impl Hash for GlyphLookupKey<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chars.hash(state);
        self.metadata.hash(state);
    }
}

impl hashbrown::Equivalent<GlyphKey> for GlyphLookupKey<'_> {
    fn equivalent(&self, other: &GlyphKey) -> bool {
        self.metadata == other.metadata && self.chars == other.chars
    }
}

/// Key of a glyph stored on a page: the rasterizer that produced it plus the glyph key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PageGlyphKey {
    pub(crate) rasterizer_id: u32,
    pub(crate) glyph: GlyphKey,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct PageGlyphLookupKey<'a> {
    pub(crate) rasterizer_id: u32,
    pub(crate) glyph: GlyphLookupKey<'a>,
}

impl Hash for PageGlyphLookupKey<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rasterizer_id.hash(state);
        self.glyph.hash(state);
    }
}

impl hashbrown::Equivalent<PageGlyphKey> for PageGlyphLookupKey<'_> {
    fn equivalent(&self, other: &PageGlyphKey) -> bool {
        self.rasterizer_id == other.rasterizer_id && self.glyph.equivalent(&other.glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::BuildHasher;
    use hashbrown::{Equivalent, HashMap};

    use crate::metadata::{BALANCED_BRACKETS_MASK, foreground_metadata};

    #[test]
    fn irrelevant_bits_do_not_split_keys() {
        let plain = GlyphKey::new("a", foreground_metadata(3));
        let noisy = GlyphKey::new("a", foreground_metadata(3) | 0x7f | BALANCED_BRACKETS_MASK);
        assert_eq!(plain, noisy);
        assert_eq!(plain.metadata(), foreground_metadata(3));
    }

    #[test]
    fn lookup_key_hashes_like_owned_key() {
        let map: HashMap<GlyphKey, u32> = HashMap::new();
        let owned = GlyphKey::new("fi", 0x8000);
        let borrowed = GlyphLookupKey::new("fi", 0x8000);
        assert_eq!(
            map.hasher().hash_one(&owned),
            map.hasher().hash_one(borrowed),
            "owned and borrowed keys must land in the same bucket"
        );
        assert!(borrowed.equivalent(&owned), "borrowed key matches owned key");
        assert_eq!(borrowed.to_key(), owned);
    }

    #[test]
    fn lookup_without_allocation() {
        let mut map = HashMap::new();
        map.insert(GlyphKey::new("x", 0), 4_usize);
        assert_eq!(map.get(&GlyphLookupKey::new("x", 0)), Some(&4));
        assert_eq!(map.get(&GlyphLookupKey::new("y", 0)), None);
    }
}
