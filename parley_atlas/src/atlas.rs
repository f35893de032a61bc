// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The texture atlas: page list, hint index and warm-up scheduling.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::key::GlyphLookupKey;
use crate::metadata::{FOREGROUND_MASK, FOREGROUND_OFFSET, foreground_metadata, mask_metadata};
use crate::{
    AtlasConfig, Color, Error, GlyphKey, GlyphRasterizer, IdleDeadline, IdleTaskQueue,
    PageFactory, PlacedGlyph, RasterizedGlyph, TexturePage, ThemeSource, UsagePreview,
};

/// Page count past which every further page is logged as a warning.
///
/// GPU texture arrays commonly cap out around here; the atlas itself keeps
/// growing and leaves the budget to the host.
pub const PAGE_COUNT_WARNING_THRESHOLD: usize = 16;

/// Number of distinct foreground indices the metadata can express.
const FOREGROUND_INDEX_COUNT: usize = ((FOREGROUND_MASK >> FOREGROUND_OFFSET) + 1) as usize;

/// Rasterizer id used for the reserved empty glyph on page 0.
const RESERVED_RASTERIZER_ID: u32 = u32::MAX;

/// Caches rasterized glyphs across a growable list of texture pages.
///
/// Glyph lookups start at the page recorded in a hint index and walk forward
/// through the pages; when none has room, a new page is appended. Pages are
/// never removed.
///
/// The first lookup through a rasterizer schedules a warm-up campaign that
/// rasterizes printable ASCII in every foreground color. The campaign only runs
/// when the host calls [`run_idle_tasks`](Self::run_idle_tasks), never inside a
/// lookup.
pub struct TextureAtlas {
    config: AtlasConfig,
    page_size: u32,
    /// Most atlases never need more than one page.
    pages: SmallVec<[Box<dyn TexturePage>; 1]>,
    page_factory: Box<dyn PageFactory>,
    /// First page that might hold a glyph. Only ever moves forward.
    hints: HashMap<GlyphKey, u32>,
    colors: Vec<Color>,
    warmed_rasterizers: HashSet<u32>,
    warm_up: Option<IdleTaskQueue<WarmUpTask>>,
}

/// Rasterizes one character in every foreground color.
struct WarmUpTask {
    rasterizer: Arc<dyn GlyphRasterizer>,
    ch: char,
}

impl TextureAtlas {
    /// Creates an atlas with a single page.
    ///
    /// Page 0 receives a zero-sized glyph for the empty string with metadata 0,
    /// so its first slot never refers to a visible glyph.
    pub fn new(
        config: AtlasConfig,
        theme: &dyn ThemeSource,
        page_factory: impl PageFactory + 'static,
    ) -> Result<Self, Error> {
        config.validate()?;
        let page_size = config.page_size();
        let mut page_factory: Box<dyn PageFactory> = Box::new(page_factory);
        let mut first_page = page_factory.create_page(0, page_size, config.allocator);
        let colors = theme.foreground_colors();
        first_page
            .get_glyph(&ReservedRasterizer, "", 0, &colors)
            .ok_or_else(|| Error::glyph_exceeds_page(page_size, 0))?;

        let mut hints = HashMap::new();
        hints.insert(GlyphKey::new("", 0), 0);
        let mut pages = SmallVec::new();
        pages.push(first_page);

        log::debug!(
            "created glyph atlas with {page_size}x{page_size} pages using the {} allocator",
            config.allocator
        );
        Ok(Self {
            config,
            page_size,
            pages,
            page_factory,
            hints,
            colors,
            warmed_rasterizers: HashSet::new(),
            warm_up: None,
        })
    }

    /// Returns the glyph for `chars` styled by `metadata`, rasterizing and placing
    /// it if needed.
    ///
    /// The language id, token type and balanced-bracket bits of `metadata` are
    /// ignored. The first call for a rasterizer schedules its warm-up campaign.
    ///
    /// Fails only if a freshly created page cannot hold the glyph, which means
    /// the page size is smaller than the glyph.
    pub fn get_glyph(
        &mut self,
        rasterizer: &Arc<dyn GlyphRasterizer>,
        chars: &str,
        metadata: u32,
    ) -> Result<PlacedGlyph, Error> {
        let metadata = mask_metadata(metadata);
        if self.warmed_rasterizers.insert(rasterizer.id()) {
            self.schedule_warm_up(rasterizer);
        }
        self.resolve(rasterizer.as_ref(), chars, metadata)
    }

    /// Searches from the hinted page forward, appending a page if none has room.
    fn resolve(
        &mut self,
        rasterizer: &dyn GlyphRasterizer,
        chars: &str,
        metadata: u32,
    ) -> Result<PlacedGlyph, Error> {
        let lookup = GlyphLookupKey::new(chars, metadata);
        let start = self.hints.get(&lookup).copied().unwrap_or(0);
        for index in start..self.page_count_u32() {
            self.record_hint(lookup, index);
            if let Some(glyph) =
                self.pages[index as usize].get_glyph(rasterizer, chars, metadata, &self.colors)
            {
                return Ok(glyph);
            }
        }

        // An empty last page that refused the glyph is what growing would produce.
        let last = self.page_count_u32() - 1;
        if start <= last && self.pages[last as usize].glyph_count() == 0 {
            return Err(Error::glyph_exceeds_page(self.page_size, last));
        }

        let index = self.grow();
        self.record_hint(lookup, index);
        self.pages[index as usize]
            .get_glyph(rasterizer, chars, metadata, &self.colors)
            .ok_or_else(|| Error::glyph_exceeds_page(self.page_size, index))
    }

    fn record_hint(&mut self, lookup: GlyphLookupKey<'_>, index: u32) {
        match self.hints.get_mut(&lookup) {
            Some(hint) => *hint = index,
            None => {
                self.hints.insert(lookup.to_key(), index);
            }
        }
    }

    /// Appends a page and returns its index.
    fn grow(&mut self) -> u32 {
        let index = self.page_count_u32();
        let page = self
            .page_factory
            .create_page(index, self.page_size, self.config.allocator);
        self.pages.push(page);
        let count = self.pages.len();
        if count > PAGE_COUNT_WARNING_THRESHOLD {
            log::warn!(
                "glyph atlas grew to {count} pages, past the {PAGE_COUNT_WARNING_THRESHOLD} page budget"
            );
        } else {
            log::debug!("glyph atlas grew to {count} pages");
        }
        index
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "page indices are u32; an atlas never gets near 2^32 pages"
    )]
    fn page_count_u32(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Queues one unit per printable ASCII character, replacing any campaign
    /// still pending.
    fn schedule_warm_up(&mut self, rasterizer: &Arc<dyn GlyphRasterizer>) {
        let mut queue = IdleTaskQueue::new();
        queue.extend(warm_up_chars().map(|ch| WarmUpTask {
            rasterizer: Arc::clone(rasterizer),
            ch,
        }));
        if let Some(mut previous) = self.warm_up.take() {
            let dropped = previous.clear();
            if dropped > 0 {
                log::debug!("dropped {dropped} pending warm-up units");
            }
        }
        log::debug!(
            "scheduled warm-up of {} characters for rasterizer {}",
            queue.len(),
            rasterizer.id()
        );
        self.warm_up = Some(queue);
    }

    /// Runs pending warm-up units until `deadline` runs out.
    ///
    /// Hosts call this when they have idle time. Returns the number of units
    /// that ran.
    pub fn run_idle_tasks(&mut self, deadline: &mut dyn IdleDeadline) -> usize {
        let mut ran = 0;
        loop {
            let Some(queue) = self.warm_up.as_mut() else {
                break;
            };
            let Some(task) = queue.pop_if(deadline) else {
                break;
            };
            self.run_warm_up_task(&task);
            ran += 1;
        }
        if self.warm_up.as_ref().is_some_and(IdleTaskQueue::is_empty) {
            self.warm_up = None;
        }
        log::trace!("ran {ran} warm-up units");
        ran
    }

    fn run_warm_up_task(&mut self, task: &WarmUpTask) {
        let mut buf = [0; 4];
        let chars = task.ch.encode_utf8(&mut buf);
        let color_count = self.colors.len().min(FOREGROUND_INDEX_COUNT);
        for color_index in 0..color_count {
            let metadata = foreground_metadata(u32::try_from(color_index).unwrap_or(u32::MAX));
            if let Err(err) = self.get_glyph(&task.rasterizer, chars, metadata) {
                log::warn!("warm-up of {chars:?} failed: {err}");
                return;
            }
        }
    }

    /// Replaces the foreground color table with the theme's current colors.
    ///
    /// Cached glyphs are kept: a glyph placed for a foreground index keeps the
    /// color it was rasterized with until the atlas is rebuilt.
    pub fn update_theme(&mut self, theme: &dyn ThemeSource) {
        self.colors = theme.foreground_colors();
        log::debug!("glyph atlas theme updated ({} colors)", self.colors.len());
    }

    /// One usage image per page, in page order.
    ///
    /// Intended for debugging; pages are not modified.
    pub fn usage_previews(&self) -> Vec<UsagePreview> {
        self.pages.iter().map(|page| page.usage_preview()).collect()
    }

    /// One utilisation summary per page, in page order.
    pub fn stats(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.stats()).collect()
    }

    /// The configuration the atlas was created with.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Edge length of every page in pixels.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page at `index`.
    pub fn page(&self, index: u32) -> Option<&dyn TexturePage> {
        self.pages.get(index as usize).map(|page| &**page)
    }

    /// All pages, in index order.
    pub fn pages(&self) -> impl Iterator<Item = &dyn TexturePage> + '_ {
        self.pages.iter().map(|page| &**page)
    }

    /// The page a lookup for this glyph would start at, if it was requested before.
    pub fn hinted_page(&self, chars: &str, metadata: u32) -> Option<u32> {
        self.hints
            .get(&GlyphLookupKey::new(chars, mask_metadata(metadata)))
            .copied()
    }

    /// The current foreground color table.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of warm-up units waiting for idle time.
    pub fn pending_warm_up(&self) -> usize {
        self.warm_up.as_ref().map_or(0, IdleTaskQueue::len)
    }

    /// Returns true if a warm-up campaign was scheduled for this rasterizer id.
    pub fn is_warmed_up(&self, rasterizer_id: u32) -> bool {
        self.warmed_rasterizers.contains(&rasterizer_id)
    }
}

impl Drop for TextureAtlas {
    fn drop(&mut self) {
        let cancelled = self.warm_up.take().map_or(0, |mut queue| queue.clear());
        let pages = self.pages.len();
        self.pages.clear();
        log::debug!("released {pages} atlas pages, cancelled {cancelled} warm-up units");
    }
}

impl Debug for TextureAtlas {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextureAtlas")
            .field("config", &self.config)
            .field("page_size", &self.page_size)
            .field("pages", &self.pages.len())
            .field("hints", &self.hints.len())
            .field("colors", &self.colors.len())
            .field("pending_warm_up", &self.pending_warm_up())
            .finish_non_exhaustive()
    }
}

/// Uppercase first, then lowercase, then the rest of printable ASCII.
///
/// Larger glyphs go first so size-sensitive allocators pack better.
fn warm_up_chars() -> impl Iterator<Item = char> {
    ('A'..='Z')
        .chain('a'..='z')
        .chain(('!'..='~').filter(|ch| !ch.is_ascii_alphabetic()))
}

/// Produces the empty glyph reserved on page 0.
struct ReservedRasterizer;

impl GlyphRasterizer for ReservedRasterizer {
    fn id(&self) -> u32 {
        RESERVED_RASTERIZER_ID
    }

    fn rasterize(&self, _chars: &str, _metadata: u32, _colors: &[Color]) -> RasterizedGlyph {
        RasterizedGlyph::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllocatorKind, DefaultPageFactory, TaskBudget};
    use alloc::vec;
    use peniko::color::palette::css;

    struct BoxRasterizer {
        id: u32,
    }

    impl GlyphRasterizer for BoxRasterizer {
        fn id(&self) -> u32 {
            self.id
        }

        fn rasterize(&self, chars: &str, _metadata: u32, _colors: &[Color]) -> RasterizedGlyph {
            if chars.is_empty() {
                return RasterizedGlyph::empty();
            }
            RasterizedGlyph::new(6, 10, vec![0xff; 6 * 10 * 4])
        }
    }

    fn rasterizer(id: u32) -> Arc<dyn GlyphRasterizer> {
        Arc::new(BoxRasterizer { id })
    }

    fn atlas(max_texture_dimension: u32) -> TextureAtlas {
        TextureAtlas::new(
            AtlasConfig::new(max_texture_dimension),
            &[css::BLACK, css::WHITE],
            DefaultPageFactory,
        )
        .unwrap()
    }

    #[test]
    fn warm_up_order() {
        let chars: Vec<char> = warm_up_chars().collect();
        assert_eq!(chars.len(), 94);
        assert_eq!(chars[0], 'A');
        assert_eq!(chars[25], 'Z');
        assert_eq!(chars[26], 'a');
        assert_eq!(chars[52], '!');
        assert_eq!(*chars.last().unwrap(), '~');
        assert!(
            chars[52..].iter().all(|ch| !ch.is_ascii_alphabetic()),
            "letters are queued once"
        );
    }

    #[test]
    fn first_page_holds_reserved_glyph() {
        let atlas = atlas(256);
        assert_eq!(atlas.page_count(), 1);
        assert_eq!(atlas.page(0).unwrap().glyph_count(), 1);
        assert_eq!(atlas.hinted_page("", 0), Some(0));
    }

    #[test]
    fn lookups_do_not_run_warm_up() {
        let mut atlas = atlas(256);
        let r = rasterizer(1);
        atlas.get_glyph(&r, "x", 0).unwrap();
        assert_eq!(atlas.pending_warm_up(), 94);
        // Only the reserved glyph and "x" are placed.
        assert_eq!(atlas.page(0).unwrap().glyph_count(), 2);
    }

    #[test]
    fn warm_up_covers_every_color() {
        let mut atlas = atlas(1024);
        let r = rasterizer(1);
        atlas.get_glyph(&r, "x", 0).unwrap();
        assert_eq!(atlas.run_idle_tasks(&mut TaskBudget::new(1)), 1);
        assert_eq!(atlas.pending_warm_up(), 93);
        assert_eq!(atlas.hinted_page("A", foreground_metadata(0)), Some(0));
        assert_eq!(atlas.hinted_page("A", foreground_metadata(1)), Some(0));
        assert_eq!(atlas.hinted_page("A", foreground_metadata(2)), None);
        assert_eq!(atlas.hinted_page("B", foreground_metadata(0)), None);

        assert_eq!(atlas.run_idle_tasks(&mut TaskBudget::unlimited()), 93);
        assert_eq!(atlas.pending_warm_up(), 0);
        assert_eq!(atlas.run_idle_tasks(&mut TaskBudget::unlimited()), 0);
    }

    #[test]
    fn new_rasterizer_replaces_campaign() {
        let mut atlas = atlas(1024);
        atlas.get_glyph(&rasterizer(1), "x", 0).unwrap();
        atlas.run_idle_tasks(&mut TaskBudget::new(10));
        assert_eq!(atlas.pending_warm_up(), 84);
        atlas.get_glyph(&rasterizer(2), "x", 0).unwrap();
        assert_eq!(atlas.pending_warm_up(), 94, "old campaign was dropped");
        assert!(atlas.is_warmed_up(1), "first rasterizer stays warmed");
        assert!(atlas.is_warmed_up(2), "second rasterizer is warmed");
    }

    #[test]
    fn theme_update_replaces_colors() {
        let mut atlas = atlas(256);
        let before = atlas.get_glyph(&rasterizer(1), "x", 0).unwrap();
        atlas.update_theme(&[css::RED, css::GREEN, css::BLUE]);
        assert_eq!(atlas.colors(), &[css::RED, css::GREEN, css::BLUE]);
        let after = atlas.get_glyph(&rasterizer(1), "x", 0).unwrap();
        assert_eq!(before, after, "glyphs survive theme changes");
    }

    #[test]
    fn oversized_glyph_is_an_error() {
        let mut atlas = TextureAtlas::new(
            AtlasConfig::new(8).with_allocator(AllocatorKind::Shelf),
            &[css::BLACK],
            DefaultPageFactory,
        )
        .unwrap();
        let err = atlas.get_glyph(&rasterizer(1), "x", 0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::GlyphExceedsPage);
        assert_eq!(err.page_index(), Some(1));
        assert_eq!(atlas.page_count(), 2, "the new page stays");

        for _ in 0..5 {
            let err = atlas.get_glyph(&rasterizer(1), "x", 0).unwrap_err();
            assert_eq!(err.page_index(), Some(1));
        }
        assert_eq!(atlas.page_count(), 2, "repeated lookups reuse the empty page");

        assert_eq!(atlas.run_idle_tasks(&mut TaskBudget::unlimited()), 94);
        assert_eq!(atlas.page_count(), 2, "failed warm-up units do not grow the atlas");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err =
            TextureAtlas::new(AtlasConfig::new(0), &[css::BLACK], DefaultPageFactory).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidConfig);
    }
}
