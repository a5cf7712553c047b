use std::collections::VecDeque;
use std::rc::Rc;

use super::font::{decode_glyph, glyph_source, Glyph};

pub const GLYPH_CACHE_CAPACITY: usize = 64;

/// Fixed-capacity decoded-glyph cache with FIFO eviction.
#[derive(Debug)]
pub struct GlyphCache {
    entries: VecDeque<Rc<Glyph>>,
    capacity: usize,
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::with_capacity(GLYPH_CACHE_CAPACITY)
    }
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        let ch = ch.to_ascii_uppercase();
        self.entries.iter().any(|g| g.ch == ch)
    }

    /// Returns the decoded glyph for `ch`, decoding and inserting it on a miss.
    /// `None` when the font has no glyph for `ch`.
    pub fn get(&mut self, ch: char) -> Option<Rc<Glyph>> {
        let ch = ch.to_ascii_uppercase();
        if let Some(g) = self.entries.iter().find(|g| g.ch == ch) {
            return Some(Rc::clone(g));
        }

        let src = glyph_source(ch)?;
        let glyph = match decode_glyph(ch, src) {
            Ok(g) => Rc::new(g),
            Err(err) => {
                log::error!("stroke font: {err}");
                return None;
            }
        };
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Rc::clone(&glyph));
        Some(glyph)
    }
}
