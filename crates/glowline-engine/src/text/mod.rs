//! Vector stroke font.
//!
//! Glyphs are hand-authored polylines on a 4×6 grid, stored as compact digit
//! strings and decoded on first use into a small FIFO cache.

mod cache;
mod font;

pub use cache::{GlyphCache, GLYPH_CACHE_CAPACITY};
pub use font::{decode_glyph, glyph_source, measure_text, Glyph, GLYPH_ADVANCE, GLYPH_HEIGHT};
