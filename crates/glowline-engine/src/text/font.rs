use crate::coords::Vec2;
use crate::error::{VgError, VgResult};

/// Grid height of a glyph cell; a glyph drawn at `size` scales by `size / 6`.
pub const GLYPH_HEIGHT: f32 = 6.0;
/// Horizontal advance per character in grid units.
pub const GLYPH_ADVANCE: f32 = 5.0;

const GRID_MAX_X: u8 = 4;
const GRID_MAX_Y: u8 = 6;

/// Decoded glyph: polylines in grid units, y down.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub strokes: Vec<Vec<Vec2>>,
}

// Strokes are separated by spaces; each stroke is a run of `xy` digit pairs.
const GLYPHS: &[(char, &str)] = &[
    ('A', "0602204246 0343"),
    ('B', "06003041423303 3344453606"),
    ('C', "4130100105163645"),
    ('D', "00304145360600"),
    ('E', "40000646 0333"),
    ('F', "400006 0333"),
    ('G', "41301001051636454323"),
    ('H', "0006 4046 0343"),
    ('I', "1030 2026 1636"),
    ('J', "104045361605"),
    ('K', "0006 400346"),
    ('L', "000646"),
    ('M', "0600224046"),
    ('N', "06004640"),
    ('O', "103041453616050110"),
    ('P', "06003041423303"),
    ('Q', "103041453616050110 2446"),
    ('R', "06003041423303 2346"),
    ('S', "413010010213334445361605"),
    ('T', "0040 2026"),
    ('U', "000516364540"),
    ('V', "002640"),
    ('W', "0006244640"),
    ('X', "0046 4006"),
    ('Y', "002340 2326"),
    ('Z', "00400646"),
    ('0', "103041453616050110 4105"),
    ('1', "112026 1636"),
    ('2', "01103041420646"),
    ('3', "01103041423323 334445361605"),
    ('4', "300444 3036"),
    ('5', "4000023243453606"),
    ('6', "4020010516364543321203"),
    ('7', "004016"),
    ('8', "103041423313020110 133344453616050413"),
    ('9', "4233130201103041453616"),
    ('.', "2526"),
    (',', "2516"),
    ('!', "2024 2526"),
    ('?', "01103041422324 2526"),
    ('-', "0343"),
    ('+', "0343 2125"),
    (':', "2122 2425"),
    ('/', "0640"),
    ('(', "30212536"),
    (')', "10212516"),
    ('=', "0242 0444"),
    ('%', "0640 0001 4546"),
    ('\'', "2021"),
    ('"', "1011 3031"),
    ('<', "410345"),
    ('>', "014305"),
    ('_', "0646"),
    ('*', "1135 3115 0343"),
    (' ', ""),
];

/// Raw stroke source for `ch`, if the font covers it. Lowercase letters map
/// to their uppercase forms.
pub fn glyph_source(ch: char) -> Option<&'static str> {
    let ch = ch.to_ascii_uppercase();
    GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, src)| *src)
}

/// Parses a stroke source string into a [`Glyph`].
pub fn decode_glyph(ch: char, src: &str) -> VgResult<Glyph> {
    let mut strokes = Vec::new();
    for stroke in src.split_ascii_whitespace() {
        let digits = stroke.as_bytes();
        if digits.len() < 4 || digits.len() % 2 != 0 {
            return Err(VgError::invalid(format!("glyph {ch:?}: malformed stroke {stroke:?}")));
        }
        let mut points = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let (x, y) = (grid_digit(pair[0]), grid_digit(pair[1]));
            match (x, y) {
                (Some(x), Some(y)) if x <= GRID_MAX_X && y <= GRID_MAX_Y => {
                    points.push(Vec2::new(x as f32, y as f32));
                }
                _ => {
                    return Err(VgError::invalid(format!("glyph {ch:?}: point out of grid in {stroke:?}")));
                }
            }
        }
        strokes.push(points);
    }
    Ok(Glyph { ch, strokes })
}

#[inline]
fn grid_digit(b: u8) -> Option<u8> {
    b.is_ascii_digit().then(|| b - b'0')
}

/// Advance width of `text` at `size` (cell height in pixels).
pub fn measure_text(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * GLYPH_ADVANCE * (size / GLYPH_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_decodes() {
        for &(ch, src) in GLYPHS {
            let glyph = decode_glyph(ch, src).unwrap_or_else(|e| panic!("{e}"));
            assert!(glyph.strokes.iter().all(|s| s.len() >= 2));
        }
    }

    #[test]
    fn table_has_no_duplicates() {
        for (i, (a, _)) in GLYPHS.iter().enumerate() {
            assert!(GLYPHS[i + 1..].iter().all(|(b, _)| a != b), "duplicate {a:?}");
        }
    }

    #[test]
    fn covers_letters_and_digits() {
        for ch in ('A'..='Z').chain('0'..='9') {
            assert!(glyph_source(ch).is_some(), "{ch}");
        }
        assert_eq!(glyph_source('a'), glyph_source('A'));
        assert!(glyph_source('~').is_none());
    }

    #[test]
    fn decode_rejects_bad_sources() {
        assert!(decode_glyph('x', "012").is_err());
        assert!(decode_glyph('x', "0059").is_err());
        assert!(decode_glyph('x', "00a1").is_err());
        assert!(decode_glyph('x', "00").is_err());
    }

    #[test]
    fn decode_minus() {
        let g = decode_glyph('-', "0343").unwrap();
        assert_eq!(g.strokes, vec![vec![Vec2::new(0.0, 3.0), Vec2::new(4.0, 3.0)]]);
    }

    #[test]
    fn measure_scales_with_size() {
        assert_eq!(measure_text("", 12.0), 0.0);
        assert_eq!(measure_text("AB", 6.0), 10.0);
        assert_eq!(measure_text("AB", 12.0), 20.0);
    }
}
