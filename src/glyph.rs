// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng};

use crate::surface::{Rgb, Vec2};

/// Color every header keeps for its whole life. Trailers get their first
/// color change the moment they are committed to the field.
pub const HEADER_COLOR: Rgb = Rgb {
    r: 183,
    g: 255,
    b: 235,
};

const COLOR_DELAY_MS: i32 = 225;
const SYMBOL_DELAY_MS: i32 = 850;

const SYMBOL_LOW: u8 = 68;
const SYMBOL_HIGH: u8 = 127;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphKind {
    Header,
    Trailer,
}

/// One falling (header) or fading (trailer) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub pos: Vec2,
    pub kind: GlyphKind,
    /// Countdown; the glyph is removed once this reaches zero.
    pub lifespan_ms: i32,
    /// Lifespan handed to every trailer this header drops. Fixed at
    /// construction to [50%, 75%) of the header's own lifespan.
    pub trailer_seed_ms: i32,
    pub color: Rgb,
    pub color_timer_ms: i32,
    pub color_delay_ms: i32,
    pub symbol: char,
    pub symbol_timer_ms: i32,
    pub symbol_delay_ms: i32,
}

impl Glyph {
    pub fn new_header(mt: &mut StdRng, x: f32, y: f32) -> Self {
        let lifespan = mt.random_range(1500..15000);
        let trailer_seed = mt.random_range(lifespan / 2..lifespan * 3 / 4);
        Self {
            pos: Vec2 { x, y },
            kind: GlyphKind::Header,
            lifespan_ms: lifespan,
            trailer_seed_ms: trailer_seed,
            color: HEADER_COLOR,
            color_timer_ms: 0,
            color_delay_ms: COLOR_DELAY_MS,
            symbol: new_symbol(mt),
            symbol_timer_ms: 0,
            symbol_delay_ms: SYMBOL_DELAY_MS,
        }
    }

    pub fn new_trailer(mt: &mut StdRng, x: f32, y: f32, lifespan_ms: i32) -> Self {
        Self {
            pos: Vec2 { x, y },
            kind: GlyphKind::Trailer,
            lifespan_ms,
            trailer_seed_ms: 0,
            color: HEADER_COLOR,
            color_timer_ms: 0,
            color_delay_ms: COLOR_DELAY_MS,
            symbol: new_symbol(mt),
            symbol_timer_ms: 0,
            symbol_delay_ms: SYMBOL_DELAY_MS,
        }
    }
}

/// One character with a code point uniform in [68, 127). Anything in range
/// is acceptable output, non-printables included.
pub fn new_symbol(mt: &mut StdRng) -> char {
    char::from(mt.random_range(SYMBOL_LOW..SYMBOL_HIGH))
}
