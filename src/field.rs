// Copyright (c) 2026 rezky_nightky

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    Rng, SeedableRng,
};

use crate::glyph::{new_symbol, Glyph, GlyphKind};
use crate::surface::{DrawSurface, Rect, Rgb, TextFlip};

/// Pixel width of one glyph cell.
pub const CELL_W: f32 = 20.0;
/// Pixel height of one glyph cell; headers drop by exactly this much.
pub const CELL_H: f32 = 20.0;

/// Headers advance one cell every time this much simulated time accumulates.
const DROP_INTERVAL_MS: i32 = 120;

/// Spawn-check draws at or below this value add a new header.
const SPAWN_THRESHOLD: i32 = 18;

/// Owns every live glyph and advances the rain one frame at a time.
///
/// The host calls `update` with the elapsed milliseconds, then `draw` with a
/// surface; both run on one thread and nothing here can fail.
pub struct GlyphField {
    width: f32,
    height: f32,

    glyphs: Vec<Glyph>,
    drop_accumulator_ms: i32,
    total_elapsed_ms: u64,

    mt: StdRng,
    rand_green: Uniform<u8>,
    rand_blue: Uniform<u8>,
    rand_symbol_delay: Uniform<i32>,
    rand_pct: Uniform<i32>,
}

impl GlyphField {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_rng(width, height, StdRng::from_os_rng())
    }

    pub fn with_seed(width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: f32, height: f32, mt: StdRng) -> Self {
        Self {
            width,
            height,
            glyphs: Vec::new(),
            drop_accumulator_ms: 0,
            total_elapsed_ms: 0,
            mt,
            rand_green: Uniform::new(128, 224).expect("valid range"),
            rand_blue: Uniform::new(16, 48).expect("valid range"),
            rand_symbol_delay: Uniform::new(300, 550).expect("valid range"),
            rand_pct: Uniform::new(0, 100).expect("valid range"),
        }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn drop_accumulator_ms(&self) -> i32 {
        self.drop_accumulator_ms
    }

    /// Clears the rain back to an empty field with fresh clocks.
    pub fn reset(&mut self) {
        self.glyphs.clear();
        self.drop_accumulator_ms = 0;
        self.total_elapsed_ms = 0;
    }

    /// Advances every glyph by `elapsed_ms` of simulated time.
    ///
    /// Two-pass: the sweep over live glyphs only records expirations and
    /// trailer candidates, then removals and insertions are committed after
    /// it, so the collection is never mutated mid-iteration.
    pub fn update(&mut self, elapsed_ms: i32) {
        let elapsed = elapsed_ms.max(0);
        self.total_elapsed_ms += elapsed as u64;
        self.drop_accumulator_ms += elapsed;

        let mut trailers: Vec<Glyph> = Vec::new();
        let mut expired: Vec<usize> = Vec::new();

        for i in 0..self.glyphs.len() {
            let g = &mut self.glyphs[i];
            g.lifespan_ms -= elapsed;
            g.color_timer_ms += elapsed;
            g.symbol_timer_ms += elapsed;

            // Expiry looks at the position before any movement this frame.
            if g.pos.y > self.height || g.lifespan_ms <= 0 {
                expired.push(i);
                continue;
            }

            match g.kind {
                GlyphKind::Header => {
                    if self.drop_accumulator_ms >= DROP_INTERVAL_MS {
                        g.symbol = new_symbol(&mut self.mt);
                        trailers.push(Glyph::new_trailer(
                            &mut self.mt,
                            g.pos.x,
                            g.pos.y,
                            g.trailer_seed_ms,
                        ));
                        g.pos.y += CELL_H;
                    }
                }
                GlyphKind::Trailer => {
                    // A zero timer makes the roll range empty; that counts
                    // as "no change this frame", not an error.
                    if g.color_timer_ms > 0
                        && self.mt.random_range(0..g.color_timer_ms) > g.color_delay_ms
                    {
                        g.color_timer_ms %= g.color_delay_ms;
                        g.color = Rgb {
                            r: 0,
                            g: self.rand_green.sample(&mut self.mt),
                            b: self.rand_blue.sample(&mut self.mt),
                        };
                    }

                    if g.symbol_timer_ms > 0
                        && self.mt.random_range(0..g.symbol_timer_ms) > g.symbol_delay_ms
                    {
                        g.symbol_timer_ms %= g.symbol_delay_ms;
                        g.symbol = new_symbol(&mut self.mt);
                    }
                }
            }
        }

        self.drop_accumulator_ms %= DROP_INTERVAL_MS;

        // Order is irrelevant, so swap_remove from the back is safe.
        for &i in expired.iter().rev() {
            self.glyphs.swap_remove(i);
        }

        for mut t in trailers {
            t.color = Rgb {
                r: 0,
                g: self.rand_green.sample(&mut self.mt),
                b: self.rand_blue.sample(&mut self.mt),
            };
            t.symbol_delay_ms = self.rand_symbol_delay.sample(&mut self.mt);
            // One in five candidates is dropped to keep the trails sparse.
            if self.rand_pct.sample(&mut self.mt) < 80 {
                self.glyphs.push(t);
            }
        }

        self.spawn_check();
    }

    /// Maybe starts a new column. The roll is bounded by the total clock
    /// modulo one second; an empty bound means no spawn this frame.
    fn spawn_check(&mut self) {
        let bound = (self.total_elapsed_ms % 1000) as i32;
        if bound == 0 || self.mt.random_range(0..bound) > SPAWN_THRESHOLD {
            return;
        }

        let columns = (self.width / CELL_W).floor() as i32;
        let column = self.mt.random_range(0..=columns);
        let x = column as f32 * CELL_W - 5.0;
        let header = Glyph::new_header(&mut self.mt, x, -CELL_H);
        self.glyphs.push(header);
    }

    /// Emits two draw calls per glyph: a one-cell blackout rect whose
    /// bottom-right corner sits at the glyph position, then the symbol at
    /// that position, half-turn rotated and horizontally flipped.
    pub fn draw<S: DrawSurface>(&self, surface: &mut S) {
        for g in &self.glyphs {
            surface.fill_rect(
                Rect {
                    x: g.pos.x - CELL_W,
                    y: g.pos.y - CELL_H,
                    w: CELL_W,
                    h: CELL_H,
                },
                Rgb { r: 0, g: 0, b: 0 },
            );
            surface.draw_text(
                g.symbol,
                g.pos,
                g.color,
                std::f32::consts::PI,
                TextFlip::Horizontal,
                1.0,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::HEADER_COLOR;
    use crate::surface::Vec2;

    fn seeded(width: f32, height: f32) -> GlyphField {
        GlyphField::with_seed(width, height, 0x1234567)
    }

    fn test_header(x: f32, lifespan_ms: i32, trailer_seed_ms: i32) -> Glyph {
        Glyph {
            pos: Vec2 { x, y: 0.0 },
            kind: GlyphKind::Header,
            lifespan_ms,
            trailer_seed_ms,
            color: HEADER_COLOR,
            color_timer_ms: 0,
            color_delay_ms: 225,
            symbol: 'M',
            symbol_timer_ms: 0,
            symbol_delay_ms: 850,
        }
    }

    fn test_trailer(x: f32, y: f32, lifespan_ms: i32) -> Glyph {
        Glyph {
            pos: Vec2 { x, y },
            kind: GlyphKind::Trailer,
            lifespan_ms,
            trailer_seed_ms: 0,
            color: HEADER_COLOR,
            color_timer_ms: 0,
            color_delay_ms: 225,
            symbol: 'M',
            symbol_timer_ms: 0,
            symbol_delay_ms: 850,
        }
    }

    // Spawned headers sit at x = column * 20 - 5, so a fractional x marks
    // a glyph we planted ourselves.
    const PLANTED_X: f32 = 1234.5;

    #[test]
    fn lifespan_counts_down_until_removal() {
        let mut field = seeded(2000.0, 1_000_000.0);
        let header = Glyph::new_header(&mut field.mt, PLANTED_X, 0.0);
        let mut prev = header.lifespan_ms;
        field.glyphs.push(header);

        let mut removed = false;
        for _ in 0..400 {
            field.update(50);
            match field
                .glyphs
                .iter()
                .find(|g| g.kind == GlyphKind::Header && g.pos.x == PLANTED_X)
            {
                Some(g) => {
                    assert!(g.lifespan_ms < prev);
                    prev = g.lifespan_ms;
                }
                None => {
                    removed = true;
                    break;
                }
            }
        }
        assert!(removed, "header should expire within its lifespan bound");
    }

    #[test]
    fn header_moves_one_cell_per_drop_event() {
        let mut field = seeded(1000.0, 1_000_000.0);
        field.glyphs.push(test_header(PLANTED_X, 1_000_000, 600_000));

        // Half an interval accumulated: no movement yet.
        field.update(60);
        let y = |field: &GlyphField| {
            field
                .glyphs
                .iter()
                .find(|g| g.kind == GlyphKind::Header && g.pos.x == PLANTED_X)
                .map(|g| g.pos.y)
                .expect("planted header present")
        };
        assert_eq!(y(&field), 0.0);
        assert_eq!(field.drop_accumulator_ms(), 60);

        // Interval reached: exactly one cell down, accumulator wraps.
        field.update(60);
        assert_eq!(y(&field), CELL_H);
        assert_eq!(field.drop_accumulator_ms(), 0);

        for i in 2..10 {
            field.update(120);
            assert_eq!(y(&field), i as f32 * CELL_H);
        }
    }

    #[test]
    fn drop_event_emits_at_most_one_trailer_at_the_old_position() {
        let mut field = seeded(1000.0, 1_000_000.0);
        field.glyphs.push(test_header(PLANTED_X, 1_000_000, 600_000));

        field.update(120);
        let trailers: Vec<&Glyph> = field
            .glyphs
            .iter()
            .filter(|g| g.kind == GlyphKind::Trailer)
            .collect();
        assert!(trailers.len() <= 1);
        for t in trailers {
            assert_eq!(t.pos, Vec2 { x: PLANTED_X, y: 0.0 });
            assert_eq!(t.lifespan_ms, 600_000);
            assert_eq!(t.color.r, 0);
            assert!((128u8..224).contains(&t.color.g));
            assert!((16u8..48).contains(&t.color.b));
            assert!((300..550).contains(&t.symbol_delay_ms));
        }
    }

    #[test]
    fn trailer_never_moves() {
        let mut field = seeded(1000.0, 1_000_000.0);
        field.glyphs.push(test_trailer(PLANTED_X, 40.0, 1_000_000));

        for _ in 0..100 {
            field.update(16);
            let t = field
                .glyphs
                .iter()
                .find(|g| g.kind == GlyphKind::Trailer && g.pos.x == PLANTED_X)
                .expect("planted trailer present");
            assert_eq!(t.pos, Vec2 { x: PLANTED_X, y: 40.0 });
        }
    }

    #[test]
    fn trailer_retention_converges_to_eighty_percent() {
        let mut field = seeded(100.0, 1_000_000.0);
        let mut kept = 0usize;
        for _ in 0..10_000 {
            field.glyphs.clear();
            field.drop_accumulator_ms = 0;
            field.glyphs.push(test_header(PLANTED_X, 1_000_000, 500));
            field.update(120);
            kept += field
                .glyphs
                .iter()
                .filter(|g| g.kind == GlyphKind::Trailer)
                .count();
        }
        assert!(
            (7700..=8300).contains(&kept),
            "kept {} of 10000 trailers",
            kept
        );
    }

    #[test]
    fn glyph_below_the_bottom_edge_is_removed_regardless_of_lifespan() {
        let mut field = seeded(100.0, 100.0);
        field.glyphs.push(test_trailer(PLANTED_X, 150.0, 1_000_000));
        field.update(10);
        assert!(!field.glyphs.iter().any(|g| g.kind == GlyphKind::Trailer));
    }

    #[test]
    fn zero_timers_change_nothing_and_do_not_panic() {
        let mut field = seeded(100.0, 100.0);
        field.glyphs.push(test_trailer(40.0, 40.0, 500));

        field.update(0);

        assert_eq!(field.glyphs.len(), 1);
        let t = &field.glyphs[0];
        assert_eq!(t.color, HEADER_COLOR);
        assert_eq!(t.symbol, 'M');
        assert_eq!(t.pos, Vec2 { x: 40.0, y: 40.0 });
        // Total clock still at zero: the spawn bound is degenerate too.
        assert_eq!(field.drop_accumulator_ms(), 0);
    }

    #[test]
    fn first_update_on_an_empty_field() {
        let mut a = GlyphField::with_seed(100.0, 100.0, 9);
        let mut b = GlyphField::with_seed(100.0, 100.0, 9);
        a.update(130);
        b.update(130);

        assert_eq!(a.drop_accumulator_ms(), 10);
        assert!(!a.glyphs.iter().any(|g| g.kind == GlyphKind::Trailer));
        let headers = a
            .glyphs
            .iter()
            .filter(|g| g.kind == GlyphKind::Header)
            .count();
        assert!(headers <= 1);
        for g in &a.glyphs {
            assert_eq!(g.pos.y, -CELL_H);
            let column = (g.pos.x + 5.0) / CELL_W;
            assert_eq!(column, column.floor());
            assert!((0.0..=5.0).contains(&column));
        }

        // Same seed, same outcome.
        assert_eq!(a.glyphs, b.glyphs);
        assert_eq!(a.drop_accumulator_ms(), b.drop_accumulator_ms());
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        Rect(Rect, Rgb),
        Text(char, Vec2, Rgb, f32, TextFlip, f32),
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<Call>,
    }

    impl DrawSurface for RecordingSurface {
        fn fill_rect(&mut self, rect: Rect, color: Rgb) {
            self.calls.push(Call::Rect(rect, color));
        }

        fn draw_text(
            &mut self,
            ch: char,
            pos: Vec2,
            color: Rgb,
            rotation_radians: f32,
            flip: TextFlip,
            scale: f32,
        ) {
            self.calls
                .push(Call::Text(ch, pos, color, rotation_radians, flip, scale));
        }
    }

    #[test]
    fn draw_emits_blackout_then_symbol_and_mutates_nothing() {
        let mut field = seeded(1000.0, 1_000_000.0);
        field.glyphs.push(test_header(115.0, 1_000_000, 600_000));
        field.glyphs.push(test_trailer(35.0, 60.0, 1_000_000));
        field.update(16);

        let before = field.glyphs.clone();
        let accumulator = field.drop_accumulator_ms();

        let mut surface = RecordingSurface::default();
        field.draw(&mut surface);

        assert_eq!(field.glyphs, before);
        assert_eq!(field.drop_accumulator_ms(), accumulator);

        assert_eq!(surface.calls.len(), before.len() * 2);
        for (g, pair) in before.iter().zip(surface.calls.chunks(2)) {
            assert_eq!(
                pair[0],
                Call::Rect(
                    Rect {
                        x: g.pos.x - CELL_W,
                        y: g.pos.y - CELL_H,
                        w: CELL_W,
                        h: CELL_H,
                    },
                    Rgb { r: 0, g: 0, b: 0 },
                )
            );
            assert_eq!(
                pair[1],
                Call::Text(
                    g.symbol,
                    g.pos,
                    g.color,
                    std::f32::consts::PI,
                    TextFlip::Horizontal,
                    1.0,
                )
            );
        }
    }
}
