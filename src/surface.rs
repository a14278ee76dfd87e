// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::frame::{Cell, Frame};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFlip {
    #[allow(dead_code)]
    None,
    Horizontal,
}

/// Drawing boundary the simulation renders through. Backends that cannot
/// express rotation, flipping or scaling may accept and drop them.
pub trait DrawSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        ch: char,
        pos: Vec2,
        color: Rgb,
        rotation_radians: f32,
        flip: TextFlip,
        scale: f32,
    );
}

/// Maps pixel-space draw calls onto terminal character cells, one cell per
/// glyph cell. A glyph rotated half a turn around its anchor lands in the
/// cell above-left of the anchor, which is the cell its blackout rect covers.
pub struct FrameSurface<'a> {
    frame: &'a mut Frame,
    cell_w: f32,
    cell_h: f32,
}

impl<'a> FrameSurface<'a> {
    pub fn new(frame: &'a mut Frame, cell_w: f32, cell_h: f32) -> Self {
        Self {
            frame,
            cell_w,
            cell_h,
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let cx = (x / self.cell_w).round();
        let cy = (y / self.cell_h).round();
        if cx < 0.0 || cy < 0.0 || cx > u16::MAX as f32 || cy > u16::MAX as f32 {
            return None;
        }
        Some((cx as u16, cy as u16))
    }
}

impl DrawSurface for FrameSurface<'_> {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let bg = Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        };
        if let Some((cx, cy)) = self.cell_of(rect.x, rect.y) {
            self.frame.set(cx, cy, Cell::blank_with_bg(Some(bg)));
        }
    }

    fn draw_text(
        &mut self,
        ch: char,
        pos: Vec2,
        color: Rgb,
        rotation_radians: f32,
        _flip: TextFlip,
        _scale: f32,
    ) {
        // Half-turn rotation about the anchor shifts the glyph one cell
        // up and to the left.
        let flipped = rotation_radians.abs() > std::f32::consts::FRAC_PI_2;
        let (x, y) = if flipped {
            (pos.x - self.cell_w, pos.y - self.cell_h)
        } else {
            (pos.x, pos.y)
        };
        if let Some((cx, cy)) = self.cell_of(x, y) {
            self.frame.set(
                cx,
                cy,
                Cell {
                    ch,
                    fg: Some(Color::Rgb {
                        r: color.r,
                        g: color.g,
                        b: color.b,
                    }),
                    bg: Some(Color::Rgb { r: 0, g: 0, b: 0 }),
                    bold: false,
                },
            );
        }
    }
}
