// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }
}

/// Off-screen cell buffer with dirty-cell tracking, so the terminal writer
/// only touches cells that actually changed since the last flush.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(bg); len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }
        for &i in &self.dirty {
            self.dirty_map[i] = false;
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells[i]
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tracks_dirty_cells_once() {
        let mut f = Frame::new(4, 2, None);
        f.clear_dirty();

        let cell = Cell {
            ch: 'x',
            fg: None,
            bg: None,
            bold: true,
        };
        f.set(1, 1, cell);
        f.set(1, 1, cell);
        assert_eq!(f.dirty_indices(), &[5]);
        assert_eq!(f.get(1, 1).unwrap().ch, 'x');

        f.clear_dirty();
        assert!(f.dirty_indices().is_empty());
    }

    #[test]
    fn out_of_bounds_set_is_ignored() {
        let mut f = Frame::new(2, 2, None);
        f.clear_dirty();
        f.set(2, 0, Cell::blank_with_bg(None));
        f.set(0, 2, Cell::blank_with_bg(None));
        assert!(f.dirty_indices().is_empty());
    }
}
