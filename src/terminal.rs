// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); len],
        }
    }
}

pub struct Terminal {
    stdout: Stdout,
    last: Option<LastFrame>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let mut cur_fg: Option<Color> = None;
        let mut cur_bg: Option<Color> = None;
        let mut cur_bold = false;

        let size_changed = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);

        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_is_large = total_cells > 0 && frame.dirty_indices().len() >= total_cells / 3;

        if size_changed || frame.is_dirty_all() || dirty_is_large {
            if size_changed {
                self.last = Some(LastFrame::new(frame.width, frame.height));
                self.stdout
                    .queue(terminal::Clear(terminal::ClearType::All))?;
            }
            let last = self.last.as_mut().expect("set above");

            for y in 0..frame.height {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                for x in 0..frame.width {
                    let idx = y as usize * frame.width as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    Self::queue_attrs(
                        &mut self.stdout,
                        &cell,
                        &mut cur_fg,
                        &mut cur_bg,
                        &mut cur_bold,
                    )?;
                    self.stdout.queue(Print(cell.ch))?;
                    last.cells[idx] = cell;
                }
            }
        } else {
            let last = self.last.as_mut().expect("size unchanged implies present");
            let width = frame.width as usize;

            for &idx in frame.dirty_indices() {
                let cell = frame.cell_at_index(idx);
                if last.cells.get(idx).copied() == Some(cell) {
                    continue;
                }
                last.cells[idx] = cell;

                let x = (idx % width) as u16;
                let y = (idx / width) as u16;
                self.stdout.queue(cursor::MoveTo(x, y))?;
                Self::queue_attrs(
                    &mut self.stdout,
                    &cell,
                    &mut cur_fg,
                    &mut cur_bg,
                    &mut cur_bold,
                )?;
                self.stdout.queue(Print(cell.ch))?;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn queue_attrs(
        out: &mut Stdout,
        cell: &Cell,
        cur_fg: &mut Option<Color>,
        cur_bg: &mut Option<Color>,
        cur_bold: &mut bool,
    ) -> Result<()> {
        if cell.fg != *cur_fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            *cur_fg = cell.fg;
        }
        if cell.bg != *cur_bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            *cur_bg = cell.bg;
        }
        if cell.bold != *cur_bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            *cur_bold = cell.bold;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
