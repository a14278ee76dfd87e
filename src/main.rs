// Copyright (c) 2026 rezky_nightky

mod config;
mod field;
mod frame;
mod glyph;
mod surface;
mod terminal;

use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use crossterm::style::Color;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::Args;
use crate::field::{GlyphField, CELL_H, CELL_W};
use crate::frame::Frame;
use crate::surface::FrameSurface;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const BG: Option<Color> = Some(Color::Rgb { r: 0, g: 0, b: 0 });

// Guards against suspend/resume gaps mass-expiring the field; a normal
// frame delivers a couple dozen milliseconds.
const MAX_ELAPSED_MS: i32 = 500;

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn make_field(cols: u16, rows: u16, seed: Option<u64>) -> GlyphField {
    let width = cols as f32 * CELL_W;
    let height = rows as f32 * CELL_H;
    match seed {
        Some(s) => GlyphField::with_seed(width, height, s),
        None => GlyphField::new(width, height),
    }
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let args = Args::parse();

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args.duration.map(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s > 0.0 {
            return require_f64_range("--duration", s, 0.1, 86400.0);
        }
        s
    });

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;

    let mut field = make_field(w, h, args.seed);
    let mut frame = Frame::new(w, h, BG);
    let mut paused = false;
    let mut running = true;

    let start_time = Instant::now();
    let end_time = duration_s.and_then(|s| {
        if s <= 0.0 {
            return None;
        }
        Some(start_time + Duration::from_secs_f64(s))
    });

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();
    let mut last_tick = Instant::now();

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }
                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => running = false,
                            KeyCode::Char(' ') => {
                                field.reset();
                                frame = Frame::new(frame.width, frame.height, BG);
                            }
                            KeyCode::Char('p') => paused = !paused,
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            field = make_field(nw, nh, args.seed);
            frame = Frame::new(nw, nh, BG);
        }

        let elapsed_ms = (last_tick.elapsed().as_millis() as i32).min(MAX_ELAPSED_MS);
        last_tick = Instant::now();

        if !paused {
            field.update(elapsed_ms);
            let mut surface = FrameSurface::new(&mut frame, CELL_W, CELL_H);
            field.draw(&mut surface);
        }

        if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
            term.draw(&mut frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    Ok(())
}
