// Copyright (c) 2026 the velarain authors

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};
use crate::palette::{BoldMode, FadeRamp, Rgba};
use crate::surface::{Host, Surface, SurfaceId, SURFACE_ID};

// Glyph grid standing in for a canvas; pixel coordinates land on cells by
// dividing through the glyph size.
pub struct RainCanvas {
    id: SurfaceId,
    glyph_px: u32,
    frame: Frame,
}

impl RainCanvas {
    fn new(glyph_px: u32, levels: u8) -> Self {
        Self {
            id: SurfaceId(1),
            glyph_px: glyph_px.max(1),
            frame: Frame::new(0, 0, levels),
        }
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}

impl Surface for RainCanvas {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        let cols = (width / self.glyph_px).min(u16::MAX as u32) as u16;
        let rows = (height / self.glyph_px).min(u16::MAX as u32) as u16;
        self.frame = Frame::new(cols, rows, self.frame.levels());
    }

    fn fill(&mut self, _color: Rgba) -> Result<()> {
        // The wash amount and trail colors are baked into the fade ramp, so
        // the color argument carries nothing the grid still needs.
        self.frame.wash();
        Ok(())
    }

    fn draw_glyph(&mut self, x: u32, y: u32, ch: char, _color: Rgba, size: u32) -> Result<()> {
        let g = size.max(1);
        if let (Ok(cx), Ok(cy)) = (u16::try_from(x / g), u16::try_from(y / g)) {
            self.frame.stamp(cx, cy, ch);
        }
        Ok(())
    }
}

// Reports the viewport in pixels, one glyph per cell, so a one-glyph step
// in the animation falls exactly one row.
pub struct TermHost {
    glyph_px: u32,
    cols: u16,
    rows: u16,
    canvas: RainCanvas,
}

impl TermHost {
    pub fn new(glyph_px: u32, levels: u8, cols: u16, rows: u16) -> Self {
        Self {
            glyph_px: glyph_px.max(1),
            cols,
            rows,
            canvas: RainCanvas::new(glyph_px, levels),
        }
    }

    pub fn set_term_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.canvas.frame_mut()
    }
}

impl Host for TermHost {
    fn viewport(&self) -> (u32, u32) {
        (
            self.cols as u32 * self.glyph_px,
            self.rows as u32 * self.glyph_px,
        )
    }

    fn surface(&mut self, id: &str) -> Option<&mut dyn Surface> {
        // A zero-area window has nowhere to mount the canvas.
        if id != SURFACE_ID || self.cols == 0 || self.rows == 0 {
            return None;
        }
        Some(&mut self.canvas)
    }
}

fn cell_style(cell: Cell, ramp: &FadeRamp, bold_mode: BoldMode) -> (Option<Color>, bool) {
    let fg = ramp.color_for(cell.level);
    let bold = match bold_mode {
        BoldMode::Off => false,
        BoldMode::Head => cell.level == 0,
        BoldMode::All => cell.level < ramp.levels(),
    };
    (fg, bold)
}

struct LastScreen {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastScreen {
    fn new(width: u16, height: u16, levels: u8) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank(levels); len],
        }
    }
}

pub struct Terminal {
    stdout: Stdout,
    last: Option<LastScreen>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
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
            let _ = out.execute(SetAttribute(Attribute::Reset));
            let _ = out.execute(ResetColor);
            let _ = out.execute(cursor::Show);
            let _ = out.execute(terminal::EnableLineWrap);
            let _ = out.execute(terminal::LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
            let _ = out.flush();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
            run_buf: String::with_capacity(64),
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
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

    pub fn draw(&mut self, frame: &mut Frame, ramp: &FadeRamp, bold_mode: BoldMode) -> Result<()> {
        let mut cur_fg: Option<Color> = None;
        let mut cur_bold = false;
        let mut cur_pos: Option<(u16, u16)> = None;

        let needs_full_redraw = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);

        if needs_full_redraw {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
        }

        // The background is uniform across the grid; set it once per flush.
        let bg = ramp.background().unwrap_or(Color::Reset);
        self.stdout.queue(SetBackgroundColor(bg))?;

        let can_reuse_last = !needs_full_redraw && self.last.is_some();
        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_count = frame.dirty_indices().len();
        let dirty_is_large = total_cells > 0 && dirty_count >= (total_cells / 3);
        let do_full_redraw = !can_reuse_last || frame.is_dirty_all() || dirty_is_large;

        if do_full_redraw {
            if needs_full_redraw {
                self.last = Some(LastScreen::new(frame.width, frame.height, frame.levels()));
            }
            let last = self.last.as_mut().expect("set above");

            for y in 0..frame.height {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                for x in 0..frame.width {
                    let idx = y as usize * frame.width as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    let (fg, bold) = cell_style(cell, ramp, bold_mode);

                    if fg != cur_fg {
                        self.stdout
                            .queue(SetForegroundColor(fg.unwrap_or(Color::Reset)))?;
                        cur_fg = fg;
                    }
                    if bold != cur_bold {
                        self.stdout.queue(SetAttribute(if bold {
                            Attribute::Bold
                        } else {
                            Attribute::NormalIntensity
                        }))?;
                        cur_bold = bold;
                    }

                    self.stdout.queue(Print(cell.ch))?;
                    last.cells[idx] = cell;
                }
            }

            self.stdout.queue(SetAttribute(Attribute::Reset))?;
            self.stdout.queue(ResetColor)?;
            self.stdout.flush()?;

            frame.clear_dirty();
            return Ok(());
        }

        let last = self.last.as_mut().expect("checked above");

        let dirty = frame.dirty_indices();
        let width_usize = frame.width as usize;
        let run_buf = &mut self.run_buf;

        if self.row_dirty.len() != frame.height as usize {
            self.row_dirty = vec![Vec::new(); frame.height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in dirty {
            let y = (idx / width_usize) as u16;
            if y >= frame.height {
                continue;
            }
            let b = &mut self.row_dirty[y as usize];
            if b.is_empty() {
                self.touched_rows.push(y);
            }
            b.push(idx);
        }

        self.touched_rows.sort_unstable();

        for y0 in self.touched_rows.iter().copied() {
            let b = &mut self.row_dirty[y0 as usize];
            if b.len() > 1 {
                b.sort_unstable();
            }
            let mut i = 0usize;
            while i < b.len() {
                let idx0 = b[i];
                let cell0 = frame.cell_at_index(idx0);
                if last.cells.get(idx0).copied() == Some(cell0) {
                    i += 1;
                    continue;
                }

                last.cells[idx0] = cell0;

                let x0 = (idx0 % width_usize) as u16;
                let (fg0, bold0) = cell_style(cell0, ramp, bold_mode);

                run_buf.clear();
                run_buf.push(cell0.ch);
                let mut run_len: u16 = 1;
                let mut last_idx_in_run = idx0;
                let mut j = i + 1;

                // Batch consecutive same-level cells into one print.
                while j < b.len() {
                    let idx1 = b[j];
                    if idx1 != last_idx_in_run + 1 {
                        break;
                    }

                    let cell1 = frame.cell_at_index(idx1);
                    if last.cells.get(idx1).copied() == Some(cell1) {
                        break;
                    }
                    if cell1.level != cell0.level {
                        break;
                    }

                    run_buf.push(cell1.ch);
                    last.cells[idx1] = cell1;
                    run_len = run_len.saturating_add(1);
                    last_idx_in_run = idx1;
                    j += 1;
                }

                if cur_pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }

                if fg0 != cur_fg {
                    self.stdout
                        .queue(SetForegroundColor(fg0.unwrap_or(Color::Reset)))?;
                    cur_fg = fg0;
                }
                if bold0 != cur_bold {
                    self.stdout.queue(SetAttribute(if bold0 {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    }))?;
                    cur_bold = bold0;
                }

                self.stdout.queue(Print(run_buf.as_str()))?;
                let next_x = x0.saturating_add(run_len);
                cur_pos = if next_x < frame.width {
                    Some((next_x, y0))
                } else {
                    None
                };

                i = j;
            }
            b.clear();
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
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

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 0.75,
    };

    #[test]
    fn canvas_maps_pixels_to_cells() {
        let mut canvas = RainCanvas::new(14, 4);
        canvas.set_buffer_size(140, 70);
        assert_eq!((canvas.frame.width, canvas.frame.height), (10, 5));

        canvas.draw_glyph(28, 14, 'x', INK, 14).unwrap();
        assert_eq!(canvas.frame.get(2, 1), Some(&Cell { ch: 'x', level: 0 }));
    }

    #[test]
    fn glyphs_past_the_bottom_edge_are_clipped() {
        let mut canvas = RainCanvas::new(14, 4);
        canvas.set_buffer_size(140, 70);
        canvas.draw_glyph(0, 700, 'x', INK, 14).unwrap();
        canvas.draw_glyph(0, u32::MAX, 'x', INK, 1).unwrap();

        let live = (0..5u16).any(|y| canvas.frame.get(0, y).map(|c| c.ch != ' ').unwrap_or(false));
        assert!(!live);
    }

    #[test]
    fn fill_ages_stamped_glyphs() {
        let mut canvas = RainCanvas::new(14, 2);
        canvas.set_buffer_size(14, 14);
        canvas.draw_glyph(0, 0, 'x', INK, 14).unwrap();
        canvas.fill(INK).unwrap();
        assert_eq!(canvas.frame.get(0, 0), Some(&Cell { ch: 'x', level: 1 }));
        canvas.fill(INK).unwrap();
        assert_eq!(canvas.frame.get(0, 0), Some(&Cell::blank(2)));
    }

    #[test]
    fn resizing_the_buffer_discards_content() {
        let mut canvas = RainCanvas::new(14, 4);
        canvas.set_buffer_size(140, 70);
        canvas.draw_glyph(0, 0, 'x', INK, 14).unwrap();
        canvas.set_buffer_size(140, 70);
        assert_eq!(canvas.frame.get(0, 0), Some(&Cell::blank(4)));
    }

    #[test]
    fn host_reports_the_viewport_in_pixels() {
        let host = TermHost::new(14, 4, 80, 24);
        assert_eq!(host.viewport(), (1120, 336));
    }

    #[test]
    fn host_hides_the_surface_at_zero_size() {
        let mut host = TermHost::new(14, 4, 0, 24);
        assert!(host.surface(SURFACE_ID).is_none());
        host.set_term_size(80, 24);
        assert!(host.surface(SURFACE_ID).is_some());
    }

    #[test]
    fn host_only_answers_to_the_mounted_id() {
        let mut host = TermHost::new(14, 4, 80, 24);
        assert!(host.surface("another-surface").is_none());
        assert!(host.surface(SURFACE_ID).is_some());
    }
}
