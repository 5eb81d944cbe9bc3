/// Terminal debug overlay: double-buffered, diff-based.
///
///   1. Compose the next frame into `front`
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed, batched with
///      `queue!` and flushed once
///   4. Swap front/back
///
/// One tile is two terminal columns. Layers, bottom to top: distance
/// field digits, tiles, hazards, platforms, bodies.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::body::Life;
use crate::domain::entity::{Actor, ActorKind};
use crate::domain::geom::Rect;
use crate::sim::world::Level;

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell, so the next flush repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: Cell::BASE_BG }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg));
        }
    }

    /// One map tile: two columns.
    fn put_tile(&mut self, gx: usize, gy: usize, glyph: [char; 2], fg: Color) {
        let (col, row) = (gx * CELL_W, MAP_ROW + gy);
        self.set(col, row, Cell::new(glyph[0], fg));
        self.set(col + 1, row, Cell::new(glyph[1], fg));
    }
}

// ── Overlay ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Overlay {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    /// Draw distance field depths on empty cells.
    pub show_field: bool,
}

impl Overlay {
    pub fn new() -> Self {
        Overlay {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            show_field: true,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.fit_terminal();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Returns true when the buffers were resized.
    fn fit_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw == self.front.width && th == self.front.height {
            return false;
        }
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.back.cells.fill(Cell::INVALID);
        true
    }

    pub fn render(&mut self, level: &Level) -> io::Result<()> {
        if self.fit_terminal() {
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.compose(level);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose ──

    fn compose(&mut self, level: &Level) {
        self.front.clear();
        self.compose_hud(level);
        self.compose_map(level);
        self.compose_platforms(level);
        for actor in &level.actors {
            self.compose_actor(level, actor);
        }

        let help_row = MAP_ROW + level.grid.height() + 1;
        let help = " ←/→:move  ↑/space:jump  g:flip  f:field  q:quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey);
    }

    fn compose_hud(&mut self, level: &Level) {
        let player = level.player().map_or_else(
            || "none".to_string(),
            |p| format!("{:.0},{:.0}", p.body.rect.x, p.body.rect.y),
        );
        let hud = format!(
            " tick {:<6} gravity {:<4} bodies {:<3} field {:<4} player {}",
            level.tick,
            if level.gravity.is_inverted() { "up" } else { "down" },
            level.active_count(),
            level.field.reached(),
            player,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White);
    }

    fn compose_map(&mut self, level: &Level) {
        let grid = &level.grid;
        for gy in 0..grid.height() {
            for gx in 0..grid.width() {
                let (x, y) = (gx as i32, gy as i32);
                match grid.tile_at_cell(x, y) {
                    Some(t) if t.is_pressure_plate() => {
                        self.front.put_tile(gx, gy, ['▁', '▁'], Color::Yellow)
                    }
                    Some(_) => self.front.put_tile(gx, gy, ['█', '█'], Color::Grey),
                    None => {
                        if let Some(v) = level.value_at(x, y).filter(|_| self.show_field) {
                            let d = char::from_digit(u32::from(v % 10), 10).unwrap_or('.');
                            self.front.put_tile(gx, gy, [' ', d], Color::DarkBlue);
                        }
                    }
                }
            }
        }
        for hz in &level.hazards {
            self.front.put_tile(hz.cell.0, hz.cell.1, ['^', '^'], Color::Red);
        }
    }

    fn compose_platforms(&mut self, level: &Level) {
        let ts = level.grid.tile_size();
        for p in &level.platforms {
            for (gx, gy) in covered_cells(&p.rect, ts) {
                self.front.put_tile(gx, gy, ['=', '='], Color::Cyan);
            }
        }
    }

    fn compose_actor(&mut self, level: &Level, actor: &Actor) {
        let c = actor.center();
        let Some((gx, gy)) = level.grid.world_to_cell(c.x, c.y) else { return };
        let (glyph, fg) = match actor.body.life {
            Life::Dying { .. } => ('x', Color::DarkGrey),
            Life::Alive => glyph_for(actor.kind),
        };
        let facing = if actor.body.facing_right { '>' } else { '<' };
        let pair = if actor.kind == ActorKind::Player { [glyph, facing] } else { [glyph, ' '] };
        self.front.put_tile(gx, gy, pair, fg);
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Overlay::new()
    }
}

fn glyph_for(kind: ActorKind) -> (char, Color) {
    match kind {
        ActorKind::Player => ('@', Color::Green),
        ActorKind::Guard => ('g', Color::Red),
        ActorKind::Charger => ('C', Color::DarkRed),
        ActorKind::Drone => ('d', Color::Magenta),
        ActorKind::Battery => ('b', Color::Yellow),
        ActorKind::Turret => ('T', Color::DarkYellow),
        ActorKind::Boss => ('B', Color::Red),
    }
}

/// Grid cells a rect overlaps (strictly), clipped at zero.
fn covered_cells(r: &Rect, ts: f32) -> impl Iterator<Item = (usize, usize)> {
    let x0 = (r.left() / ts).floor().max(0.0) as usize;
    let y0 = (r.top() / ts).floor().max(0.0) as usize;
    let x1 = (r.right() / ts).ceil().max(0.0) as usize;
    let y1 = (r.bottom() / ts).ceil().max(0.0) as usize;
    (y0..y1).flat_map(move |gy| (x0..x1).map(move |gx| (gx, gy)))
}
