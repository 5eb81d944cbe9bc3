/// DistanceField: breadth-first hop counts from a seed cell, parallel to the
/// `TileGrid`. AI bodies descend the gradient toward the seed.
///
/// ## Rebuild
///
///   seed (world px) → cell → flood fill through the 4 orthogonal
///   neighbours, entering only in-bounds non-solid cells, until depth would
///   exceed `max_depth`.
///
/// A cell is marked when it is enqueued, so the first depth it receives is
/// minimal and it is never revisited. Only the cells swept by the previous
/// rebuild are reset, keeping the cost bounded by the swept area rather
/// than the level size.
///
/// A solid or out-of-range seed leaves the whole field unreached: there is
/// no guidance this tick.

use std::collections::VecDeque;

use super::grid::TileGrid;

/// Stored value of a cell the last rebuild did not reach.
const UNREACHED: u16 = u16::MAX;

const CARDINALS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// What an AI body should do according to the field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Guidance {
    /// Move one cell by this offset.
    Step(i32, i32),
    /// Already on the seed cell.
    Arrived,
    /// Nothing reachable around: fall back to local behaviour.
    None,
}

#[derive(Clone, Debug)]
pub struct DistanceField {
    width: usize,
    height: usize,
    values: Vec<u16>,
    swept: Vec<usize>,
    queue: VecDeque<(usize, usize)>,
    seed: Option<(usize, usize)>,
}

impl DistanceField {
    pub fn new(width: usize, height: usize) -> Self {
        DistanceField {
            width,
            height,
            values: vec![UNREACHED; width * height],
            swept: Vec::new(),
            queue: VecDeque::with_capacity(256),
            seed: None,
        }
    }

    pub fn for_grid(grid: &TileGrid) -> Self {
        DistanceField::new(grid.width(), grid.height())
    }

    /// Seed cell of the last successful rebuild.
    pub fn seed(&self) -> Option<(usize, usize)> {
        self.seed
    }

    /// Number of cells the last rebuild reached.
    pub fn reached(&self) -> usize {
        self.swept.len()
    }

    fn index(&self, gx: i32, gy: i32) -> Option<usize> {
        if gx < 0 || gy < 0 || gx as usize >= self.width || gy as usize >= self.height {
            return None;
        }
        Some(gy as usize * self.width + gx as usize)
    }

    /// Depth of a cell, or `None` when unreached or out of range.
    pub fn value_at(&self, gx: i32, gy: i32) -> Option<u16> {
        let v = self.values[self.index(gx, gy)?];
        (v != UNREACHED).then_some(v)
    }

    /// Reset every swept cell to unreached.
    pub fn clear(&mut self) {
        for &i in &self.swept {
            self.values[i] = UNREACHED;
        }
        self.swept.clear();
        self.queue.clear();
        self.seed = None;
    }

    pub fn rebuild(&mut self, grid: &TileGrid, seed_x: f32, seed_y: f32, max_depth: u16) {
        self.clear();

        let Some((sx, sy)) = grid.world_to_cell(seed_x, seed_y) else { return };
        if sx >= self.width || sy >= self.height || grid.is_solid_cell(sx as i32, sy as i32) {
            return;
        }

        self.seed = Some((sx, sy));
        self.mark(sy * self.width + sx, 0);
        self.queue.push_back((sx, sy));

        while let Some((cx, cy)) = self.queue.pop_front() {
            let depth = self.values[cy * self.width + cx];
            if depth >= max_depth {
                continue;
            }
            for &(dx, dy) in &CARDINALS {
                let (nx, ny) = (cx as i32 + dx, cy as i32 + dy);
                let Some(ni) = self.index(nx, ny) else { continue };
                if self.values[ni] != UNREACHED || grid.is_solid_cell(nx, ny) {
                    continue;
                }
                self.mark(ni, depth + 1);
                self.queue.push_back((nx as usize, ny as usize));
            }
        }
    }

    fn mark(&mut self, i: usize, depth: u16) {
        self.values[i] = depth;
        self.swept.push(i);
    }

    /// Gradient step for a body standing in cell `(gx, gy)`.
    ///
    /// Samples the 8 neighbours, cardinals first. A diagonal is skipped
    /// when either flanking orthogonal cell is solid, so bodies never cut
    /// around a corner. Ties keep the earlier candidate.
    pub fn guidance(&self, grid: &TileGrid, gx: i32, gy: i32) -> Guidance {
        if self.value_at(gx, gy) == Some(0) {
            return Guidance::Arrived;
        }

        let diagonals = DIAGONALS
            .iter()
            .filter(|&&(dx, dy)| !grid.is_solid_cell(gx + dx, gy) && !grid.is_solid_cell(gx, gy + dy));

        let mut best: Option<(u16, (i32, i32))> = None;
        for &(dx, dy) in CARDINALS.iter().chain(diagonals) {
            let Some(v) = self.value_at(gx + dx, gy + dy) else { continue };
            if best.map_or(true, |(b, _)| v < b) {
                best = Some((v, (dx, dy)));
            }
        }

        match best {
            Some((_, (dx, dy))) => Guidance::Step(dx, dy),
            None => Guidance::None,
        }
    }
}
