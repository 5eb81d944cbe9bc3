/// TileGrid: dense spatial index of the static solid tiles of a level.
///
/// A cell holds a tile iff that tile is solid. Everything else
/// (decoration, hazards, platform spawners) lives outside the grid.
/// Built once at load; there is no mutation API afterwards, so the grid can
/// be shared freely by every query within a tick.
///
/// ## Coordinates
///
///   world (px)  →  cell:  `floor(world / tile_size)`
///
/// Out-of-range queries return `None` rather than failing.

use log::debug;

use super::geom::Rect;
use super::tile::Tile;

/// Default broad-phase neighbourhood radius, in tiles.
pub const DEFAULT_RADIUS: i32 = 2;

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<Vec<Option<Tile>>>,
}

impl TileGrid {
    /// Build the grid from the level's placed tiles. Non-solid tiles and
    /// tiles outside `width × height` are not indexed.
    pub fn new(width: usize, height: usize, tile_size: f32, tiles: Vec<Tile>) -> Self {
        let mut cells = vec![vec![None; width]; height];
        let mut skipped = 0usize;
        for tile in tiles {
            let (x, y) = tile.cell;
            if x >= width || y >= height || !tile.is_solid() {
                skipped += 1;
                continue;
            }
            cells[y][x] = Some(tile);
        }
        if skipped > 0 {
            debug!("tile grid {width}x{height}: {skipped} non-solid tiles left out");
        }
        TileGrid { width, height, tile_size, cells }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn tile_size(&self) -> f32 { self.tile_size }

    /// Level extent in world pixels.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    /// Grid cell containing a world point, if in range.
    pub fn world_to_cell(&self, world_x: f32, world_y: f32) -> Option<(usize, usize)> {
        let gx = (world_x / self.tile_size).floor();
        let gy = (world_y / self.tile_size).floor();
        if gx < 0.0 || gy < 0.0 {
            return None;
        }
        let (gx, gy) = (gx as usize, gy as usize);
        if gx >= self.width || gy >= self.height {
            return None;
        }
        Some((gx, gy))
    }

    /// Tile at a world coordinate, or `None` (empty or out of range).
    pub fn tile_at(&self, world_x: f32, world_y: f32) -> Option<&Tile> {
        let (gx, gy) = self.world_to_cell(world_x, world_y)?;
        self.cells[gy][gx].as_ref()
    }

    /// Tile at a signed cell coordinate, or `None`.
    pub fn tile_at_cell(&self, gx: i32, gy: i32) -> Option<&Tile> {
        if gx < 0 || gy < 0 {
            return None;
        }
        self.cells.get(gy as usize)?.get(gx as usize)?.as_ref()
    }

    /// Is the cell solid? Out-of-range cells are not.
    #[inline]
    pub fn is_solid_cell(&self, gx: i32, gy: i32) -> bool {
        self.tile_at_cell(gx, gy).is_some()
    }

    /// Broad-phase: every indexed tile in the `(2r+1)²` square of cells
    /// around the centre of `area`.
    pub fn tiles_near(&self, area: &Rect, radius: i32) -> impl Iterator<Item = &Tile> + '_ {
        let c = area.center();
        let cx = (c.x / self.tile_size).floor() as i32;
        let cy = (c.y / self.tile_size).floor() as i32;
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dx| self.tile_at_cell(cx + dx, cy + dy))
        })
    }

    /// Any indexed tile whose hitbox overlaps `area`. Scans exactly the cells
    /// `area` covers, plus one ring for sub-cell hitbox offsets.
    pub fn any_solid_overlapping(&self, area: &Rect) -> bool {
        let ts = self.tile_size;
        let x0 = (area.left() / ts).floor() as i32 - 1;
        let x1 = (area.right() / ts).floor() as i32 + 1;
        let y0 = (area.top() / ts).floor() as i32 - 1;
        let y1 = (area.bottom() / ts).floor() as i32 + 1;
        for gy in y0..=y1 {
            for gx in x0..=x1 {
                if let Some(t) = self.tile_at_cell(gx, gy) {
                    if t.hitbox.overlaps(area) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

// ══════════════════════════════════════════════════════════════
// Test support
// ══════════════════════════════════════════════════════════════

/// Build a grid from ASCII rows: `#` solid block, `_` pressure plate,
/// anything else empty. Shared by the unit tests of the other modules.
#[cfg(test)]
pub(crate) fn grid_from(rows: &[&str], tile_size: f32) -> TileGrid {
    use super::tile::{CollisionKind, HitboxFrac, TileMeta, TileType};

    let height = rows.len();
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut tiles = vec![];
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let (collision, kind) = match ch {
                '#' => (CollisionKind::Solid, TileType::Block),
                '_' => (CollisionKind::PressurePlate, TileType::PressurePlate),
                _ => continue,
            };
            tiles.push(Tile {
                id: 1,
                cell: (x, y),
                collision,
                kind,
                hitbox: HitboxFrac::default().in_cell(x, y, tile_size),
                meta: TileMeta::default(),
            });
        }
    }
    TileGrid::new(width, height, tile_size, tiles)
}
