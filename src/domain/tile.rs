/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use serde::Deserialize;
use serde_json::Value;

use super::geom::Rect;

/// How a tile participates in collision.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    Solid,
    /// Spawns a moving platform; never indexed in the grid.
    #[serde(alias = "platform_trigger", alias = "moving_platform")]
    Platform,
    /// Passable, hurts whatever overlaps it.
    Damage,
    /// Solid floor that fires a touch callback.
    PressurePlate,
}

/// Behavioral type of a tile (the `type` key of the tile-set).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileType {
    Block,
    MovingPlatform,
    Spike,
    PressurePlate,
}

impl TileType {
    /// Unknown type strings fall back to a plain block.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "moving_platform" => TileType::MovingPlatform,
            "spike" => TileType::Spike,
            "pressure_plate" => TileType::PressurePlate,
            _ => TileType::Block,
        }
    }
}

impl CollisionKind {
    /// Blocks movement (and therefore lives in the grid)?
    pub fn is_solid(self) -> bool {
        matches!(self, CollisionKind::Solid | CollisionKind::PressurePlate)
    }

    pub fn is_damage(self) -> bool {
        matches!(self, CollisionKind::Damage)
    }
}

/// Hitbox as fractions of the tile cell.
#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
pub struct HitboxFrac {
    #[serde(default = "one")]
    pub width: f32,
    #[serde(default = "one")]
    pub height: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

fn one() -> f32 { 1.0 }

impl Default for HitboxFrac {
    fn default() -> Self {
        HitboxFrac { width: 1.0, height: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl HitboxFrac {
    /// World-space hitbox of this fraction placed in cell (cx, cy).
    pub fn in_cell(&self, cx: usize, cy: usize, tile_size: f32) -> Rect {
        Rect::new(
            cx as f32 * tile_size + self.offset_x * tile_size,
            cy as f32 * tile_size + self.offset_y * tile_size,
            self.width * tile_size,
            self.height * tile_size,
        )
    }
}

/// Free-form per-tile metadata (plate target, platform speed, damage...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileMeta(pub serde_json::Map<String, Value>);

impl TileMeta {
    pub fn f32(&self, key: &str) -> Option<f32> {
        self.0.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.f32(key).unwrap_or(default)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        self.0.get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }
}

/// A static tile placed in the level. Created at load, dropped with the level.
#[derive(Clone, Debug)]
pub struct Tile {
    pub id: u32,
    pub cell: (usize, usize),
    pub collision: CollisionKind,
    pub kind: TileType,
    pub hitbox: Rect,
    pub meta: TileMeta,
}

impl Tile {
    pub fn is_solid(&self) -> bool {
        self.collision.is_solid() && self.kind != TileType::MovingPlatform
    }

    pub fn is_pressure_plate(&self) -> bool {
        self.collision == CollisionKind::PressurePlate || self.kind == TileType::PressurePlate
    }

    pub fn is_hazard(&self) -> bool {
        self.collision.is_damage()
    }

    /// Damage reported when a body touches this hazard.
    pub fn damage(&self, default: u32) -> u32 {
        self.meta.u32_or("damage", default)
    }
}
