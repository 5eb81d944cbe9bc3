/// Level loader.
///
/// A level is two JSON documents:
///
/// ## Level file (`level_<n>.json`)
///   ```text
///   { "spawn": [tx, ty],
///     "enemies": [{ "type": "guard", "x": tx, "y": ty }],
///     "tiles": [[id, ...], ...],
///     "time_to_finish": secs }
///   ```
///   Coordinates are in tiles. Id 0 is empty. Rows may be ragged; the map
///   is as wide as its longest row.
///
/// ## Tile-set file (`level_<n>_data.json`)
///   ```text
///   { "tile_size": 32,
///     "tiles": { "<id>": { "index": i, "collision_type": "solid",
///                          "type": "block", "hitbox": {...},
///                          "metadata": {...} } } }
///   ```
///
/// ## Placement:
///   moving_platform type  → `MovingPlatform` (never in the grid)
///   damage collision      → hazard list
///   solid / plate         → `TileGrid`
///   anything else         → skipped

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::GameConfig;
use crate::domain::entity::SpawnParams;
use crate::domain::grid::TileGrid;
use crate::domain::platform::{Axis, MovingPlatform};
use crate::domain::tile::{CollisionKind, HitboxFrac, Tile, TileMeta, TileType};
use crate::error::LevelError;
use crate::sim::world::{Level, Tuning};

// ── File schema ──

#[derive(Deserialize, Debug)]
struct LevelFile {
    spawn: [usize; 2],
    #[serde(default)]
    enemies: Vec<EnemyEntry>,
    tiles: Vec<Vec<u32>>,
    #[serde(default)]
    time_to_finish: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct EnemyEntry {
    #[serde(rename = "type")]
    tag: String,
    x: usize,
    y: usize,
}

#[derive(Deserialize, Debug)]
struct TileSetFile {
    tile_size: f32,
    #[serde(default)]
    tiles: HashMap<String, TileDef>,
}

#[derive(Deserialize, Debug)]
struct TileDef {
    /// Sprite index; kept for the tile-set format, unused by the core.
    #[serde(default)]
    #[allow(dead_code)]
    index: u32,
    collision_type: String,
    #[serde(rename = "type", default = "default_tile_type")]
    tile_type: String,
    #[serde(default)]
    hitbox: HitboxFrac,
    #[serde(default)]
    metadata: serde_json::Map<String, Value>,
}

fn default_tile_type() -> String { "block".into() }

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load `level_<n>.json` and `level_<n>_data.json` from the configured
/// levels directory.
pub fn load_level_number(config: &GameConfig, n: u32) -> Result<Level, LevelError> {
    let (level_path, tileset_path) = level_paths(&config.levels_dir, n);
    load_level(config, &level_path, &tileset_path)
}

/// File names of level `n` under `dir`.
pub fn level_paths(dir: &Path, n: u32) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("level_{n}.json")),
        dir.join(format!("level_{n}_data.json")),
    )
}

pub fn load_level(config: &GameConfig, level_path: &Path, tileset_path: &Path) -> Result<Level, LevelError> {
    let map: LevelFile = read_json(level_path)?;
    let set: TileSetFile = read_json(tileset_path)?;
    let level = build(map, set, config, level_path)?;
    info!(
        "loaded {}: {}x{} tiles, {} actors, {} platforms, {} hazards",
        level_path.display(),
        level.grid.width(),
        level.grid.height(),
        level.actors.len(),
        level.platforms.len(),
        level.hazards.len(),
    );
    Ok(level)
}

/// Build a level from in-memory documents.
pub fn from_json_str(level_json: &str, tileset_json: &str, config: &GameConfig) -> Result<Level, LevelError> {
    let level_path = Path::new("<level>");
    let map: LevelFile = parse_json(level_json, level_path)?;
    let set: TileSetFile = parse_json(tileset_json, Path::new("<tileset>"))?;
    build(map, set, config, level_path)
}

/// Spawn parameters for a level with tiles of `tile_size` px.
pub fn spawn_params(config: &GameConfig, tile_size: f32) -> SpawnParams {
    SpawnParams {
        tile_size,
        player_size: Vec2::new(config.player.width, config.player.height),
        player_speed: config.player.speed,
        jump_impulse: config.player.jump_impulse,
        jump_hold: config.player.jump_hold,
        jump_hold_ticks: config.player.jump_hold_ticks,
    }
}

// ══════════════════════════════════════════════════════════════
// Internals
// ══════════════════════════════════════════════════════════════

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&text, path)
}

fn parse_json<T: DeserializeOwned>(text: &str, path: &Path) -> Result<T, LevelError> {
    serde_json::from_str(text).map_err(|source| LevelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn build(map: LevelFile, set: TileSetFile, config: &GameConfig, path: &Path) -> Result<Level, LevelError> {
    let ts = set.tile_size;
    if !(ts.is_finite() && ts > 0.0) {
        return Err(LevelError::InvalidTileSize(ts));
    }

    let height = map.tiles.len();
    let width = map.tiles.iter().map(Vec::len).max().unwrap_or(0);
    if height == 0 || width == 0 {
        return Err(LevelError::EmptyMap { path: path.to_path_buf() });
    }

    let defs = index_defs(set.tiles);

    let mut solids = Vec::new();
    let mut hazards = Vec::new();
    let mut platforms = Vec::new();

    for (y, row) in map.tiles.iter().enumerate() {
        for (x, &id) in row.iter().enumerate() {
            if id == 0 {
                continue;
            }
            let Some(def) = defs.get(&id) else {
                debug!("unknown tile id {id} at ({x},{y}); skipped");
                continue;
            };
            let Some(collision) = parse_collision(&def.collision_type) else {
                debug!("tile {id} at ({x},{y}) is passable ({:?})", def.collision_type);
                continue;
            };
            let tile = Tile {
                id,
                cell: (x, y),
                collision,
                kind: TileType::from_tag(&def.tile_type),
                hitbox: def.hitbox.in_cell(x, y, ts),
                meta: TileMeta(def.metadata.clone()),
            };

            if tile.kind == TileType::MovingPlatform || tile.collision == CollisionKind::Platform {
                platforms.push(platform_from(&tile, ts));
            } else if tile.is_hazard() {
                hazards.push(tile);
            } else if tile.is_solid() {
                solids.push(tile);
            }
        }
    }

    let mut level = Level::new(TileGrid::new(width, height, ts, solids), Tuning::from_config(config));
    level.hazards = hazards;
    level.time_to_finish = map.time_to_finish.filter(|t| *t > 0.0);
    for p in platforms {
        level.add_platform(p);
    }

    let params = spawn_params(config, ts);
    let [sx, sy] = map.spawn;
    level.spawn("player", (sx, sy), &params);
    for e in &map.enemies {
        level.spawn(&e.tag, (e.x, e.y), &params);
    }

    Ok(level)
}

/// Tile-set keys are decimal ids in strings.
fn index_defs(tiles: HashMap<String, TileDef>) -> HashMap<u32, TileDef> {
    tiles
        .into_iter()
        .filter_map(|(key, def)| match key.trim().parse::<u32>() {
            Ok(id) => Some((id, def)),
            Err(_) => {
                debug!("tile-set key {key:?} is not an id; skipped");
                None
            }
        })
        .collect()
}

/// `None` for collision types the core does not model (e.g. "air").
fn parse_collision(tag: &str) -> Option<CollisionKind> {
    serde_json::from_value(Value::String(tag.to_owned())).ok()
}

fn platform_from(tile: &Tile, ts: f32) -> MovingPlatform {
    let axis = Axis::from_tag(tile.meta.str("direction").unwrap_or("horizontal"));
    let speed = tile.meta.f32_or("speed", 1.0);
    let range = tile.meta.f32("range").map(|r| r * ts);
    MovingPlatform::new(tile.hitbox, axis, speed, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ActorKind;
    use crate::domain::geom::Rect;

    const TILESET: &str = r#"{
        "tile_size": 32,
        "tiles": {
            "1": { "index": 0, "collision_type": "solid", "type": "block" },
            "2": { "index": 1, "collision_type": "platform", "type": "moving_platform",
                   "hitbox": { "width": 1.0, "height": 0.25 },
                   "metadata": { "speed": 2, "direction": "vertical", "range": 3 } },
            "3": { "index": 2, "collision_type": "damage", "type": "spike",
                   "hitbox": { "height": 0.5, "offset_y": 0.5 },
                   "metadata": { "damage": 2 } },
            "4": { "index": 3, "collision_type": "pressure_plate", "type": "pressure_plate",
                   "metadata": { "target": "door_a" } },
            "5": { "index": 4, "collision_type": "air" }
        }
    }"#;

    const LEVEL: &str = r#"{
        "spawn": [1, 2],
        "enemies": [
            { "type": "guard", "x": 4, "y": 2 },
            { "type": "wizard", "x": 5, "y": 2 }
        ],
        "tiles": [
            [1, 0, 0, 0, 0, 0, 1],
            [1, 0, 2, 0, 0, 5, 1],
            [1, 0, 0, 0, 0, 0, 1],
            [1, 1, 3, 4, 1, 9, 1]
        ],
        "time_to_finish": 90
    }"#;

    fn load() -> Level {
        from_json_str(LEVEL, TILESET, &GameConfig::default()).unwrap()
    }

    #[test]
    fn builds_grid_from_solid_tiles() {
        let lv = load();
        assert_eq!((lv.grid.width(), lv.grid.height()), (7, 4));
        assert_eq!(lv.grid.tile_size(), 32.0);
        assert!(lv.grid.is_solid_cell(0, 0));
        assert!(lv.grid.is_solid_cell(4, 3));
        assert!(!lv.grid.is_solid_cell(1, 1));
        assert_eq!(lv.time_to_finish, Some(90.0));
    }

    #[test]
    fn pressure_plate_is_solid_and_keeps_metadata() {
        let lv = load();
        let plate = lv.grid.tile_at_cell(3, 3).unwrap();
        assert!(plate.is_pressure_plate());
        assert_eq!(plate.meta.str("target"), Some("door_a"));
    }

    #[test]
    fn damage_tiles_become_hazards() {
        let lv = load();
        assert!(!lv.grid.is_solid_cell(2, 3));
        assert_eq!(lv.hazards.len(), 1);
        let spike = &lv.hazards[0];
        assert_eq!(spike.cell, (2, 3));
        assert_eq!(spike.hitbox, Rect::new(64.0, 112.0, 32.0, 16.0));
        assert_eq!(spike.damage(1), 2);
    }

    #[test]
    fn moving_platform_leaves_the_grid() {
        let lv = load();
        assert!(!lv.grid.is_solid_cell(2, 1));
        assert_eq!(lv.platforms.len(), 1);
        let p = &lv.platforms[0];
        assert_eq!(p.rect, Rect::new(64.0, 32.0, 32.0, 8.0));
        assert_eq!(p.axis, Axis::Vertical);
        assert_eq!(p.speed, 2.0);
        assert_eq!(p.range, Some(96.0));
    }

    #[test]
    fn unknown_ids_and_passable_tiles_are_skipped() {
        let lv = load();
        assert!(!lv.grid.is_solid_cell(5, 1));
        assert!(!lv.grid.is_solid_cell(5, 3));
        assert!(lv.hazards.iter().all(|t| t.cell != (5, 3)));
    }

    #[test]
    fn spawns_player_then_known_enemies() {
        let lv = load();
        let kinds: Vec<_> = lv.actors.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActorKind::Player, ActorKind::Guard]);
        let player = lv.player().unwrap();
        // 24x30 body, bottom-aligned and centred in cell (1, 2).
        assert_eq!(player.body.rect, Rect::new(36.0, 66.0, 24.0, 30.0));
    }

    #[test]
    fn ragged_rows_take_the_longest_width() {
        let level = r#"{ "spawn": [0, 0], "tiles": [[0], [0, 0, 1]] }"#;
        let lv = from_json_str(level, TILESET, &GameConfig::default()).unwrap();
        assert_eq!(lv.grid.width(), 3);
        assert!(lv.grid.is_solid_cell(2, 1));
        assert_eq!(lv.time_to_finish, None);
    }

    #[test]
    fn empty_map_is_rejected() {
        let level = r#"{ "spawn": [0, 0], "tiles": [] }"#;
        let err = from_json_str(level, TILESET, &GameConfig::default()).unwrap_err();
        assert!(matches!(err, LevelError::EmptyMap { .. }));
    }

    #[test]
    fn non_positive_tile_size_is_rejected() {
        let set = r#"{ "tile_size": 0, "tiles": {} }"#;
        let err = from_json_str(LEVEL, set, &GameConfig::default()).unwrap_err();
        assert!(matches!(err, LevelError::InvalidTileSize(s) if s == 0.0));
    }

    #[test]
    fn malformed_json_names_the_document() {
        let err = from_json_str("{ \"spawn\": ", TILESET, &GameConfig::default()).unwrap_err();
        match err {
            LevelError::Json { path, .. } => assert_eq!(path, PathBuf::from("<level>")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = std::env::temp_dir().join("polarity-missing-level");
        let (level, tiles) = level_paths(&dir, 42);
        let err = load_level(&GameConfig::default(), &level, &tiles).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
    }

    #[test]
    fn loads_numbered_level_from_levels_dir() {
        let dir = std::env::temp_dir().join(format!("polarity-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let (level, tiles) = level_paths(&dir, 1);
        std::fs::write(&level, LEVEL).unwrap();
        std::fs::write(&tiles, TILESET).unwrap();

        let mut config = GameConfig::default();
        config.levels_dir = dir.clone();
        let lv = load_level_number(&config, 1).unwrap();
        assert_eq!(lv.actors.len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
