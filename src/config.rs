/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::{debug, warn};
use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub field: FieldConfig,
    pub player: PlayerConfig,
    pub actors: ActorsConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub tick_rate_ms: u64,
    /// Velocity change per second of `dt`, in px/tick.
    pub gravity: f32,
    /// Keeps per-tick displacement under one tile.
    pub max_fall_speed: f32,
    pub broadphase_radius: i32,
}

#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub max_depth: u16,
    /// Rebuild the distance field every N ticks (1 = every tick).
    pub rebuild_interval: u32,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    /// px per second of `dt`.
    pub speed: f32,
    pub jump_impulse: f32,
    pub jump_hold: f32,
    pub jump_hold_ticks: u32,
    pub hit_stun_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct ActorsConfig {
    /// Ticks an eliminated body lingers before removal.
    pub dying_ticks: u32,
    pub hazard_damage: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    field: TomlField,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    actors: TomlActors,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f32,
    #[serde(default = "default_broadphase")]
    broadphase_radius: i32,
}

#[derive(Deserialize, Debug)]
struct TomlField {
    #[serde(default = "default_max_depth")]
    max_depth: u16,
    #[serde(default = "default_rebuild_interval")]
    rebuild_interval: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_width")]
    width: f32,
    #[serde(default = "default_player_height")]
    height: f32,
    #[serde(default = "default_player_speed")]
    speed: f32,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f32,
    #[serde(default = "default_jump_hold")]
    jump_hold: f32,
    #[serde(default = "default_jump_hold_ticks")]
    jump_hold_ticks: u32,
    #[serde(default = "default_hit_stun")]
    hit_stun_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlActors {
    #[serde(default = "default_dying_ticks")]
    dying_ticks: u32,
    #[serde(default = "default_hazard_damage")]
    hazard_damage: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_gravity() -> f32 { 30.0 }
fn default_max_fall() -> f32 { 12.0 }
fn default_broadphase() -> i32 { 2 }

fn default_max_depth() -> u16 { 20 }
fn default_rebuild_interval() -> u32 { 1 }

fn default_player_width() -> f32 { 24.0 }
fn default_player_height() -> f32 { 30.0 }
fn default_player_speed() -> f32 { 180.0 }
fn default_jump_impulse() -> f32 { 8.0 }
fn default_jump_hold() -> f32 { 0.4 }
fn default_jump_hold_ticks() -> u32 { 6 }
fn default_hit_stun() -> u32 { 40 }

fn default_dying_ticks() -> u32 { 30 }
fn default_hazard_damage() -> u32 { 1 }

fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tick_rate_ms: default_tick_rate(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
            broadphase_radius: default_broadphase(),
        }
    }
}

impl Default for TomlField {
    fn default() -> Self {
        TomlField {
            max_depth: default_max_depth(),
            rebuild_interval: default_rebuild_interval(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            width: default_player_width(),
            height: default_player_height(),
            speed: default_player_speed(),
            jump_impulse: default_jump_impulse(),
            jump_hold: default_jump_hold(),
            jump_hold_ticks: default_jump_hold_ticks(),
            hit_stun_ticks: default_hit_stun(),
        }
    }
}

impl Default for TomlActors {
    fn default() -> Self {
        TomlActors {
            dying_ticks: default_dying_ticks(),
            hazard_damage: default_hazard_damage(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse an in-memory document. Missing keys take their defaults; a
    /// malformed document is an error.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory against the search dirs, else CWD-relative.
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            physics: PhysicsConfig {
                tick_rate_ms: cfg.physics.tick_rate_ms,
                gravity: cfg.physics.gravity,
                max_fall_speed: cfg.physics.max_fall_speed,
                broadphase_radius: cfg.physics.broadphase_radius.max(1),
            },
            field: FieldConfig {
                max_depth: cfg.field.max_depth,
                rebuild_interval: cfg.field.rebuild_interval.max(1),
            },
            player: PlayerConfig {
                width: cfg.player.width,
                height: cfg.player.height,
                speed: cfg.player.speed,
                jump_impulse: cfg.player.jump_impulse,
                jump_hold: cfg.player.jump_hold,
                jump_hold_ticks: cfg.player.jump_hold_ticks,
                hit_stun_ticks: cfg.player.hit_stun_ticks,
            },
            actors: ActorsConfig {
                dying_ticks: cfg.actors.dying_ticks,
                hazard_damage: cfg.actors.hazard_damage,
            },
            levels_dir,
        }
    }

    /// Frame length in seconds, the `dt` the runner feeds to `step`.
    pub fn dt(&self) -> f32 {
        self.physics.tick_rate_ms as f32 / 1000.0
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        debug!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics.tick_rate_ms, 16);
        assert_eq!(cfg.physics.gravity, 30.0);
        assert_eq!(cfg.physics.max_fall_speed, 12.0);
        assert_eq!(cfg.physics.broadphase_radius, 2);
        assert_eq!(cfg.field.max_depth, 20);
        assert_eq!(cfg.field.rebuild_interval, 1);
        assert_eq!(cfg.player.jump_hold_ticks, 6);
        assert_eq!(cfg.actors.dying_ticks, 30);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[physics]\ngravity = 45.5\n\n[field]\nmax_depth = 12\n",
        ).unwrap();
        assert_eq!(cfg.physics.gravity, 45.5);
        assert_eq!(cfg.physics.max_fall_speed, 12.0);
        assert_eq!(cfg.field.max_depth, 12);
        assert_eq!(cfg.field.rebuild_interval, 1);
        assert_eq!(cfg.player.width, 24.0);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = GameConfig::from_toml_str("[field]\nrebuild_interval = 0\n").unwrap();
        assert_eq!(cfg.field.rebuild_interval, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics]\ngravity = \"heavy\"\n").is_err());
    }

    #[test]
    fn dt_from_tick_rate() {
        let cfg = GameConfig::default();
        assert!((cfg.dt() - 0.016).abs() < 1e-6);
    }
}
