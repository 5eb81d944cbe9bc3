/// Level: the complete state of one running physics world.
///
/// ## Ownership
///
///   - `grid`     : static solid tiles. **Never mutated** after load.
///   - `gravity`  : this level's polarity; no process-wide state.
///   - `field`    : distance field, rebuilt by `step` on its schedule.
///   - `actors`   : the active body set (player + hostiles).
///   - `platforms`: moving platforms, outside the grid.
///   - `hazards`  : non-solid damage tiles, for touch tests.
///
/// The active set and the platform list are only mutated by `step` between
/// phases, or by the query API below between ticks. Removal of dying
/// bodies is deferred to the end of a tick.

use log::{info, warn};

use crate::config::GameConfig;
use crate::domain::entity::{self, Actor, ActorId, ActorKind, SpawnParams};
use crate::domain::field::DistanceField;
use crate::domain::geom::Rect;
use crate::domain::gravity::GravityField;
use crate::domain::grid::{TileGrid, DEFAULT_RADIUS};
use crate::domain::physics::{Broadphase, Obstacle};
use crate::domain::platform::MovingPlatform;
use crate::domain::tile::Tile;

/// Simulation tuning resolved from `GameConfig`.
#[derive(Clone, Debug)]
pub struct Tuning {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub broadphase_radius: i32,
    pub max_depth: u16,
    pub rebuild_interval: u32,
    pub dying_ticks: u32,
    pub hit_stun_ticks: u32,
    pub hazard_damage: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            gravity: 30.0,
            max_fall_speed: 12.0,
            broadphase_radius: DEFAULT_RADIUS,
            max_depth: 20,
            rebuild_interval: 1,
            dying_ticks: 30,
            hit_stun_ticks: 40,
            hazard_damage: 1,
        }
    }
}

impl Tuning {
    pub fn from_config(config: &GameConfig) -> Self {
        Tuning {
            gravity: config.physics.gravity,
            max_fall_speed: config.physics.max_fall_speed,
            broadphase_radius: config.physics.broadphase_radius,
            max_depth: config.field.max_depth,
            rebuild_interval: config.field.rebuild_interval,
            dying_ticks: config.actors.dying_ticks,
            hit_stun_ticks: config.player.hit_stun_ticks,
            hazard_damage: config.actors.hazard_damage,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Level {
    pub grid: TileGrid,
    pub gravity: GravityField,
    pub field: DistanceField,
    pub actors: Vec<Actor>,
    pub platforms: Vec<MovingPlatform>,
    pub hazards: Vec<Tile>,
    pub tuning: Tuning,
    pub tick: u64,
    /// Level timer from the level file, in seconds.
    pub time_to_finish: Option<f32>,
    /// Flips requested by brains, applied at the start of the next tick.
    pub(crate) pending_flips: u32,
    next_id: u32,
}

// ── Construction ──

impl Level {
    pub fn new(grid: TileGrid, tuning: Tuning) -> Self {
        Level {
            field: DistanceField::for_grid(&grid),
            gravity: GravityField::new(tuning.gravity),
            grid,
            actors: Vec::new(),
            platforms: Vec::new(),
            hazards: Vec::new(),
            tuning,
            tick: 0,
            time_to_finish: None,
            pending_flips: 0,
            next_id: 0,
        }
    }

    /// Spawn an actor by tag. Unknown tags are skipped with a warning.
    pub fn spawn(&mut self, tag: &str, cell: (usize, usize), params: &SpawnParams) -> Option<ActorId> {
        let id = ActorId(self.next_id);
        let Some(mut actor) = entity::spawn(tag, id, cell, params) else {
            warn!("unknown actor type {tag:?} at {cell:?}; skipped");
            return None;
        };
        self.next_id += 1;
        // Late spawns join the current polarity.
        actor.body.is_flipped = self.gravity.is_inverted();
        self.actors.push(actor);
        Some(id)
    }

    pub fn add_platform(&mut self, platform: MovingPlatform) -> usize {
        self.platforms.push(platform);
        self.platforms.len() - 1
    }
}

// ── Queries ──

impl Level {
    /// Solid tile at a world coordinate.
    pub fn tile_at(&self, world_x: f32, world_y: f32) -> Option<&Tile> {
        self.grid.tile_at(world_x, world_y)
    }

    /// Solid grid tiles in the broad-phase neighbourhood of `area`.
    /// Platforms are not included; see `obstacles_near`.
    pub fn tiles_near(&self, area: &Rect, radius: i32) -> impl Iterator<Item = &Tile> + '_ {
        self.grid.tiles_near(area, radius)
    }

    /// Everything a body in `area` collides with: nearby solid tiles plus
    /// every platform overlapping `area`.
    pub fn obstacles_near(&self, area: &Rect, radius: i32) -> Vec<Obstacle> {
        Broadphase::new(&self.grid, &self.platforms, radius).query(area)
    }

    /// Distance field value of a cell, `None` when unreached.
    pub fn value_at(&self, gx: i32, gy: i32) -> Option<u16> {
        self.field.value_at(gx, gy)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    pub fn player(&self) -> Option<&Actor> {
        self.actors.iter().find(|a| a.kind == ActorKind::Player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.kind == ActorKind::Player)
    }

    pub fn active_count(&self) -> usize {
        self.actors.iter().filter(|a| a.is_active()).count()
    }
}

// ── Mutation ──

impl Level {
    /// Invert gravity and run every active body's flip hook before anyone
    /// integrates again. Returns whether gravity is now inverted.
    pub fn flip_gravity(&mut self) -> bool {
        self.gravity.flip();
        for a in self.actors.iter_mut().filter(|a| a.is_active()) {
            a.body.flip_gravity(a.kind.flip_response());
        }
        let inverted = self.gravity.is_inverted();
        info!("gravity flipped ({})", if inverted { "inverted" } else { "normal" });
        inverted
    }

    /// Remove an actor now, whatever its state. Must not be called while
    /// `step` is running.
    pub fn despawn(&mut self, id: ActorId) -> bool {
        let before = self.actors.len();
        self.actors.retain(|a| a.id != id);
        self.actors.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::grid_from;

    fn level() -> Level {
        let grid = grid_from(&[
            "..........",
            "..........",
            "##########",
        ], 32.0);
        Level::new(grid, Tuning::default())
    }

    #[test]
    fn spawn_assigns_ids_and_skips_unknown() {
        let mut lv = level();
        let p = SpawnParams::for_tile_size(32.0);
        assert_eq!(lv.spawn("player", (1, 1), &p), Some(ActorId(0)));
        assert_eq!(lv.spawn("wizard", (2, 1), &p), None);
        assert_eq!(lv.spawn("guard", (3, 1), &p), Some(ActorId(1)));
        assert_eq!(lv.actors.len(), 2);
        assert_eq!(lv.player().map(|a| a.id), Some(ActorId(0)));
    }

    #[test]
    fn flip_reaches_every_active_body() {
        let mut lv = level();
        let p = SpawnParams::for_tile_size(32.0);
        lv.spawn("player", (1, 1), &p);
        lv.spawn("drone", (3, 0), &p);
        lv.spawn("guard", (5, 1), &p);
        assert!(lv.flip_gravity());
        assert!(lv.actors.iter().all(|a| a.body.is_flipped));
        assert_eq!(lv.gravity.sign(), -1);
    }

    #[test]
    fn late_spawn_joins_current_polarity() {
        let mut lv = level();
        lv.flip_gravity();
        let p = SpawnParams::for_tile_size(32.0);
        let id = lv.spawn("guard", (1, 1), &p);
        assert_eq!(id.and_then(|id| lv.actor(id)).map(|a| a.body.is_flipped), Some(true));
    }

    #[test]
    fn despawn_removes_once() {
        let mut lv = level();
        let p = SpawnParams::for_tile_size(32.0);
        let id = lv.spawn("guard", (1, 1), &p).unwrap();
        assert!(lv.despawn(id));
        assert!(!lv.despawn(id));
        assert!(lv.actor(id).is_none());
    }

    #[test]
    fn queries_delegate_to_grid_and_field() {
        let lv = level();
        assert!(lv.tile_at(40.0, 70.0).is_some());
        assert!(lv.tile_at(40.0, 10.0).is_none());
        assert_eq!(lv.value_at(0, 0), None);
        let area = Rect::new(100.0, 40.0, 20.0, 20.0);
        assert!(lv.tiles_near(&area, 1).count() > 0);
    }

    #[test]
    fn obstacles_near_includes_overlapping_platforms() {
        use crate::domain::physics::ObstacleKind;
        use crate::domain::platform::Axis;

        let mut lv = level();
        lv.add_platform(MovingPlatform::new(Rect::new(96.0, 40.0, 64.0, 8.0), Axis::Horizontal, 1.0, None));
        lv.add_platform(MovingPlatform::new(Rect::new(260.0, 0.0, 32.0, 8.0), Axis::Horizontal, 1.0, None));
        let area = Rect::new(100.0, 36.0, 20.0, 20.0);

        let found = lv.obstacles_near(&area, 1);
        assert!(found.iter().any(|o| o.kind == ObstacleKind::Platform(0)));
        assert!(!found.iter().any(|o| o.kind == ObstacleKind::Platform(1)));
        assert!(found.iter().any(|o| matches!(o.kind, ObstacleKind::Tile { .. })));
        assert!(lv.tiles_near(&area, 1).count() < found.len());
    }
}
