/// Actor brains: per-kind decision making.
///
/// Runs after the tick's physics, so whatever velocity a brain writes is
/// what the body integrates with on the next tick. Brains only read the
/// world through `Ctx` (tile probes, the distance field, the player's
/// rect) and return an `Intent` for anything that touches the level.
///
/// Modes per kind:
///   - **Guard**  : patrol (reverse at walls) / chase via the field, hop
///                   when blocked while chasing.
///   - **Charger**: patrol / wind-up then accelerating charge; a wall
///                   impact mid-charge stuns it.
///   - **Drone**  : 8-way field navigation, gravity immune.
///   - **Battery**: idle → patrol → chase → fuse → explode.
///   - **Turret** : static, fires when the player is in range and visible.
///   - **Boss**   : hovers over the player's head, flips gravity on a timer.

use glam::Vec2;

use super::body::PhysicsBody;
use super::entity::{Actor, BatteryMode, Brain, FrameInput, Intent};
use super::field::{DistanceField, Guidance};
use super::geom::Rect;
use super::grid::TileGrid;

/// Ticks between boss-triggered gravity flips.
pub const BOSS_FLIP_INTERVAL: u32 = 180;
const BOSS_HOVER: f32 = 50.0;

const CHARGER_WINDUP: u32 = 45;
const CHARGER_MAX_SPEED: f32 = 6.0;
const CHARGER_WALL_STUN: u32 = 120;

const BATTERY_IDLE_TICKS: u32 = 45;
const BATTERY_PATROL_TICKS: u32 = 90;
const BATTERY_FUSE_TICKS: u32 = 30;
const BATTERY_BLAST_TILES: f32 = 2.5;

const TURRET_COOLDOWN: u32 = 90;

/// Horizontal damping applied to stunned walkers on the ground.
const STUN_FRICTION: f32 = 0.8;
const DRONE_DRAG: f32 = 0.9;

/// Read-only view of the level for one round of decisions.
pub struct Ctx<'a> {
    pub grid: &'a TileGrid,
    pub field: &'a DistanceField,
    /// The active player's rect, if any.
    pub player: Option<Rect>,
    pub dt: f32,
}

impl<'a> Ctx<'a> {
    /// Player rect when its centre is within `range` px of `body`.
    fn player_within(&self, body: &PhysicsBody, range: f32) -> Option<Rect> {
        self.player
            .filter(|p| p.center().distance(body.rect.center()) < range)
    }

    fn guidance(&self, body: &PhysicsBody) -> Guidance {
        let c = body.rect.center();
        let ts = self.grid.tile_size();
        let gx = (c.x / ts).floor() as i32;
        let gy = (c.y / ts).floor() as i32;
        self.field.guidance(self.grid, gx, gy)
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Apply one tick of player input. Jump direction follows the body's
/// gravity polarity; holding jump adds force for a limited number of ticks.
pub fn drive_player(actor: &mut Actor, input: &FrameInput, dt: f32) -> Intent {
    let Brain::Player { hold_force, hold_ticks, hold_left, flip_latch } = &mut actor.brain else {
        return Intent::Idle;
    };
    let body = &mut actor.body;
    if !body.is_active() {
        return Intent::Idle;
    }

    let intent = if input.flip_gravity && !*flip_latch {
        Intent::FlipGravity
    } else {
        Intent::Idle
    };
    *flip_latch = input.flip_gravity;

    if body.stun > 0 {
        settle(body);
        *hold_left = 0;
        return intent;
    }

    let dir = match (input.move_left, input.move_right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };
    body.velocity.x = dir * actor.stats.speed * dt;
    if dir != 0.0 {
        body.facing_right = dir > 0.0;
    }

    let down = body.down_sign();
    if input.jump {
        if body.on_ground {
            body.velocity.y = -actor.stats.jump_impulse * down;
            body.on_ground = false;
            *hold_left = *hold_ticks;
        } else if *hold_left > 0 {
            body.velocity.y -= *hold_force * down;
            *hold_left -= 1;
        }
    } else {
        *hold_left = 0;
    }

    intent
}

// ══════════════════════════════════════════════════════════════
// Hostiles
// ══════════════════════════════════════════════════════════════

/// Decide the next tick for one non-player actor.
pub fn decide(actor: &mut Actor, ctx: &Ctx) -> Intent {
    if !actor.is_active() {
        return Intent::Idle;
    }
    match actor.brain {
        Brain::Player { .. } => Intent::Idle,
        Brain::Guard => guard(actor, ctx),
        Brain::Charger { .. } => charger(actor, ctx),
        Brain::Drone => drone(actor, ctx),
        Brain::Battery { .. } => battery(actor, ctx),
        Brain::Turret { .. } => turret(actor, ctx),
        Brain::Boss { .. } => boss(actor, ctx),
    }
}

fn guard(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let body = &mut actor.body;
    if body.stun > 0 {
        settle(body);
        return Intent::Idle;
    }
    let speed = actor.stats.speed * ctx.dt;

    let chase = ctx
        .player_within(body, actor.stats.detection_range)
        .and_then(|player| chase_dir(ctx, body, &player));
    match chase {
        Some(dir) => {
            // Blocked while chasing: hop over the obstacle.
            if body.on_ground && body.hit_edge {
                body.velocity.y = -actor.stats.jump_impulse * body.down_sign();
                body.on_ground = false;
            }
            walk(body, dir, speed);
        }
        None => {
            let dir = patrol_dir(ctx.grid, body);
            walk(body, dir, speed);
        }
    }
    Intent::Idle
}

fn charger(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let Brain::Charger { charging, chase_timer } = &mut actor.brain else {
        return Intent::Idle;
    };
    let body = &mut actor.body;
    if body.stun > 0 {
        body.velocity.x = 0.0;
        return Intent::Idle;
    }

    if *charging && body.hit_edge {
        *charging = false;
        *chase_timer = 0;
        body.velocity.x = 0.0;
        body.stun = CHARGER_WALL_STUN;
        return Intent::Idle;
    }

    if let Some(player) = ctx.player_within(body, actor.stats.detection_range) {
        if *chase_timer == 0 {
            body.facing_right = player.center().x >= body.rect.center().x;
        }
        *charging = true;
    }

    let speed = actor.stats.speed * ctx.dt;
    if *charging {
        *chase_timer += 1;
        if *chase_timer < CHARGER_WINDUP {
            body.velocity.x = 0.0;
        } else {
            let dir = if body.facing_right { 1.0 } else { -1.0 };
            body.velocity.x = (body.velocity.x + 0.33 * speed * dir)
                .clamp(-CHARGER_MAX_SPEED, CHARGER_MAX_SPEED);
        }
    } else {
        *chase_timer = 0;
        let dir = patrol_dir(ctx.grid, body);
        walk(body, dir, speed);
    }
    Intent::Idle
}

fn drone(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let body = &mut actor.body;
    if body.stun > 0 {
        body.velocity *= DRONE_DRAG;
        return Intent::Idle;
    }
    let Some(player) = ctx.player_within(body, actor.stats.detection_range) else {
        body.velocity *= DRONE_DRAG;
        return Intent::Idle;
    };

    let here = body.rect.center();
    let heading = match ctx.guidance(body) {
        Guidance::Step(dx, dy) => Vec2::new(dx as f32, dy as f32).normalize_or_zero(),
        Guidance::Arrived => (player.center() - here).normalize_or_zero(),
        // Out of the field's reach: no path, so drift.
        Guidance::None => {
            body.velocity *= DRONE_DRAG;
            return Intent::Idle;
        }
    };
    body.facing_right = player.center().x >= here.x;
    body.velocity = heading * actor.stats.speed * ctx.dt;
    Intent::Idle
}

fn battery(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let Brain::Battery { mode, patrol_right } = &mut actor.brain else {
        return Intent::Idle;
    };
    let body = &mut actor.body;
    if body.stun > 0 {
        body.velocity.x = 0.0;
        return Intent::Idle;
    }

    let range = actor.stats.detection_range;
    let speed = actor.stats.speed * ctx.dt;
    let here = body.rect.center();
    let player = ctx.player;
    let dist = player.map_or(f32::INFINITY, |p| p.center().distance(here));

    match *mode {
        BatteryMode::Idle { remaining } => {
            body.velocity.x = 0.0;
            *mode = if dist < range {
                BatteryMode::Chase
            } else if remaining == 0 {
                *patrol_right = !*patrol_right;
                BatteryMode::Patrol { remaining: BATTERY_PATROL_TICKS }
            } else {
                BatteryMode::Idle { remaining: remaining - 1 }
            };
        }
        BatteryMode::Patrol { remaining } => {
            body.facing_right = *patrol_right;
            if body.hit_edge || wall_ahead(ctx.grid, body) {
                *patrol_right = !*patrol_right;
                body.facing_right = *patrol_right;
            }
            let dir = if *patrol_right { 1.0 } else { -1.0 };
            body.velocity.x = dir * speed;
            *mode = if dist < range {
                BatteryMode::Chase
            } else if remaining == 0 {
                BatteryMode::Idle { remaining: BATTERY_IDLE_TICKS }
            } else {
                BatteryMode::Patrol { remaining: remaining - 1 }
            };
        }
        BatteryMode::Chase => {
            if let Some(p) = player {
                body.facing_right = p.center().x >= here.x;
            }
            let dir = if body.facing_right { 1.0 } else { -1.0 };
            body.velocity.x = dir * speed;
            if dist < range / 2.0 {
                body.velocity.x = 0.0;
                *mode = BatteryMode::Fuse { remaining: BATTERY_FUSE_TICKS };
            } else if dist > range * 1.5 {
                body.velocity.x = 0.0;
                *mode = BatteryMode::Idle { remaining: BATTERY_IDLE_TICKS };
            }
        }
        BatteryMode::Fuse { remaining: 0 } => {
            body.velocity.x = 0.0;
            *mode = BatteryMode::Spent;
            return Intent::Explode { radius: BATTERY_BLAST_TILES * ctx.grid.tile_size() };
        }
        BatteryMode::Fuse { remaining } => {
            body.velocity.x = 0.0;
            *mode = BatteryMode::Fuse { remaining: remaining - 1 };
        }
        BatteryMode::Spent => body.velocity.x = 0.0,
    }
    Intent::Idle
}

fn turret(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let Brain::Turret { cooldown } = &mut actor.brain else {
        return Intent::Idle;
    };
    let body = &mut actor.body;
    body.velocity = Vec2::ZERO;
    if *cooldown > 0 {
        *cooldown -= 1;
    }

    let Some(player) = ctx.player else { return Intent::Idle };
    let here = body.rect.center();
    body.facing_right = player.center().x >= here.x;

    let in_range = player.center().distance(here) <= actor.stats.detection_range;
    if *cooldown == 0 && in_range && line_of_sight(ctx.grid, here, player.center()) {
        *cooldown = TURRET_COOLDOWN;
        return Intent::Fire;
    }
    Intent::Idle
}

fn boss(actor: &mut Actor, ctx: &Ctx) -> Intent {
    let Brain::Boss { flip_timer } = &mut actor.brain else {
        return Intent::Idle;
    };
    let body = &mut actor.body;
    let Some(player) = ctx.player_within(body, actor.stats.detection_range) else {
        body.velocity = Vec2::ZERO;
        return Intent::Idle;
    };

    // Hover on the player's "up" side.
    let target = player.center() + Vec2::new(0.0, -BOSS_HOVER * body.down_sign());
    let to = target - body.rect.center();
    body.velocity = if to.length() > 4.0 {
        to.normalize_or_zero() * actor.stats.speed * ctx.dt
    } else {
        Vec2::ZERO
    };
    body.facing_right = player.center().x >= body.rect.center().x;

    if *flip_timer == 0 {
        *flip_timer = BOSS_FLIP_INTERVAL;
        return Intent::FlipGravity;
    }
    *flip_timer -= 1;
    Intent::Idle
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn settle(body: &mut PhysicsBody) {
    if body.on_ground {
        body.velocity.x *= STUN_FRICTION;
    }
}

fn walk(body: &mut PhysicsBody, dir: f32, speed: f32) {
    body.velocity.x = dir * speed;
    if dir != 0.0 {
        body.facing_right = dir > 0.0;
    }
}

/// Horizontal chase direction: the field's step when it has a horizontal
/// component, otherwise straight at the player. `None` when the field has
/// no route from here.
fn chase_dir(ctx: &Ctx, body: &PhysicsBody, player: &Rect) -> Option<f32> {
    match ctx.guidance(body) {
        Guidance::None => None,
        Guidance::Step(dx, _) if dx != 0 => Some(dx as f32),
        Guidance::Step(..) | Guidance::Arrived => {
            let diff = player.center().x - body.rect.center().x;
            Some(if diff.abs() < 1.0 { 0.0 } else { diff.signum() })
        }
    }
}

/// Keep walking the way we face, turning at walls and level sides.
fn patrol_dir(grid: &TileGrid, body: &mut PhysicsBody) -> f32 {
    if body.hit_edge || wall_ahead(grid, body) {
        body.facing_right = !body.facing_right;
    }
    if body.facing_right { 1.0 } else { -1.0 }
}

/// Solid tile (or the level side) one pixel ahead of the facing edge.
pub fn wall_ahead(grid: &TileGrid, body: &PhysicsBody) -> bool {
    let r = &body.rect;
    let x = if body.facing_right { r.right() + 1.0 } else { r.left() - 1.0 };
    let y = r.center().y;
    let bounds = grid.bounds();
    x < bounds.left() || x >= bounds.right() || grid.tile_at(x, y).is_some()
}

/// Coarse ray march between two points, sampling every half tile.
pub fn line_of_sight(grid: &TileGrid, from: Vec2, to: Vec2) -> bool {
    let step = grid.tile_size() / 2.0;
    let delta = to - from;
    let dist = delta.length();
    if dist == 0.0 {
        return true;
    }
    let dir = delta / dist;
    let mut t = step;
    while t < dist {
        let p = from + dir * t;
        if grid.tile_at(p.x, p.y).is_some() {
            return false;
        }
        t += step;
    }
    true
}
