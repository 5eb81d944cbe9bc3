/// Actors: a `PhysicsBody` plus a kind tag, tuning stats and per-kind brain
/// state. Movement and collision are identical for every kind; only
/// decision-making (see `ai.rs`) varies per tag.
///
/// Spawning goes through an explicit tag → factory table (`FACTORIES`),
/// so level files name kinds by string and unknown tags are simply skipped.

use glam::Vec2;

use super::body::{FlipResponse, Knockback, PhysicsBody};
use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ActorId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActorKind {
    Player,
    Guard,
    Charger,
    Drone,
    Battery,
    Turret,
    Boss,
}

impl ActorKind {
    pub fn tag(self) -> &'static str {
        match self {
            ActorKind::Player => "player",
            ActorKind::Guard => "guard",
            ActorKind::Charger => "charger",
            ActorKind::Drone => "drone",
            ActorKind::Battery => "battery",
            ActorKind::Turret => "turret",
            ActorKind::Boss => "boss",
        }
    }

    pub fn is_hostile(self) -> bool {
        self != ActorKind::Player
    }

    /// Flyers and fixtures keep their motion when gravity flips.
    pub fn flip_response(self) -> FlipResponse {
        match self {
            ActorKind::Drone | ActorKind::Turret | ActorKind::Boss => FlipResponse::Ignore,
            _ => FlipResponse::Mirror,
        }
    }

    /// The boss moves on its own and is never carried or pushed.
    pub fn is_carryable(self) -> bool {
        self != ActorKind::Boss
    }
}

/// Per-actor tuning. Speeds are px per second of `dt`; velocities derived
/// from them are px/tick.
#[derive(Clone, Debug)]
pub struct ActorStats {
    pub speed: f32,
    pub damage: i32,
    /// Explicit override; `None` uses `Knockback::DEFAULT`.
    pub knockback: Option<Knockback>,
    /// Chase/attack trigger distance in px.
    pub detection_range: f32,
    /// Initial jump velocity, px/tick.
    pub jump_impulse: f32,
}

impl ActorStats {
    pub fn knockback(&self) -> Knockback {
        self.knockback.unwrap_or_default()
    }
}

// ── Brain state ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BatteryMode {
    Idle { remaining: u32 },
    Patrol { remaining: u32 },
    Chase,
    Fuse { remaining: u32 },
    Spent,
}

#[derive(Clone, Debug)]
pub enum Brain {
    Player {
        hold_force: f32,
        hold_ticks: u32,
        hold_left: u32,
        /// Flip is edge-triggered: held input fires once.
        flip_latch: bool,
    },
    Guard,
    Charger {
        charging: bool,
        chase_timer: u32,
    },
    Drone,
    Battery {
        mode: BatteryMode,
        patrol_right: bool,
    },
    Turret {
        cooldown: u32,
    },
    Boss {
        flip_timer: u32,
    },
}

// ── Frame input / intents ──

/// Player controls for one tick. Movement and jump are held states;
/// `flip_gravity` is latched by the player brain.
#[derive(Clone, Copy, Default, Debug)]
pub struct FrameInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub flip_gravity: bool,
}

/// Level-affecting decision returned by an actor's brain. Velocity and
/// facing changes are applied to the actor's own body directly.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Intent {
    Idle,
    FlipGravity,
    Explode { radius: f32 },
    Fire,
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub body: PhysicsBody,
    pub brain: Brain,
    pub stats: ActorStats,
}

impl Actor {
    pub fn is_active(&self) -> bool {
        self.body.is_active()
    }

    pub fn center(&self) -> Vec2 {
        self.body.rect.center()
    }
}

// ══════════════════════════════════════════════════════════════
// Spawn factory table
// ══════════════════════════════════════════════════════════════

/// Spawn-time parameters shared by every factory.
#[derive(Clone, Debug)]
pub struct SpawnParams {
    pub tile_size: f32,
    pub player_size: Vec2,
    pub player_speed: f32,
    pub jump_impulse: f32,
    pub jump_hold: f32,
    pub jump_hold_ticks: u32,
}

impl SpawnParams {
    pub fn for_tile_size(tile_size: f32) -> Self {
        SpawnParams {
            tile_size,
            player_size: Vec2::new(24.0, 30.0),
            player_speed: 180.0,
            jump_impulse: 8.0,
            jump_hold: 0.4,
            jump_hold_ticks: 6,
        }
    }
}

pub type Factory = fn(ActorId, (usize, usize), &SpawnParams) -> Actor;

pub const FACTORIES: [(ActorKind, Factory); 7] = [
    (ActorKind::Player, spawn_player),
    (ActorKind::Guard, spawn_guard),
    (ActorKind::Charger, spawn_charger),
    (ActorKind::Drone, spawn_drone),
    (ActorKind::Battery, spawn_battery),
    (ActorKind::Turret, spawn_turret),
    (ActorKind::Boss, spawn_boss),
];

pub fn kind_from_tag(tag: &str) -> Option<ActorKind> {
    FACTORIES.iter().map(|(k, _)| *k).find(|k| k.tag() == tag)
}

/// Spawn an actor by tag at a tile coordinate, or `None` for an unknown tag.
pub fn spawn(tag: &str, id: ActorId, cell: (usize, usize), params: &SpawnParams) -> Option<Actor> {
    let (_, factory) = FACTORIES.iter().find(|(k, _)| k.tag() == tag)?;
    Some(factory(id, cell, params))
}

/// Body rect of the given size standing on the bottom of `cell`,
/// horizontally centred.
fn rect_in_cell(cell: (usize, usize), size: Vec2, ts: f32) -> Rect {
    let x = cell.0 as f32 * ts + (ts - size.x) / 2.0;
    let y = (cell.1 + 1) as f32 * ts - size.y;
    Rect::new(x, y, size.x, size.y)
}

fn build(
    id: ActorId,
    kind: ActorKind,
    cell: (usize, usize),
    size: Vec2,
    p: &SpawnParams,
    health: i32,
    brain: Brain,
    stats: ActorStats,
) -> Actor {
    let mut body = PhysicsBody::new(rect_in_cell(cell, size, p.tile_size), health);
    body.facing_right = kind == ActorKind::Player;
    body.apply_gravity = kind.flip_response() == FlipResponse::Mirror;
    Actor { id, kind, body, brain, stats }
}

fn spawn_player(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let brain = Brain::Player {
        hold_force: p.jump_hold,
        hold_ticks: p.jump_hold_ticks,
        hold_left: 0,
        flip_latch: false,
    };
    let stats = ActorStats {
        speed: p.player_speed,
        damage: 1,
        knockback: None,
        detection_range: 0.0,
        jump_impulse: p.jump_impulse,
    };
    build(id, ActorKind::Player, cell, p.player_size, p, 5, brain, stats)
}

fn spawn_guard(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    let stats = ActorStats {
        speed: 60.0,
        damage: 1,
        knockback: Some(Knockback { x: 3.0, y: 2.0 }),
        detection_range: 4.0 * ts,
        jump_impulse: 6.0,
    };
    build(id, ActorKind::Guard, cell, Vec2::new(0.75, 0.9) * ts, p, 4, Brain::Guard, stats)
}

fn spawn_charger(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    let brain = Brain::Charger { charging: false, chase_timer: 0 };
    let stats = ActorStats {
        speed: 48.0,
        damage: 3,
        knockback: Some(Knockback { x: 6.0, y: 4.0 }),
        detection_range: 7.0 * ts,
        jump_impulse: 5.0,
    };
    build(id, ActorKind::Charger, cell, Vec2::new(0.9, 0.9) * ts, p, 16, brain, stats)
}

fn spawn_drone(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    let stats = ActorStats {
        speed: 90.0,
        damage: 1,
        knockback: None,
        detection_range: 8.0 * ts,
        jump_impulse: 0.0,
    };
    build(id, ActorKind::Drone, cell, Vec2::new(0.6, 0.5) * ts, p, 2, Brain::Drone, stats)
}

fn spawn_battery(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    // Stagger idle timers so a row of batteries does not move in lockstep.
    let brain = Brain::Battery {
        mode: BatteryMode::Idle { remaining: 30 + (id.0 % 4) * 10 },
        patrol_right: id.0 % 2 == 0,
    };
    let stats = ActorStats {
        speed: 60.0,
        damage: 4,
        knockback: Some(Knockback { x: 3.0, y: 6.0 }),
        detection_range: 4.0 * ts,
        jump_impulse: 0.0,
    };
    build(id, ActorKind::Battery, cell, Vec2::new(0.6, 0.7) * ts, p, 1, brain, stats)
}

fn spawn_turret(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    let stats = ActorStats {
        speed: 0.0,
        damage: 1,
        knockback: None,
        detection_range: 6.0 * ts,
        jump_impulse: 0.0,
    };
    let brain = Brain::Turret { cooldown: 0 };
    build(id, ActorKind::Turret, cell, Vec2::new(0.8, 0.8) * ts, p, 6, brain, stats)
}

fn spawn_boss(id: ActorId, cell: (usize, usize), p: &SpawnParams) -> Actor {
    let ts = p.tile_size;
    let brain = Brain::Boss { flip_timer: crate::domain::ai::BOSS_FLIP_INTERVAL };
    let stats = ActorStats {
        speed: 60.0,
        damage: 2,
        knockback: Some(Knockback { x: 4.0, y: 3.0 }),
        detection_range: 16.0 * ts,
        jump_impulse: 0.0,
    };
    build(id, ActorKind::Boss, cell, Vec2::new(1.5, 1.5) * ts, p, 10, brain, stats)
}
