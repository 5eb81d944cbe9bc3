/// PhysicsBody: the movement/collision contract shared by every dynamic
/// actor (player, enemies, projectiles).
///
/// Velocity is in pixels per tick. The body owns its own flip hook and its
/// elimination transition; integration against the world lives in
/// `physics.rs`.
///
/// ## Life cycle
///
///   Alive ──eliminate()──► Dying { remaining } ──(0 or despawn)──► removed
///
/// Dying is terminal: no physics, no AI, no carry. Removal from the active
/// set happens at the end of a tick (or via `Level::despawn`), never while
/// the set is being iterated.

use glam::Vec2;

use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Life {
    Alive,
    Dying { remaining: u32 },
}

/// What a body does when world gravity flips.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlipResponse {
    /// Invert vertical velocity, leave the ground, mirror.
    Mirror,
    /// Gravity-immune: only the polarity flag follows the world.
    Ignore,
}

/// Knockback injected into a victim by an attacker. Actors without an
/// explicit override use `Knockback::DEFAULT` (3 px/tick away, 2 px/tick up).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Knockback {
    pub x: f32,
    pub y: f32,
}

impl Knockback {
    pub const DEFAULT: Knockback = Knockback { x: 3.0, y: 2.0 };

    /// Velocity to inject: horizontally away from the attacker, vertically
    /// against the victim's gravity.
    pub fn impulse(&self, attacker: Vec2, victim: &PhysicsBody) -> Vec2 {
        let away = if victim.rect.center().x >= attacker.x { 1.0 } else { -1.0 };
        Vec2::new(self.x * away, -self.y * victim.down_sign())
    }
}

impl Default for Knockback {
    fn default() -> Self {
        Knockback::DEFAULT
    }
}

#[derive(Clone, Debug)]
pub struct PhysicsBody {
    pub rect: Rect,
    pub velocity: Vec2,
    pub on_ground: bool,
    pub facing_right: bool,
    /// Mirrors the level's gravity polarity.
    pub is_flipped: bool,
    /// Set by the horizontal collision pass; read by AI for patrol reversal.
    pub hit_edge: bool,
    pub stun: u32,
    pub apply_gravity: bool,
    pub health: i32,
    pub max_health: i32,
    pub life: Life,
}

impl PhysicsBody {
    pub fn new(rect: Rect, max_health: i32) -> Self {
        PhysicsBody {
            rect,
            velocity: Vec2::ZERO,
            on_ground: false,
            facing_right: true,
            is_flipped: false,
            hit_edge: false,
            stun: 0,
            apply_gravity: true,
            health: max_health,
            max_health,
            life: Life::Alive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.life == Life::Alive
    }

    /// +1 when gravity pulls this body toward larger y, -1 when flipped.
    pub fn down_sign(&self) -> f32 {
        if self.is_flipped { -1.0 } else { 1.0 }
    }

    /// The flip hook. Every active body gets it; `Ignore` still tracks the
    /// polarity flag so `is_flipped` always matches the world.
    pub fn flip_gravity(&mut self, response: FlipResponse) {
        if response == FlipResponse::Mirror {
            self.velocity.y = -self.velocity.y;
            self.on_ground = false;
        }
        self.is_flipped = !self.is_flipped;
    }

    /// Terminal transition. Returns false if the body was already dying.
    pub fn eliminate(&mut self, linger_ticks: u32) -> bool {
        if !self.is_active() {
            return false;
        }
        self.health = 0;
        self.velocity = Vec2::ZERO;
        self.on_ground = false;
        self.life = Life::Dying { remaining: linger_ticks };
        true
    }

    /// Inject a hit. Ignored while stunned (hit-stun doubles as i-frames).
    /// Returns whether the hit landed.
    pub fn take_hit(&mut self, impulse: Vec2, stun_ticks: u32) -> bool {
        if !self.is_active() || self.stun > 0 {
            return false;
        }
        self.velocity += impulse;
        self.on_ground = false;
        self.stun = stun_ticks;
        true
    }

    /// Advance timers. Returns true when a dying body's linger expired.
    pub fn tick_timers(&mut self) -> bool {
        if self.stun > 0 {
            self.stun -= 1;
        }
        match self.life {
            Life::Alive => false,
            Life::Dying { remaining: 0 } => true,
            Life::Dying { remaining } => {
                self.life = Life::Dying { remaining: remaining - 1 };
                remaining == 1
            }
        }
    }

    /// 1-px strip just beyond the feet, in the direction gravity pulls.
    pub fn ground_probe(&self, gravity_sign: i8) -> Rect {
        let r = &self.rect;
        if gravity_sign >= 0 {
            Rect::new(r.x, r.bottom(), r.w, 1.0)
        } else {
            Rect::new(r.x, r.top() - 1.0, r.w, 1.0)
        }
    }
}
