/// Events emitted during a simulation step.
/// Collaborators outside the core (damage, level transitions, rendering)
/// consume these; the core itself never acts on them.

use crate::domain::entity::ActorId;

/// Why a body was eliminated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cause {
    /// Leading edge left the level.
    OutOfBounds,
    /// Squashed by a moving platform.
    Crushed,
    /// A battery blew itself up.
    Exploded,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    GravityFlipped { inverted: bool },
    BodyEliminated { id: ActorId, cause: Cause },
    /// Dying linger expired; the body left the active set.
    BodyRemoved { id: ActorId },
    BodyHit { victim: ActorId, attacker: ActorId, damage: i32 },
    HazardTouched { id: ActorId, cell: (usize, usize), damage: i32 },
    PlateTouched { cell: (usize, usize), target: Option<String> },
    PlatformReversed { index: usize },
    Exploded { id: ActorId, radius: f32 },
}
