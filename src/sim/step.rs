/// The step function: advances a level by one tick.
///
/// Processing order:
///   1. Distance field rebuild (seeded from the player, on its schedule)
///   2. Player input
///   3. Gravity flips (player request + brain requests from last tick),
///      propagated to every body before anyone integrates
///   4. Body integration against grid + platforms
///   5. Platform advance and carry
///   6. Touches (hazards, pressure plates) and contact attacks
///   7. Brains decide next tick's velocities
///   8. Timers, deferred removal of expired bodies
///
/// The field therefore reflects the previous tick's positions, and
/// eliminations mid-tick only flip a body's `Life`; nothing leaves the
/// active set until step 8.

use glam::Vec2;
use log::debug;

use crate::domain::ai::{self, Ctx};
use crate::domain::body::Knockback;
use crate::domain::entity::{ActorId, ActorKind, FrameInput, Intent};
use crate::domain::geom::Rect;
use crate::domain::physics::{self, Broadphase, MotionLimits};
use crate::domain::platform::{Advance, Contact};
use super::event::{Cause, GameEvent};
use super::world::Level;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(level: &mut Level, input: &FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    level.tick += 1;

    rebuild_field(level);
    resolve_player_input(level, input, dt);
    resolve_flips(level, &mut events);
    resolve_motion(level, dt, &mut events);
    resolve_platforms(level, &mut events);
    resolve_touches(level, &mut events);
    resolve_contacts(level, &mut events);
    resolve_decisions(level, dt, &mut events);
    resolve_timers(level, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

fn rebuild_field(level: &mut Level) {
    let interval = u64::from(level.tuning.rebuild_interval.max(1));
    if (level.tick - 1) % interval != 0 {
        return;
    }
    let seed = level.player().filter(|p| p.is_active()).map(|p| p.center());
    match seed {
        Some(c) => level.field.rebuild(&level.grid, c.x, c.y, level.tuning.max_depth),
        None => level.field.clear(),
    }
}

fn resolve_player_input(level: &mut Level, input: &FrameInput, dt: f32) {
    let Some(player) = level.player_mut() else { return };
    if ai::drive_player(player, input, dt) == Intent::FlipGravity {
        level.pending_flips += 1;
    }
}

fn resolve_flips(level: &mut Level, events: &mut Vec<GameEvent>) {
    for _ in 0..std::mem::take(&mut level.pending_flips) {
        let inverted = level.flip_gravity();
        events.push(GameEvent::GravityFlipped { inverted });
    }
}

fn resolve_motion(level: &mut Level, dt: f32, events: &mut Vec<GameEvent>) {
    let bp = Broadphase::new(&level.grid, &level.platforms, level.tuning.broadphase_radius);
    let limits = MotionLimits {
        max_fall_speed: level.tuning.max_fall_speed,
        dying_ticks: level.tuning.dying_ticks,
    };
    for a in level.actors.iter_mut().filter(|a| a.is_active()) {
        let out = physics::integrate(&mut a.body, &bp, &level.gravity, dt, &limits);
        if out.out_of_bounds {
            debug!("{:?} {} left the level", a.id, a.kind.tag());
            events.push(GameEvent::BodyEliminated { id: a.id, cause: Cause::OutOfBounds });
        }
    }
}

fn resolve_platforms(level: &mut Level, events: &mut Vec<GameEvent>) {
    let dying = level.tuning.dying_ticks;
    for index in 0..level.platforms.len() {
        if level.platforms[index].advance(&level.grid) == Advance::Reversed {
            events.push(GameEvent::PlatformReversed { index });
            continue;
        }
        let others: Vec<Rect> = level
            .platforms
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, o)| o.rect)
            .collect();
        let p = &level.platforms[index];
        for a in level.actors.iter_mut().filter(|a| a.kind.is_carryable()) {
            if p.carry(&mut a.body, &level.grid, &others, dying) == Contact::Crushed {
                debug!("{:?} {} crushed by platform {index}", a.id, a.kind.tag());
                events.push(GameEvent::BodyEliminated { id: a.id, cause: Cause::Crushed });
            }
        }
    }
}

/// Hazard overlap for every body, pressure-plate contact for the player.
fn resolve_touches(level: &mut Level, events: &mut Vec<GameEvent>) {
    let stun = level.tuning.hit_stun_ticks;
    let default_damage = level.tuning.hazard_damage;

    for a in level.actors.iter_mut().filter(|a| a.is_active()) {
        let Some(hazard) = level.hazards.iter().find(|h| h.hitbox.overlaps(&a.body.rect)) else {
            continue;
        };
        let damage = hazard.damage(default_damage) as i32;
        events.push(GameEvent::HazardTouched { id: a.id, cell: hazard.cell, damage });
        // Knockback only lands outside stun.
        let impulse = Knockback::DEFAULT.impulse(hazard.hitbox.center(), &a.body);
        a.body.take_hit(impulse, stun);
    }

    let Some(player) = level.player().filter(|p| p.is_active()) else { return };
    let reach = player.body.rect.expanded(1.0);
    for tile in level.grid.tiles_near(&reach, 1) {
        if tile.is_pressure_plate() && tile.hitbox.overlaps(&reach) {
            events.push(GameEvent::PlateTouched {
                cell: tile.cell,
                target: tile.meta.str("target").map(str::to_owned),
            });
        }
    }
}

/// A hostile body overlapping the player hits it.
fn resolve_contacts(level: &mut Level, events: &mut Vec<GameEvent>) {
    let Some(player) = level.player().filter(|p| p.is_active()) else { return };
    let target = player.body.rect;

    let attackers: Vec<(ActorId, Vec2, Knockback, i32)> = level.actors.iter()
        .filter(|a| a.is_active() && a.kind.is_hostile())
        .filter(|a| a.body.rect.overlaps(&target))
        // Stunned chargers and batteries do not strike on contact.
        .filter(|a| !(a.kind == ActorKind::Charger && a.body.stun > 0))
        .filter(|a| a.kind != ActorKind::Battery)
        .map(|a| (a.id, a.center(), a.stats.knockback(), a.stats.damage))
        .collect();

    for (attacker, from, kb, damage) in attackers {
        hit_player(level, attacker, from, kb, damage, events);
    }
}

fn resolve_decisions(level: &mut Level, dt: f32, events: &mut Vec<GameEvent>) {
    let player = level.player().filter(|p| p.is_active()).map(|p| p.body.rect);
    let ctx = Ctx { grid: &level.grid, field: &level.field, player, dt };

    let mut intents: Vec<(ActorId, Vec2, Intent)> = Vec::new();
    for a in level.actors.iter_mut().filter(|a| a.kind != ActorKind::Player) {
        let intent = ai::decide(a, &ctx);
        if intent != Intent::Idle {
            intents.push((a.id, a.center(), intent));
        }
    }

    for (id, from, intent) in intents {
        match intent {
            Intent::Idle => {}
            Intent::FlipGravity => level.pending_flips += 1,
            Intent::Explode { radius } => explode(level, id, from, radius, events),
            Intent::Fire => {
                let Some(shooter) = level.actor(id) else { continue };
                let (kb, damage) = (shooter.stats.knockback(), shooter.stats.damage);
                hit_player(level, id, from, kb, damage, events);
            }
        }
    }
}

fn resolve_timers(level: &mut Level, events: &mut Vec<GameEvent>) {
    let mut expired = Vec::new();
    for a in level.actors.iter_mut() {
        if a.body.tick_timers() {
            expired.push(a.id);
        }
    }
    if expired.is_empty() {
        return;
    }
    level.actors.retain(|a| !expired.contains(&a.id));
    for id in expired {
        events.push(GameEvent::BodyRemoved { id });
    }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn hit_player(
    level: &mut Level,
    attacker: ActorId,
    from: Vec2,
    kb: Knockback,
    damage: i32,
    events: &mut Vec<GameEvent>,
) {
    let stun = level.tuning.hit_stun_ticks;
    let Some(player) = level.player_mut().filter(|p| p.is_active()) else { return };
    let impulse = kb.impulse(from, &player.body);
    if player.body.take_hit(impulse, stun) {
        events.push(GameEvent::BodyHit { victim: player.id, attacker, damage });
    }
}

/// Knock back every other active body in `radius`, then eliminate the
/// exploding actor.
fn explode(level: &mut Level, id: ActorId, from: Vec2, radius: f32, events: &mut Vec<GameEvent>) {
    let stun = level.tuning.hit_stun_ticks;
    let dying = level.tuning.dying_ticks;
    let Some((kb, damage)) = level.actor(id).map(|a| (a.stats.knockback(), a.stats.damage)) else {
        return;
    };
    events.push(GameEvent::Exploded { id, radius });

    for a in level.actors.iter_mut().filter(|a| a.id != id && a.is_active()) {
        if a.center().distance(from) > radius {
            continue;
        }
        let impulse = kb.impulse(from, &a.body);
        if a.body.take_hit(impulse, stun) {
            events.push(GameEvent::BodyHit { victim: a.id, attacker: id, damage });
        }
    }

    if let Some(a) = level.actor_mut(id) {
        if a.body.eliminate(dying) {
            events.push(GameEvent::BodyEliminated { id, cause: Cause::Exploded });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
