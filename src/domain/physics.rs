/// Body integration and collision resolution.
///
/// ## Architecture
///
/// Two obstacle sources, unioned at query time by `Broadphase`:
///   1. STATIC  : solid tiles indexed in the `TileGrid`
///   2. KINEMATIC: moving platforms overlapping the query area
///
/// Both come back as `Obstacle`s, so platform collisions reuse the exact
/// call site of tile collisions.
///
/// ## Per-tick integration (`integrate`)
///
///   1. Gravity   : `vy += g * sign * dt` (clamped to `max_fall_speed`)
///   2. Horizontal: move x, clamp against every overlapping obstacle,
///                   zero `vx`, raise `hit_edge`
///   3. Vertical  : move y, clamp bottom→top (moving down in world terms)
///                   or top→bottom (moving up), zero `vy`
///   4. Grounded  : 1-px probe beyond the feet in gravity's direction;
///                   independent of step 3 so resting on a still platform
///                   counts as grounded
///   5. Bounds    : leading edge past the level boundary → eliminated
///
/// Axes are resolved independently, not as one swept move: a body may
/// "corner" around an obstacle when each single-axis move clears it on its
/// own. That behavior is relied on (enemies squeeze past corners) and must
/// stay. Per-tick displacement is assumed to stay under one tile.

use super::body::PhysicsBody;
use super::geom::Rect;
use super::gravity::GravityField;
use super::grid::TileGrid;
use super::platform::MovingPlatform;
use super::tile::CollisionKind;

/// Where an obstacle came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObstacleKind {
    Tile { cell: (usize, usize), collision: CollisionKind },
    Platform(usize),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Obstacle {
    pub rect: Rect,
    pub kind: ObstacleKind,
}

/// Collision broad-phase over the static grid plus the live platforms.
pub struct Broadphase<'a> {
    pub grid: &'a TileGrid,
    pub platforms: &'a [MovingPlatform],
    pub radius: i32,
}

impl<'a> Broadphase<'a> {
    pub fn new(grid: &'a TileGrid, platforms: &'a [MovingPlatform], radius: i32) -> Self {
        Broadphase { grid, platforms, radius }
    }

    /// Solid tiles in the neighbourhood of `area`, plus every platform whose
    /// hitbox currently overlaps `area`.
    pub fn query(&self, area: &Rect) -> Vec<Obstacle> {
        let mut out: Vec<Obstacle> = self.grid
            .tiles_near(area, self.radius)
            .map(|t| Obstacle {
                rect: t.hitbox,
                kind: ObstacleKind::Tile { cell: t.cell, collision: t.collision },
            })
            .collect();
        for (i, p) in self.platforms.iter().enumerate() {
            if p.rect.overlaps(area) {
                out.push(Obstacle { rect: p.rect, kind: ObstacleKind::Platform(i) });
            }
        }
        out
    }

    /// Does anything solid overlap `area`?
    pub fn blocked(&self, area: &Rect) -> bool {
        self.query(area).iter().any(|o| o.rect.overlaps(area))
    }
}

/// Gameplay caps that keep integration inside its assumptions.
#[derive(Clone, Copy, Debug)]
pub struct MotionLimits {
    pub max_fall_speed: f32,
    /// Ticks an eliminated body lingers in the dying state.
    pub dying_ticks: u32,
}

/// What happened to a body during `integrate`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StepOutcome {
    pub hit_wall: bool,
    pub landed: bool,
    pub out_of_bounds: bool,
}

/// Advance one body by one tick against the world.
pub fn integrate(
    body: &mut PhysicsBody,
    bp: &Broadphase,
    gravity: &GravityField,
    dt: f32,
    limits: &MotionLimits,
) -> StepOutcome {
    let mut out = StepOutcome::default();
    if !body.is_active() {
        return out;
    }

    // 1. Gravity
    if body.apply_gravity {
        body.velocity.y += gravity.pull(dt);
        let cap = limits.max_fall_speed;
        body.velocity.y = body.velocity.y.clamp(-cap, cap);
    }

    // 2. Horizontal pass
    body.hit_edge = false;
    resolve_horizontal(body, bp);
    clamp_to_level_sides(body, bp.grid.bounds());
    out.hit_wall = body.hit_edge;

    // 3. Vertical pass
    let was_grounded = body.on_ground;
    resolve_vertical(body, bp);

    // 4. Grounded check (decoupled from the vertical pass)
    body.on_ground = bp.blocked(&body.ground_probe(gravity.sign()));
    out.landed = body.on_ground && !was_grounded;

    // 5. Bounds
    if leading_edge_out(body, bp.grid.bounds()) {
        body.eliminate(limits.dying_ticks);
        out.out_of_bounds = true;
    }

    out
}

fn resolve_horizontal(body: &mut PhysicsBody, bp: &Broadphase) {
    let vx = body.velocity.x;
    body.rect.x += vx;
    if vx == 0.0 {
        return;
    }
    for obs in bp.query(&body.rect) {
        if !body.rect.overlaps(&obs.rect) {
            continue;
        }
        if vx > 0.0 {
            body.rect.set_right(obs.rect.left());
        } else {
            body.rect.x = obs.rect.right();
        }
        body.velocity.x = 0.0;
        body.hit_edge = true;
    }
}

fn resolve_vertical(body: &mut PhysicsBody, bp: &Broadphase) {
    let vy = body.velocity.y;
    body.rect.y += vy;
    if vy == 0.0 {
        return;
    }
    for obs in bp.query(&body.rect) {
        if !body.rect.overlaps(&obs.rect) {
            continue;
        }
        // World sign, not body-relative: positive vy moves toward larger y.
        if vy > 0.0 {
            body.rect.set_bottom(obs.rect.top());
        } else {
            body.rect.y = obs.rect.bottom();
        }
        body.velocity.y = 0.0;
    }
}

/// Bodies cannot leave the level sideways; touching a side counts as an edge.
fn clamp_to_level_sides(body: &mut PhysicsBody, bounds: Rect) {
    if body.rect.left() < bounds.left() {
        body.rect.x = bounds.left();
        body.velocity.x = 0.0;
        body.hit_edge = true;
    } else if body.rect.right() > bounds.right() {
        body.rect.set_right(bounds.right());
        body.velocity.x = 0.0;
        body.hit_edge = true;
    }
}

/// Leading edge = bottom when upright, top when flipped.
fn leading_edge_out(body: &PhysicsBody, bounds: Rect) -> bool {
    if body.is_flipped {
        body.rect.top() < bounds.top()
    } else {
        body.rect.bottom() > bounds.bottom()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::Life;
    use crate::domain::grid::grid_from;
    use crate::domain::platform::{Axis, MovingPlatform};
    use glam::Vec2;

    const TS: f32 = 16.0;
    const DT: f32 = 1.0 / 60.0;

    fn limits() -> MotionLimits {
        MotionLimits { max_fall_speed: 12.0, dying_ticks: 10 }
    }

    fn body_at(x: f32, y: f32) -> PhysicsBody {
        PhysicsBody::new(Rect::new(x, y, 10.0, 14.0), 3)
    }

    fn run(body: &mut PhysicsBody, grid: &TileGrid, platforms: &[MovingPlatform], g: &GravityField) -> StepOutcome {
        let bp = Broadphase::new(grid, platforms, 2);
        integrate(body, &bp, g, DT, &limits())
    }

    fn assert_clear(body: &PhysicsBody, grid: &TileGrid) {
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                if let Some(t) = grid.tile_at_cell(x, y) {
                    assert!(!body.rect.overlaps(&t.hitbox), "body {:?} overlaps {:?}", body.rect, t.cell);
                }
            }
        }
    }

    // ── Horizontal ──

    #[test]
    fn stops_exactly_at_wall() {
        let grid = grid_from(&[
            "........",
            "......#.",
            "########",
        ], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(70.0, 18.0);
        b.velocity.x = 4.0;
        let mut contact = false;
        for _ in 0..20 {
            b.velocity.x = 4.0;
            let out = run(&mut b, &grid, &[], &g);
            if out.hit_wall {
                contact = true;
                break;
            }
        }
        assert!(contact);
        assert_eq!(b.rect.right(), 96.0);
        assert_eq!(b.velocity.x, 0.0);
        assert!(b.hit_edge);
    }

    #[test]
    fn moving_left_clamps_to_right_face() {
        let grid = grid_from(&["#.......", "########"], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(19.0, 2.0);
        b.velocity.x = -4.0;
        run(&mut b, &grid, &[], &g);
        assert_eq!(b.rect.left(), 16.0);
        assert!(b.hit_edge);
    }

    #[test]
    fn level_sides_are_walls() {
        let grid = grid_from(&["....", "####"], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(52.0, 2.0);
        b.velocity.x = 6.0;
        run(&mut b, &grid, &[], &g);
        assert_eq!(b.rect.right(), 64.0);
        assert!(b.hit_edge);
    }

    // ── Vertical / grounded ──

    #[test]
    fn falls_and_lands_on_floor() {
        let grid = grid_from(&["....", "....", "####"], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(4.0, 0.0);
        for _ in 0..120 {
            run(&mut b, &grid, &[], &g);
            assert_clear(&b, &grid);
        }
        assert_eq!(b.rect.bottom(), 32.0);
        assert!(b.on_ground);
        assert_eq!(b.velocity.y, 0.0);
    }

    #[test]
    fn flipped_gravity_lands_on_ceiling() {
        let grid = grid_from(&["####", "....", "...."], TS);
        let mut g = GravityField::new(30.0);
        g.flip();
        let mut b = body_at(4.0, 30.0);
        b.is_flipped = true;
        for _ in 0..120 {
            run(&mut b, &grid, &[], &g);
            assert_clear(&b, &grid);
        }
        assert_eq!(b.rect.top(), 16.0);
        assert!(b.on_ground);
    }

    #[test]
    fn fall_speed_is_capped() {
        let grid = grid_from(&["....", "....", "....", "....", "...."], TS);
        let g = GravityField::new(30_000.0);
        let mut b = body_at(4.0, 0.0);
        run(&mut b, &grid, &[], &g);
        assert_eq!(b.velocity.y, 12.0);
    }

    #[test]
    fn grounded_on_resting_platform() {
        let grid = grid_from(&["....", "....", "....", "...."], TS);
        let g = GravityField::new(30.0);
        let plat = MovingPlatform::new(Rect::new(0.0, 40.0, 32.0, 8.0), Axis::Horizontal, 0.0, None);
        let mut b = body_at(4.0, 26.0); // bottom = 40
        run(&mut b, &grid, std::slice::from_ref(&plat), &g);
        assert!(b.on_ground);
        assert_eq!(b.rect.bottom(), 40.0);
    }

    #[test]
    fn no_overlap_after_diagonal_approach() {
        let grid = grid_from(&[
            "........",
            "...##...",
            "...##...",
            "........",
            "########",
        ], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(30.0, 2.0);
        for i in 0..90 {
            b.velocity.x = if i % 40 < 20 { 3.0 } else { -3.0 };
            run(&mut b, &grid, &[], &g);
            assert_clear(&b, &grid);
        }
    }

    #[test]
    fn axes_resolve_independently() {
        // Landing on the floor clamps only y; the x displacement survives.
        let grid = grid_from(&["....", "....", "####"], TS);
        let g = GravityField::new(0.0);
        let mut b = PhysicsBody::new(Rect::new(2.0, 26.0, 4.0, 4.0), 1);
        b.velocity = Vec2::new(5.0, 4.0);
        let out = run(&mut b, &grid, &[], &g);
        assert!(!out.hit_wall);
        assert_eq!(b.rect.pos(), Vec2::new(7.0, 28.0));
        assert_eq!(b.velocity, Vec2::new(5.0, 0.0));
        assert!(b.on_ground);
    }

    // ── Bounds ──

    #[test]
    fn falling_out_of_level_eliminates() {
        let grid = grid_from(&["....", "...."], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(4.0, 20.0);
        b.velocity.y = 10.0;
        let out = run(&mut b, &grid, &[], &g);
        assert!(out.out_of_bounds);
        assert_eq!(b.health, 0);
        assert_eq!(b.life, Life::Dying { remaining: 10 });
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn flipped_body_leaves_through_top() {
        let grid = grid_from(&["....", "...."], TS);
        let mut g = GravityField::new(30.0);
        g.flip();
        let mut b = body_at(4.0, 2.0);
        b.is_flipped = true;
        b.velocity.y = -5.0;
        assert!(run(&mut b, &grid, &[], &g).out_of_bounds);
    }

    #[test]
    fn dying_body_is_frozen() {
        let grid = grid_from(&["....", "...."], TS);
        let g = GravityField::new(30.0);
        let mut b = body_at(4.0, 2.0);
        b.eliminate(5);
        let before = b.rect;
        run(&mut b, &grid, &[], &g);
        assert_eq!(b.rect, before);
    }
}
