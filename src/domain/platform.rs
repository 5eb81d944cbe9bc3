/// MovingPlatform: a kinematic carrier that oscillates along one axis.
///
/// Not part of the `TileGrid`. Each tick has two phases:
///
///   1. **Advance**: probe a 1-px strip at the leading edge of the
///      candidate position. A solid tile there (or the level edge, or the
///      end of the configured range) reverses the travel sign and the
///      platform does not move this tick. No partial moves.
///   2. **Carry**: every candidate body is classified against the
///      platform's position *before* this tick's move:
///
/// ┌─────────────┬──────────────────────────────────────┬───────────────────────────┐
/// │ Contact      │ Condition                            │ Effect                    │
/// ├─────────────┼──────────────────────────────────────┼───────────────────────────┤
/// │ Riding       │ ground-facing edge touches the       │ translate by delta,       │
/// │ (tested 1st) │ opposite platform edge, not moving   │ vx = delta.x,             │
/// │              │ away, spans overlap                  │ on_ground = true          │
/// │ Pushed       │ leading face sweeps into the body    │ translate along the axis  │
/// │ Crushed      │ pushed, but a solid tile is beyond   │ eliminate                 │
/// │ None         │ otherwise                            │ untouched                 │
/// └─────────────┴──────────────────────────────────────┴───────────────────────────┘
///
/// Riding is tested before pushing, so a body on top of a platform is never
/// also side-pushed by it. Riders are never owned: they are rediscovered
/// geometrically every tick.

use glam::Vec2;

use super::body::PhysicsBody;
use super::geom::Rect;
use super::grid::TileGrid;

/// Edge contact tolerance in px. Resolution places edges with `y = top - h`,
/// which does not always round-trip exactly in `f32`.
const EDGE_EPS: f32 = 1e-3;

fn touching(a: f32, b: f32) -> bool {
    (a - b).abs() <= EDGE_EPS
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "vertical" => Axis::Vertical,
            _ => Axis::Horizontal,
        }
    }

    fn unit(self) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::X,
            Axis::Vertical => Vec2::Y,
        }
    }
}

/// Result of the advance phase.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Advance {
    Moved(Vec2),
    Reversed,
}

/// Relationship between a platform and one body this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    None,
    Riding,
    Pushed,
    Crushed,
}

#[derive(Clone, Debug)]
pub struct MovingPlatform {
    pub rect: Rect,
    pub axis: Axis,
    /// Pixels per tick.
    pub speed: f32,
    /// +1 or -1 along `axis`.
    pub direction_sign: f32,
    /// Optional oscillation range in pixels, measured from the spawn
    /// position in the initial direction.
    pub range: Option<f32>,
    /// Signed distance travelled from the spawn position.
    pub traveled: f32,
    /// Position before the last committed move.
    prev_rect: Rect,
    /// Delta committed by the last `advance` (zero when it reversed).
    last_delta: Vec2,
}

impl MovingPlatform {
    pub fn new(rect: Rect, axis: Axis, speed: f32, range: Option<f32>) -> Self {
        MovingPlatform {
            rect,
            axis,
            speed,
            direction_sign: 1.0,
            range,
            traveled: 0.0,
            prev_rect: rect,
            last_delta: Vec2::ZERO,
        }
    }

    pub fn last_delta(&self) -> Vec2 {
        self.last_delta
    }

    /// Thin strip just beyond the leading edge of `at`.
    fn leading_probe(&self, at: &Rect) -> Rect {
        let forward = self.direction_sign > 0.0;
        match (self.axis, forward) {
            (Axis::Horizontal, true) => Rect::new(at.right(), at.y, 1.0, at.h),
            (Axis::Horizontal, false) => Rect::new(at.left() - 1.0, at.y, 1.0, at.h),
            (Axis::Vertical, true) => Rect::new(at.x, at.bottom(), at.w, 1.0),
            (Axis::Vertical, false) => Rect::new(at.x, at.top() - 1.0, at.w, 1.0),
        }
    }

    /// Advance phase. Reversal leaves the position untouched.
    pub fn advance(&mut self, grid: &TileGrid) -> Advance {
        self.prev_rect = self.rect;
        self.last_delta = Vec2::ZERO;

        let step = self.speed * self.direction_sign;
        let delta = self.axis.unit() * step;
        let candidate = self.rect.translated(delta);
        let probe = self.leading_probe(&candidate);

        let bounds = grid.bounds();
        let outside = probe.left() < bounds.left()
            || probe.right() > bounds.right()
            || probe.top() < bounds.top()
            || probe.bottom() > bounds.bottom();

        let past_range = self.range.is_some_and(|range| {
            let next = self.traveled + step;
            next < 0.0 || next > range
        });

        if outside || past_range || grid.any_solid_overlapping(&probe) {
            self.direction_sign = -self.direction_sign;
            return Advance::Reversed;
        }

        self.rect = candidate;
        self.traveled += step;
        self.last_delta = delta;
        Advance::Moved(delta)
    }

    /// Classify a body against the pre-move platform position.
    pub fn classify(&self, body: &PhysicsBody) -> Contact {
        if !body.is_active() || self.last_delta == Vec2::ZERO {
            return Contact::None;
        }
        let prev = &self.prev_rect;
        let b = &body.rect;

        let riding = if body.is_flipped {
            touching(b.top(), prev.bottom()) && body.velocity.y <= 0.0 && b.spans_x(prev)
        } else {
            touching(b.bottom(), prev.top()) && body.velocity.y >= 0.0 && b.spans_x(prev)
        };
        if riding {
            return Contact::Riding;
        }

        let d = self.last_delta;
        let cur = &self.rect;
        let swept = match self.axis {
            Axis::Horizontal if d.x > 0.0 => {
                b.spans_y(prev) && b.left() >= prev.right() - EDGE_EPS && b.left() < cur.right()
            }
            Axis::Horizontal => {
                b.spans_y(prev) && b.right() <= prev.left() + EDGE_EPS && b.right() > cur.left()
            }
            Axis::Vertical if d.y > 0.0 => {
                b.spans_x(prev) && b.top() >= prev.bottom() - EDGE_EPS && b.top() < cur.bottom()
            }
            Axis::Vertical => {
                b.spans_x(prev) && b.bottom() <= prev.top() + EDGE_EPS && b.bottom() > cur.top()
            }
        };
        if swept { Contact::Pushed } else { Contact::None }
    }

    /// Classify and apply the carry effect to one body. `others` holds the
    /// rects of every other platform; they block like solid tiles.
    pub fn carry(&self, body: &mut PhysicsBody, grid: &TileGrid, others: &[Rect], dying_ticks: u32) -> Contact {
        match self.classify(body) {
            Contact::Riding => self.carry_rider(body, grid, others, dying_ticks),
            Contact::Pushed => self.push(body, grid, others, dying_ticks),
            other => other,
        }
    }

    fn carry_rider(&self, body: &mut PhysicsBody, grid: &TileGrid, others: &[Rect], dying_ticks: u32) -> Contact {
        let d = self.last_delta;

        // Horizontal: a wall stops the rider, it slides off the platform.
        let moved = body.rect.translated(Vec2::new(d.x, 0.0));
        if blocked(grid, others, &moved) {
            body.hit_edge = true;
        } else {
            body.rect = moved;
        }

        // Vertical: a ceiling (or floor, when flipped) squashes the rider.
        let moved = body.rect.translated(Vec2::new(0.0, d.y));
        if blocked(grid, others, &moved) {
            body.eliminate(dying_ticks);
            return Contact::Crushed;
        }
        body.rect = moved;
        body.velocity.x = d.x;
        body.on_ground = true;
        Contact::Riding
    }

    fn push(&self, body: &mut PhysicsBody, grid: &TileGrid, others: &[Rect], dying_ticks: u32) -> Contact {
        let d = self.last_delta;
        let moved = body.rect.translated(d);
        if blocked(grid, others, &moved) {
            body.eliminate(dying_ticks);
            return Contact::Crushed;
        }
        body.rect = moved;
        if body.on_ground && self.axis == Axis::Horizontal {
            body.velocity.x = d.x;
        }
        Contact::Pushed
    }
}

fn blocked(grid: &TileGrid, others: &[Rect], rect: &Rect) -> bool {
    grid.any_solid_overlapping(rect) || others.iter().any(|o| o.overlaps(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::Life;
    use crate::domain::grid::grid_from;

    const TS: f32 = 16.0;

    fn open_room() -> TileGrid {
        grid_from(&[
            "................",
            "................",
            "................",
            "................",
            "................",
            "################",
        ], TS)
    }

    fn horizontal(x: f32, y: f32, speed: f32) -> MovingPlatform {
        MovingPlatform::new(Rect::new(x, y, 32.0, 8.0), Axis::Horizontal, speed, None)
    }

    // ── Advance ──

    #[test]
    fn advances_by_speed() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        assert_eq!(p.advance(&grid), Advance::Moved(Vec2::new(2.0, 0.0)));
        assert_eq!(p.rect.x, 34.0);
        assert_eq!(p.traveled, 2.0);
    }

    #[test]
    fn reverses_at_wall_without_moving() {
        let grid = grid_from(&[
            "......#.",
            "########",
        ], TS);
        // Right edge at 95, wall at 96: the candidate probe (97..98) hits it.
        let mut p = MovingPlatform::new(Rect::new(63.0, 0.0, 32.0, 8.0), Axis::Horizontal, 2.0, None);
        assert_eq!(p.advance(&grid), Advance::Reversed);
        assert_eq!(p.rect.x, 63.0);
        assert_eq!(p.direction_sign, -1.0);
        assert_eq!(p.last_delta(), Vec2::ZERO);
        // Next tick it heads the other way.
        assert_eq!(p.advance(&grid), Advance::Moved(Vec2::new(-2.0, 0.0)));
    }

    #[test]
    fn reverses_at_level_edge() {
        let grid = open_room();
        let mut p = horizontal(1.0, 0.0, 2.0);
        p.direction_sign = -1.0;
        assert_eq!(p.advance(&grid), Advance::Reversed);
        assert_eq!(p.rect.x, 1.0);
    }

    #[test]
    fn oscillation_range_bounds_travel() {
        let grid = open_room();
        let mut p = MovingPlatform::new(Rect::new(32.0, 8.0, 32.0, 8.0), Axis::Horizontal, 2.0, Some(4.0));
        assert!(matches!(p.advance(&grid), Advance::Moved(_)));
        assert!(matches!(p.advance(&grid), Advance::Moved(_)));
        assert_eq!(p.advance(&grid), Advance::Reversed);
        assert_eq!(p.rect.x, 36.0);
        assert!(matches!(p.advance(&grid), Advance::Moved(_)));
        assert!(matches!(p.advance(&grid), Advance::Moved(_)));
        assert_eq!(p.rect.x, 32.0);
        assert_eq!(p.advance(&grid), Advance::Reversed);
    }

    #[test]
    fn vertical_platform_reverses_at_floor() {
        let grid = open_room();
        // Bottom at 79, floor at 80.
        let mut p = MovingPlatform::new(Rect::new(16.0, 71.0, 32.0, 8.0), Axis::Vertical, 1.0, None);
        assert_eq!(p.advance(&grid), Advance::Reversed);
        assert_eq!(p.advance(&grid), Advance::Moved(Vec2::new(0.0, -1.0)));
    }

    // ── Carry ──

    fn rider_on(p: &MovingPlatform) -> PhysicsBody {
        let mut b = PhysicsBody::new(Rect::new(p.rect.x + 4.0, p.rect.y - 14.0, 10.0, 14.0), 3);
        b.on_ground = true;
        b
    }

    #[test]
    fn rider_moves_exactly_with_platform() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        let mut b = rider_on(&p);
        let x0 = b.rect.x;
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::Riding);
        assert_eq!(b.rect.x, x0 + 2.0);
        assert_eq!(b.velocity.x, 2.0);
        assert!(b.on_ground);
    }

    #[test]
    fn jumping_body_is_not_riding() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        let mut b = rider_on(&p);
        b.velocity.y = -3.0;
        p.advance(&grid);
        assert_eq!(p.classify(&b), Contact::None);
    }

    #[test]
    fn flipped_body_rides_underside() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        let mut b = PhysicsBody::new(Rect::new(40.0, 48.0, 10.0, 14.0), 3);
        b.is_flipped = true;
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::Riding);
        assert_eq!(b.rect.x, 42.0);
    }

    #[test]
    fn rider_is_never_side_pushed() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        // Standing on the very front corner: riding wins.
        let mut b = PhysicsBody::new(Rect::new(60.0, 26.0, 10.0, 14.0), 3);
        p.advance(&grid);
        assert_eq!(p.classify(&b), Contact::Riding);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::Riding);
    }

    #[test]
    fn vertical_lift_carries_rider_up() {
        let grid = open_room();
        let mut p = MovingPlatform::new(Rect::new(32.0, 60.0, 32.0, 8.0), Axis::Vertical, 1.0, None);
        p.direction_sign = -1.0;
        let mut b = rider_on(&p);
        let y0 = b.rect.y;
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::Riding);
        assert_eq!(b.rect.y, y0 - 1.0);
    }

    #[test]
    fn leading_face_pushes_body() {
        let grid = open_room();
        let mut p = horizontal(32.0, 66.0, 2.0); // right edge 64
        let mut b = PhysicsBody::new(Rect::new(64.0, 66.0, 10.0, 14.0), 3);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::Pushed);
        assert_eq!(b.rect.x, 66.0);
        assert!(b.is_active());
    }

    #[test]
    fn trailing_body_is_untouched() {
        let grid = open_room();
        let mut p = horizontal(32.0, 66.0, 2.0);
        let mut b = PhysicsBody::new(Rect::new(20.0, 66.0, 10.0, 14.0), 3);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 5), Contact::None);
        assert_eq!(b.rect.x, 20.0);
    }

    #[test]
    fn pinned_against_wall_is_crushed() {
        let grid = grid_from(&[
            "......#.",
            "......#.",
            "########",
        ], TS);
        // Body touches the wall (right = 96); platform's front face meets it.
        let mut p = MovingPlatform::new(Rect::new(40.0, 16.0, 46.0, 8.0), Axis::Horizontal, 2.0, None);
        let mut b = PhysicsBody::new(Rect::new(86.0, 18.0, 10.0, 14.0), 3);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 7), Contact::Crushed);
        assert_eq!(b.life, Life::Dying { remaining: 7 });
        assert_eq!(b.rect.right(), 96.0);
    }

    #[test]
    fn lift_crushes_rider_into_ceiling() {
        let grid = grid_from(&[
            "########",
            "........",
            "........",
            "........",
        ], TS);
        let mut p = MovingPlatform::new(Rect::new(16.0, 31.0, 32.0, 8.0), Axis::Vertical, 1.0, None);
        p.direction_sign = -1.0;
        let mut b = PhysicsBody::new(Rect::new(20.0, 16.0, 10.0, 15.0), 3);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[], 3), Contact::Crushed);
        assert!(!b.is_active());
    }

    #[test]
    fn reversed_platform_carries_nothing() {
        let grid = grid_from(&["..#", "###"], TS);
        let mut p = MovingPlatform::new(Rect::new(0.0, 0.0, 31.0, 4.0), Axis::Horizontal, 2.0, None);
        let mut b = PhysicsBody::new(Rect::new(4.0, -10.0, 4.0, 10.0), 1);
        assert_eq!(p.advance(&grid), Advance::Reversed);
        assert_eq!(p.carry(&mut b, &grid, &[], 1), Contact::None);
    }

    #[test]
    fn pushed_into_another_platform_is_crushed() {
        let grid = open_room();
        let mut p = horizontal(32.0, 66.0, 2.0); // right edge 64
        let mut b = PhysicsBody::new(Rect::new(64.0, 66.0, 10.0, 14.0), 3);
        let other = Rect::new(74.0, 60.0, 32.0, 8.0);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[other], 4), Contact::Crushed);
        assert_eq!(b.rect.x, 64.0);
        assert!(!b.is_active());
    }

    #[test]
    fn rider_stops_at_another_platform() {
        let grid = open_room();
        let mut p = horizontal(32.0, 40.0, 2.0);
        let mut b = rider_on(&p); // x 36..46
        let other = Rect::new(46.0, 20.0, 16.0, 16.0);
        p.advance(&grid);
        assert_eq!(p.carry(&mut b, &grid, &[other], 5), Contact::Riding);
        assert_eq!(b.rect.x, 36.0);
        assert!(b.hit_edge);
    }
}
