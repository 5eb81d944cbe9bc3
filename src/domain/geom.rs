/// Axis-aligned rectangles in world pixels.
///
/// Every collision shape in the simulation (body, tile hitbox, platform,
/// probe strip) is a `Rect`. Coordinates are top-left + size, y grows
/// downward. Overlap is strict: two rects that only share an edge do NOT
/// overlap, which is what lets a body rest exactly on a floor.

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 { self.x }
    #[inline]
    pub fn right(&self) -> f32 { self.x + self.w }
    #[inline]
    pub fn top(&self) -> f32 { self.y }
    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.h }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Move so that the right edge sits at `right`.
    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.w;
    }

    /// Move so that the bottom edge sits at `bottom`.
    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.h;
    }

    /// Grown by `by` px on every side (touch tests).
    pub fn expanded(&self, by: f32) -> Rect {
        Rect::new(self.x - by, self.y - by, self.w + 2.0 * by, self.h + 2.0 * by)
    }

    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect { x: self.x + delta.x, y: self.y + delta.y, ..*self }
    }

    /// Strict interior overlap (touching edges do not count).
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Do the horizontal spans overlap (strictly)?
    #[inline]
    pub fn spans_x(&self, other: &Rect) -> bool {
        self.left() < other.right() && self.right() > other.left()
    }

    /// Do the vertical spans overlap (strictly)?
    #[inline]
    pub fn spans_y(&self, other: &Rect) -> bool {
        self.top() < other.bottom() && self.bottom() > other.top()
    }
}
