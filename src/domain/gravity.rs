/// GravityField: the level's single source of truth for "which way is down".
///
/// Owned by the `Level` value (never a process-wide singleton), so two
/// levels or two test harnesses run independent physics worlds.
/// `flip()` only negates the sign; propagating the flip to bodies is the
/// level's job (see `Level::flip_gravity`), which does it for every active
/// body before anyone integrates again.

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GravityField {
    magnitude: f32,
    sign: i8,
}

impl GravityField {
    pub fn new(magnitude: f32) -> Self {
        GravityField { magnitude: magnitude.abs(), sign: 1 }
    }

    pub fn magnitude(&self) -> f32 { self.magnitude }

    /// +1 = pulls toward larger y (down the screen), -1 = inverted.
    pub fn sign(&self) -> i8 { self.sign }

    pub fn is_inverted(&self) -> bool { self.sign < 0 }

    pub fn flip(&mut self) {
        self.sign = -self.sign;
    }

    /// Velocity change for one tick of length `dt`.
    pub fn pull(&self, dt: f32) -> f32 {
        self.magnitude * f32::from(self.sign) * dt
    }
}
