//! Rigidbody component

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Masses below this are clamped before forming an inverse mass
const MIN_MASS: f32 = 1e-4;

/// Dynamics state for a physics-driven object
///
/// A rigidbody makes its object participate in integration and collision
/// response. Kinematic bodies opt out of both gravity and displacement;
/// their transform is driven externally (a character controller, an
/// animation) but their velocity still shoves dynamic bodies they touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Linear velocity in world units per second
    pub velocity: Vec3,
    /// Mass in arbitrary units; non-positive values are clamped on use
    pub mass: f32,
    /// Restitution factor in `[0, 1]`; the lower of a colliding pair wins
    pub bounciness: f32,
    /// Tangential damping factor in `[0, 1]`; the lower of a pair wins
    pub friction: f32,
    /// Whether world gravity accelerates this body
    pub use_gravity: bool,
    /// Kinematic bodies are never displaced by resolution
    pub is_kinematic: bool,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            mass: 1.0,
            bounciness: 0.5,
            friction: 0.1,
            use_gravity: true,
            is_kinematic: false,
        }
    }
}

impl Rigidbody {
    /// A default dynamic body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A kinematic body: externally driven, immune to gravity and push-out
    #[must_use]
    pub fn kinematic() -> Self {
        Self {
            use_gravity: false,
            is_kinematic: true,
            ..Self::default()
        }
    }

    /// Sets the mass
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Sets the restitution factor
    #[must_use]
    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    /// Inverse mass with the degenerate-mass clamp applied
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass.max(MIN_MASS)
    }
}
