//! Rays and raycast query results
//!
//! Rays come from editor picking and gameplay code. Raycasts are
//! synchronous queries, independent of the simulation step.

use crate::foundation::math::Vec3;
use crate::scene::GameObjectId;

/// Directions shorter than this are treated as degenerate: every query
/// against such a ray reports no hit instead of dividing by zero.
pub(crate) const MIN_DIRECTION_LENGTH_SQUARED: f32 = 1e-12;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized; zero for degenerate input)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// The direction is normalized. A zero-length direction is kept as the
    /// zero vector and flags the ray as degenerate rather than producing
    /// NaN components.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = if direction.magnitude_squared() > MIN_DIRECTION_LENGTH_SQUARED {
            direction.normalize()
        } else {
            Vec3::zeros()
        };
        Self { origin, direction }
    }

    /// True when the ray was built from a zero-length direction
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.direction.magnitude_squared() <= MIN_DIRECTION_LENGTH_SQUARED
    }

    /// Get a point along the ray at distance t
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a raycast query
///
/// Transient value: holds a handle to the hit object, never a reference
/// into the scene.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The scene object that was hit
    pub object: GameObjectId,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
}
