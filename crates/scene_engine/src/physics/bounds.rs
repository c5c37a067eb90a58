//! Axis-aligned bounding boxes and minimum-translation-vector resolution
//!
//! `Bounds` is the workhorse of the broad phase: every collider can produce
//! a world-space AABB, overlap tests are three interval checks, and
//! penetration is resolved by the smallest single-axis push-out vector.

use crate::foundation::math::{utils, Vec3};
use crate::physics::raycast::Ray;

/// An axis-aligned bounding box in world space
///
/// Invariant: `min <= max` componentwise. Bounds are ephemeral values,
/// recomputed from a collider and its owning object's transform on every
/// query rather than cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Create bounds from a center point and full size dimensions
    ///
    /// Negative size components are clamped to zero, so a degenerate
    /// collider collapses to a zero-volume box that never overlaps
    /// anything.
    #[must_use]
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = Vec3::new(
            (size.x * 0.5).max(0.0),
            (size.y * 0.5).max(0.0),
            (size.z * 0.5).max(0.0),
        );
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Create bounds directly from corner points
    #[must_use]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            min: utils::vec3_min(min, max),
            max: utils::vec3_max(min, max),
        }
    }

    /// A zero-volume box at the origin
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vec3::zeros(),
            max: Vec3::zeros(),
        }
    }

    /// Center point of the box
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size of the box on each axis
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow the bounds to contain a point
    pub fn grow_to_contain(&mut self, point: Vec3) {
        self.min = utils::vec3_min(self.min, point);
        self.max = utils::vec3_max(self.max, point);
    }

    /// The smallest bounds containing both inputs
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: utils::vec3_min(self.min, other.min),
            max: utils::vec3_max(self.max, other.max),
        }
    }

    /// Check whether two boxes overlap with positive volume
    ///
    /// Touching faces do not count: the overlap must be strictly positive
    /// on all three axes. Zero-volume boxes therefore never overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max.x.min(other.max.x) - self.min.x.max(other.min.x) > 0.0
            && self.max.y.min(other.max.y) - self.min.y.max(other.min.y) > 0.0
            && self.max.z.min(other.max.z) - self.min.z.max(other.min.z) > 0.0
    }

    /// Minimum translation vector pushing `self` out of `other`
    ///
    /// Returns the zero vector when the boxes do not overlap. Otherwise
    /// the axis with the smallest penetration depth wins; ties are broken
    /// by axis evaluation order (X, then Y, then Z), which is arbitrary
    /// but deterministic. The sign follows the center difference on the
    /// chosen axis so that displacing `self` by the result separates it
    /// from `other`, giving `a.resolve(b) == -b.resolve(a)` — except when
    /// the centers coincide on the chosen axis, where no direction is
    /// preferable and both orders push toward positive.
    #[must_use]
    pub fn resolve(&self, other: &Self) -> Vec3 {
        let depth = Vec3::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
            self.max.z.min(other.max.z) - self.min.z.max(other.min.z),
        );

        if depth.x <= 0.0 || depth.y <= 0.0 || depth.z <= 0.0 {
            return Vec3::zeros();
        }

        let mut axis = 0;
        if depth.y < depth[axis] {
            axis = 1;
        }
        if depth.z < depth[axis] {
            axis = 2;
        }

        let offset = self.center()[axis] - other.center()[axis];
        let sign = if offset >= 0.0 { 1.0 } else { -1.0 };

        let mut mtv = Vec3::zeros();
        mtv[axis] = sign * depth[axis];
        mtv
    }

    /// Slab test of a ray against the box
    ///
    /// Returns the entry and exit distances `(t_near, t_far)` when the ray
    /// crosses the box within `max_distance`, with `t_near` clamped to
    /// zero for rays starting inside.
    #[must_use]
    pub fn intersect_ray(&self, ray: &Ray, max_distance: f32) -> Option<(f32, f32)> {
        let mut t_near = 0.0_f32;
        let mut t_far = max_distance;

        for axis in 0..3 {
            let dir = ray.direction[axis];
            let origin = ray.origin[axis];

            if dir.abs() < f32::EPSILON {
                // Parallel ray misses unless the origin lies inside the slab
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        Some((t_near, t_far))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(center: Vec3) -> Bounds {
        Bounds::from_center_size(center, Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_center_size() {
        let b = Bounds::from_center_size(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_negative_size_collapses_to_zero_volume() {
        let b = Bounds::from_center_size(Vec3::zeros(), Vec3::new(-2.0, 1.0, 1.0));
        assert_eq!(b.min.x, 0.0);
        assert_eq!(b.max.x, 0.0);
        assert!(!b.overlaps(&unit_box_at(Vec3::zeros())));
    }

    #[test]
    fn test_touching_faces_do_not_overlap() {
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(!a.overlaps(&b));
        assert_eq!(a.resolve(&b), Vec3::zeros());
    }

    #[test]
    fn test_overlap_scenario_half_unit() {
        // Box(1,1,1) at origin vs Box(1,1,1) at (0.5,0,0): overlap, |mtv| = 0.5 on X
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(0.5, 0.0, 0.0));
        assert!(a.overlaps(&b));

        let mtv = a.resolve(&b);
        assert_relative_eq!(mtv.x, -0.5);
        assert_eq!(mtv.y, 0.0);
        assert_eq!(mtv.z, 0.0);
    }

    #[test]
    fn test_resolve_anti_symmetry() {
        let a = unit_box_at(Vec3::new(0.2, 0.1, -0.3));
        let b = unit_box_at(Vec3::new(0.5, 0.4, 0.0));
        assert!(a.overlaps(&b));
        assert_eq!(a.resolve(&b), -b.resolve(&a));
    }

    #[test]
    fn test_coincident_centers_push_positive_for_both_orders() {
        // With identical boxes there is nothing to break the tie from;
        // both argument orders resolve along +X.
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::zeros());
        assert_eq!(a.resolve(&b), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(b.resolve(&a), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_resolve_zero_when_disjoint() {
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(a.resolve(&b), Vec3::zeros());
        assert_eq!(b.resolve(&a), Vec3::zeros());
    }

    #[test]
    fn test_resolve_separates_boxes() {
        let mut a = unit_box_at(Vec3::new(0.25, 0.125, 0.0625));
        let b = unit_box_at(Vec3::zeros());
        let mtv = a.resolve(&b);
        a.min += mtv;
        a.max += mtv;
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_resolve_picks_least_penetration_axis() {
        // Deep on X and Z, shallow on Y: push-out must be vertical.
        let a = Bounds::from_center_size(Vec3::new(0.0, 0.9, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = Bounds::from_center_size(Vec3::zeros(), Vec3::new(4.0, 1.0, 4.0));
        let mtv = a.resolve(&b);
        assert_eq!(mtv.x, 0.0);
        assert_eq!(mtv.z, 0.0);
        assert_relative_eq!(mtv.y, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_axis_tie_breaks_to_x() {
        // Identical penetration on all axes: X wins by evaluation order.
        let a = unit_box_at(Vec3::new(0.5, 0.5, 0.5));
        let b = unit_box_at(Vec3::zeros());
        let mtv = a.resolve(&b);
        assert!(mtv.x > 0.0);
        assert_eq!(mtv.y, 0.0);
        assert_eq!(mtv.z, 0.0);
    }

    #[test]
    fn test_ray_slab_hit_and_miss() {
        let b = unit_box_at(Vec3::zeros());
        let hit_ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let (t_near, t_far) = b.intersect_ray(&hit_ray, 100.0).unwrap();
        assert_relative_eq!(t_near, 4.5);
        assert_relative_eq!(t_far, 5.5);

        let miss_ray = Ray::new(Vec3::new(-5.0, 2.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(b.intersect_ray(&miss_ray, 100.0).is_none());
    }

    #[test]
    fn test_ray_starting_inside_clamps_entry() {
        let b = unit_box_at(Vec3::zeros());
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));
        let (t_near, t_far) = b.intersect_ray(&ray, 100.0).unwrap();
        assert_eq!(t_near, 0.0);
        assert_relative_eq!(t_far, 0.5);
    }

    #[test]
    fn test_merged_contains_both() {
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(3.0, 1.0, -2.0));
        let m = a.merged(&b);
        assert_eq!(m.min, Vec3::new(-0.5, -0.5, -2.5));
        assert_eq!(m.max, Vec3::new(3.5, 1.5, 0.5));
    }
}
