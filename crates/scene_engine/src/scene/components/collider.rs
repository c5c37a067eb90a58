//! Collider components
//!
//! Colliders are plain data plus geometry queries. Dispatch over the
//! collider kind is a closed enum match; there is no trait-object
//! registry to consult at query time. All variants answer two questions:
//! a conservative world-space AABB for the broad phase, and a precise
//! raycast for picking and gameplay queries.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};
use crate::physics::bounds::Bounds;
use crate::physics::bvh::MeshBvh;
use crate::physics::raycast::Ray;

/// Tolerance used to classify which box face a ray hit landed on
const FACE_EPSILON: f32 = 1e-4;

/// Axis-aligned box collider
///
/// Boxes never rotate: whatever the owning object's rotation, the
/// world-space box stays axis-aligned. Size scales with the absolute
/// world scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    /// Full extents of the box on each axis, in local units
    pub size: Vec3,
    /// Center offset from the owning object's position
    pub offset: Vec3,
}

impl BoxCollider {
    /// Creates a box collider of the given size, centered on the object
    #[must_use]
    pub fn new(size: Vec3) -> Self {
        Self {
            size,
            offset: Vec3::zeros(),
        }
    }

    /// Sets the center offset
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// World-space bounds under the given transform
    #[must_use]
    pub fn world_bounds(&self, transform: &Transform) -> Bounds {
        let center = transform.position + self.offset;
        let size = Vec3::new(
            self.size.x * transform.scale.x.abs(),
            self.size.y * transform.scale.y.abs(),
            self.size.z * transform.scale.z.abs(),
        );
        Bounds::from_center_size(center, size)
    }
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, 1.0, 1.0))
    }
}

/// Sphere collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    /// Sphere radius in world units
    pub radius: f32,
    /// Center offset from the owning object's position
    pub offset: Vec3,
}

impl SphereCollider {
    /// Creates a sphere collider of the given radius, centered on the object
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec3::zeros(),
        }
    }

    /// Sets the center offset
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// World-space center under the given transform
    #[must_use]
    pub fn world_center(&self, transform: &Transform) -> Vec3 {
        transform.position + self.offset
    }

    /// World-space bounds: a cube of side `2 * radius` around the center
    #[must_use]
    pub fn world_bounds(&self, transform: &Transform) -> Bounds {
        let diameter = 2.0 * self.radius;
        Bounds::from_center_size(
            self.world_center(transform),
            Vec3::new(diameter, diameter, diameter),
        )
    }
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Triangle-mesh collider backed by a BVH
///
/// Geometry is baked in world space at build time; the owning transform
/// is ignored by queries. Serialization carries no geometry: a mesh
/// collider round-trips as an empty shell and is rebuilt from its model
/// on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshCollider {
    #[serde(skip)]
    bvh: MeshBvh,
}

impl MeshCollider {
    /// Creates an empty, unbuilt mesh collider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the collision hierarchy from world-space geometry
    ///
    /// Expensive; call at load or attach time, never per frame.
    pub fn build_from_geometry(&mut self, vertices: &[Vec3], indices: &[u32]) {
        self.bvh.build_from_geometry(vertices, indices);
    }

    /// True once geometry has been built
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.bvh.is_built()
    }

    /// Number of triangles in the hierarchy
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.bvh.triangle_count()
    }

    /// The underlying hierarchy, for direct queries like sphere push-out
    #[must_use]
    pub fn bvh(&self) -> &MeshBvh {
        &self.bvh
    }
}

/// Any collider shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Collider {
    /// Axis-aligned box
    Box(BoxCollider),
    /// Sphere
    Sphere(SphereCollider),
    /// Baked triangle mesh
    Mesh(MeshCollider),
}

impl From<BoxCollider> for Collider {
    fn from(collider: BoxCollider) -> Self {
        Self::Box(collider)
    }
}

impl From<SphereCollider> for Collider {
    fn from(collider: SphereCollider) -> Self {
        Self::Sphere(collider)
    }
}

impl From<MeshCollider> for Collider {
    fn from(collider: MeshCollider) -> Self {
        Self::Mesh(collider)
    }
}

impl Collider {
    /// World-space AABB under the given transform
    ///
    /// Degenerate shapes (non-positive size or radius, unbuilt mesh)
    /// collapse to a zero-volume box that never overlaps anything.
    #[must_use]
    pub fn world_bounds(&self, transform: &Transform) -> Bounds {
        match self {
            Self::Box(collider) => collider.world_bounds(transform),
            Self::Sphere(collider) => collider.world_bounds(transform),
            Self::Mesh(collider) => collider.bvh.bounds(),
        }
    }

    /// Precise raycast against the collider
    ///
    /// Returns `(distance, world point, surface normal)` for the nearest
    /// hit within `max_distance`, or `None` on a miss, a degenerate ray,
    /// or a degenerate shape.
    #[must_use]
    pub fn raycast(
        &self,
        transform: &Transform,
        ray: &Ray,
        max_distance: f32,
    ) -> Option<(f32, Vec3, Vec3)> {
        if ray.is_degenerate() {
            return None;
        }
        match self {
            Self::Box(collider) => raycast_box(&collider.world_bounds(transform), ray, max_distance),
            Self::Sphere(collider) => raycast_sphere(
                collider.world_center(transform),
                collider.radius,
                ray,
                max_distance,
            ),
            Self::Mesh(collider) => collider.bvh.raycast(ray, max_distance),
        }
    }
}

/// Slab-method ray/box intersection with face-normal recovery
fn raycast_box(bounds: &Bounds, ray: &Ray, max_distance: f32) -> Option<(f32, Vec3, Vec3)> {
    let size = bounds.size();
    if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
        return None;
    }

    let (t_near, _) = bounds.intersect_ray(ray, max_distance)?;
    let point = ray.point_at(t_near);

    // The hit face is the one whose plane the hit point lies on
    let mut normal = Vec3::zeros();
    for axis in 0..3 {
        if (point[axis] - bounds.min[axis]).abs() < FACE_EPSILON {
            normal[axis] = -1.0;
            break;
        }
        if (point[axis] - bounds.max[axis]).abs() < FACE_EPSILON {
            normal[axis] = 1.0;
            break;
        }
    }
    if normal == Vec3::zeros() {
        // Ray started inside the box; report the entry point facing back
        normal = -ray.direction;
    }

    Some((t_near, point, normal))
}

/// Closed-form ray/sphere intersection, nearest non-negative root
fn raycast_sphere(
    center: Vec3,
    radius: f32,
    ray: &Ray,
    max_distance: f32,
) -> Option<(f32, Vec3, Vec3)> {
    if radius <= 0.0 {
        return None;
    }

    let oc = ray.origin - center;
    let half_b = oc.dot(&ray.direction);
    let c = oc.magnitude_squared() - radius * radius;
    let discriminant = half_b * half_b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let mut t = -half_b - sqrt_d;
    if t < 0.0 {
        t = -half_b + sqrt_d;
    }
    if t < 0.0 || t > max_distance {
        return None;
    }

    let point = ray.point_at(t);
    let normal = (point - center) / radius;
    Some((t, point, normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_bounds_apply_offset_and_scale() {
        let collider = BoxCollider::new(Vec3::new(2.0, 2.0, 2.0))
            .with_offset(Vec3::new(0.0, 1.0, 0.0));
        let mut transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        transform.scale = Vec3::new(2.0, -1.0, 1.0);

        let bounds = collider.world_bounds(&transform);
        assert_eq!(bounds.center(), Vec3::new(10.0, 1.0, 0.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_rotation_does_not_tilt_box_bounds() {
        use crate::foundation::math::Quat;
        let collider = BoxCollider::new(Vec3::new(2.0, 1.0, 1.0));
        let upright = Transform::identity();
        let rotated = Transform::from_position_rotation(
            Vec3::zeros(),
            Quat::from_axis_angle(&nalgebra::Vector3::z_axis(), 1.0),
        );
        assert_eq!(
            collider.world_bounds(&upright),
            collider.world_bounds(&rotated)
        );
    }

    #[test]
    fn test_degenerate_box_never_overlaps() {
        let collider = BoxCollider::new(Vec3::new(0.0, 1.0, 1.0));
        let bounds = collider.world_bounds(&Transform::identity());
        let other = Bounds::from_center_size(Vec3::zeros(), Vec3::new(5.0, 5.0, 5.0));
        assert!(!bounds.overlaps(&other));
    }

    #[test]
    fn test_sphere_raycast_scenario() {
        // Unit sphere at origin, ray from (5,0,0) toward -X: hit at distance
        // 4, point (1,0,0), normal +X.
        let collider: Collider = SphereCollider::new(1.0).into();
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let (distance, point, normal) = collider
            .raycast(&Transform::identity(), &ray, 100.0)
            .unwrap();
        assert_relative_eq!(distance, 4.0, epsilon = 1e-5);
        assert_relative_eq!(point.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(normal.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_raycast_miss_and_degenerate() {
        let collider: Collider = SphereCollider::new(1.0).into();
        let miss = Ray::new(Vec3::new(5.0, 3.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(collider.raycast(&Transform::identity(), &miss, 100.0).is_none());

        let degenerate: Collider = SphereCollider::new(-1.0).into();
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(degenerate.raycast(&Transform::identity(), &ray, 100.0).is_none());
    }

    #[test]
    fn test_box_raycast_reports_hit_face() {
        let collider: Collider = BoxCollider::new(Vec3::new(2.0, 2.0, 2.0)).into();
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        let (distance, point, normal) = collider.raycast(&transform, &ray, 100.0).unwrap();
        assert_relative_eq!(distance, 4.0, epsilon = 1e-5);
        assert_relative_eq!(point.z, -4.0, epsilon = 1e-5);
        assert_eq!(normal, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_zero_length_ray_hits_nothing() {
        let collider: Collider = BoxCollider::new(Vec3::new(2.0, 2.0, 2.0)).into();
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::zeros());
        assert!(collider.raycast(&Transform::identity(), &ray, 100.0).is_none());
    }

    #[test]
    fn test_unbuilt_mesh_is_inert() {
        let collider: Collider = MeshCollider::new().into();
        let bounds = collider.world_bounds(&Transform::identity());
        assert_eq!(bounds.size(), Vec3::zeros());
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(collider.raycast(&Transform::identity(), &ray, 100.0).is_none());
    }

    #[test]
    fn test_mesh_collider_queries_geometry() {
        let mut mesh = MeshCollider::new();
        // Single ground quad at y = 0
        let vertices = [
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(-5.0, 0.0, 5.0),
        ];
        mesh.build_from_geometry(&vertices, &[0, 2, 1, 0, 3, 2]);
        assert!(mesh.is_built());
        assert_eq!(mesh.triangle_count(), 2);

        let collider: Collider = mesh.into();
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let (distance, _, normal) = collider.raycast(&Transform::identity(), &ray, 100.0).unwrap();
        assert_relative_eq!(distance, 3.0, epsilon = 1e-5);
        assert_relative_eq!(normal.y, 1.0, epsilon = 1e-5);
    }
}
