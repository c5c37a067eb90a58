//! Triangle-mesh bounding volume hierarchy
//!
//! A `MeshBvh` is built once from mesh geometry baked into world space and
//! is immutable until an explicit rebuild. It accelerates precise
//! ray/triangle queries: the tree is a binary partition of triangle
//! indices along the longest axis of each node's bounds, and traversal
//! rejects whole subtrees on a bounds miss before testing individual
//! triangles with Möller-Trumbore.

use crate::foundation::math::{utils, Vec3};
use crate::physics::bounds::Bounds;
use crate::physics::raycast::Ray;

/// Numerical tolerance for ray/triangle parallelism and push directions
const EPSILON: f32 = 1e-6;

/// Leaves stop subdividing at this triangle count
const LEAF_TRIANGLE_LIMIT: usize = 4;

/// Hard depth cap; guards pathological geometry that refuses to split
const MAX_DEPTH: usize = 20;

/// A triangle with a precomputed face normal
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex in world space
    pub v0: Vec3,
    /// Second vertex in world space
    pub v1: Vec3,
    /// Third vertex in world space
    pub v2: Vec3,
    /// Unit face normal (right-hand rule); zero for degenerate triangles
    pub normal: Vec3,
}

impl Triangle {
    /// Creates a triangle, precomputing its normal
    #[must_use]
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let cross = (v1 - v0).cross(&(v2 - v0));
        let normal = if cross.magnitude_squared() > EPSILON * EPSILON {
            cross.normalize()
        } else {
            Vec3::zeros()
        };
        Self { v0, v1, v2, normal }
    }

    /// Centroid of the triangle
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore ray-triangle intersection
    ///
    /// Returns the distance along the ray, or `None` for a miss, a
    /// parallel ray, or a hit behind the origin.
    #[must_use]
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let det = edge1.dot(&h);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = inv_det * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = inv_det * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(&q);
        (t >= 0.0).then_some(t)
    }

    /// Closest point on the triangle to a point, via barycentric regions
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let ab = self.v1 - self.v0;
        let ac = self.v2 - self.v0;
        let ap = point - self.v0;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        let bp = point - self.v1;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return self.v0 + ab * v;
        }

        let cp = point - self.v2;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.v0 + ab * v + ac * w
    }

    fn bounds(&self) -> Bounds {
        let min = utils::vec3_min(utils::vec3_min(self.v0, self.v1), self.v2);
        let max = utils::vec3_max(utils::vec3_max(self.v0, self.v1), self.v2);
        Bounds::from_min_max(min, max)
    }
}

/// Binary tree node over triangle indices
#[derive(Debug, Clone)]
enum BvhNode {
    Branch {
        bounds: Bounds,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
    Leaf {
        bounds: Bounds,
        triangles: Vec<u32>,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Bounds {
        match self {
            Self::Branch { bounds, .. } | Self::Leaf { bounds, .. } => bounds,
        }
    }
}

/// Bounding volume hierarchy over a triangle mesh
///
/// Building is a synchronous, potentially expensive operation and belongs
/// at load/attach time, never inside the per-frame step.
#[derive(Debug, Clone, Default)]
pub struct MeshBvh {
    triangles: Vec<Triangle>,
    root: Option<Box<BvhNode>>,
}

impl MeshBvh {
    /// Creates an empty, unbuilt hierarchy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the hierarchy from indexed geometry
    ///
    /// Vertices are expected in world space. Index triples pointing past
    /// the vertex array are skipped. Empty geometry leaves the hierarchy
    /// unbuilt; every query then reports no hit.
    pub fn build_from_geometry(&mut self, vertices: &[Vec3], indices: &[u32]) {
        self.triangles.clear();
        self.root = None;

        for chunk in indices.chunks_exact(3) {
            let (i0, i1, i2) = (chunk[0] as usize, chunk[1] as usize, chunk[2] as usize);
            if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
                continue;
            }
            self.triangles
                .push(Triangle::new(vertices[i0], vertices[i1], vertices[i2]));
        }

        if self.triangles.is_empty() {
            return;
        }

        let all: Vec<u32> = (0..self.triangles.len() as u32).collect();
        self.root = Some(Box::new(self.build_node(all, 0)));
    }

    /// True once geometry has been built into the hierarchy
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    /// Number of triangles in the hierarchy
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Bounds of the whole mesh (zero-volume when unbuilt)
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.root
            .as_deref()
            .map_or_else(Bounds::empty, |root| *root.bounds())
    }

    fn build_node(&self, indices: Vec<u32>, depth: usize) -> BvhNode {
        let bounds = self.compute_bounds(&indices);

        if indices.len() <= LEAF_TRIANGLE_LIMIT || depth > MAX_DEPTH {
            return BvhNode::Leaf {
                bounds,
                triangles: indices,
            };
        }

        // Split along the longest axis at the mean centroid
        let size = bounds.size();
        let mut axis = 0;
        if size.y > size[axis] {
            axis = 1;
        }
        if size.z > size[axis] {
            axis = 2;
        }

        let mean = indices
            .iter()
            .map(|&i| self.triangles[i as usize].centroid()[axis])
            .sum::<f32>()
            / indices.len() as f32;

        let (left, right): (Vec<u32>, Vec<u32>) = indices
            .iter()
            .partition(|&&i| self.triangles[i as usize].centroid()[axis] < mean);

        if left.is_empty() || right.is_empty() {
            // Degenerate split (e.g. coincident centroids): stop here
            return BvhNode::Leaf {
                bounds,
                triangles: indices,
            };
        }

        BvhNode::Branch {
            bounds,
            left: Box::new(self.build_node(left, depth + 1)),
            right: Box::new(self.build_node(right, depth + 1)),
        }
    }

    fn compute_bounds(&self, indices: &[u32]) -> Bounds {
        let mut iter = indices.iter();
        let first = match iter.next() {
            Some(&i) => self.triangles[i as usize].bounds(),
            None => return Bounds::empty(),
        };
        iter.fold(first, |acc, &i| {
            acc.merged(&self.triangles[i as usize].bounds())
        })
    }

    /// Nearest ray hit within `max_distance`
    ///
    /// Returns `(distance, world point, surface normal)`. Traversal visits
    /// the child whose bounds the ray enters first, pruning subtrees that
    /// cannot beat the best hit found so far.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<(f32, Vec3, Vec3)> {
        if ray.is_degenerate() {
            return None;
        }
        let root = self.root.as_deref()?;

        let mut best: Option<(f32, u32)> = None;
        Self::raycast_node(&self.triangles, root, ray, max_distance, &mut best);

        best.map(|(t, index)| {
            let triangle = &self.triangles[index as usize];
            (t, ray.point_at(t), triangle.normal)
        })
    }

    fn raycast_node(
        triangles: &[Triangle],
        node: &BvhNode,
        ray: &Ray,
        max_distance: f32,
        best: &mut Option<(f32, u32)>,
    ) {
        let limit = best.map_or(max_distance, |(t, _)| t);
        let Some((t_near, _)) = node.bounds().intersect_ray(ray, max_distance) else {
            return;
        };
        if t_near > limit {
            return;
        }

        match node {
            BvhNode::Leaf { triangles: ids, .. } => {
                for &index in ids {
                    if let Some(t) = triangles[index as usize].intersect_ray(ray) {
                        if t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
                            *best = Some((t, index));
                        }
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                let entry = |child: &BvhNode| {
                    child
                        .bounds()
                        .intersect_ray(ray, max_distance)
                        .map(|(near, _)| near)
                };
                let (first, second) = match (entry(left), entry(right)) {
                    (Some(a), Some(b)) if b < a => (right, left),
                    _ => (left, right),
                };
                Self::raycast_node(triangles, first, ray, max_distance, best);
                Self::raycast_node(triangles, second, ray, max_distance, best);
            }
        }
    }

    /// Reference raycast: linear scan over every triangle
    ///
    /// Kept as the validation oracle for the hierarchy; traversal and this
    /// scan must agree on the nearest hit for any ray.
    #[must_use]
    pub fn raycast_brute_force(&self, ray: &Ray, max_distance: f32) -> Option<(f32, Vec3, Vec3)> {
        if ray.is_degenerate() || !self.is_built() {
            return None;
        }

        let mut best: Option<(f32, &Triangle)> = None;
        for triangle in &self.triangles {
            if let Some(t) = triangle.intersect_ray(ray) {
                if t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
                    best = Some((t, triangle));
                }
            }
        }
        best.map(|(t, triangle)| (t, ray.point_at(t), triangle.normal))
    }

    /// Push-out vector for a sphere overlapping the mesh
    ///
    /// Collects candidate triangles whose node bounds touch the sphere's
    /// AABB, then accumulates the strongest per-axis push from
    /// closest-point tests. This is how the physics step and the
    /// character mover resolve bodies against mesh colliders.
    #[must_use]
    pub fn sphere_intersect(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        let root = self.root.as_deref()?;
        if radius <= 0.0 {
            return None;
        }

        let query = Bounds::from_center_size(center, Vec3::new(2.0, 2.0, 2.0) * radius);
        let mut candidates = Vec::new();
        Self::collect_overlapping(root, &query, &mut candidates);

        let mut push = Vec3::zeros();
        let mut hit = false;

        for index in candidates {
            let triangle = &self.triangles[index as usize];
            let closest = triangle.closest_point(center);
            let diff = center - closest;
            let dist_sq = diff.magnitude_squared();
            if dist_sq >= radius * radius {
                continue;
            }

            hit = true;
            let dist = dist_sq.sqrt();
            let correction = if dist < EPSILON {
                // Center sits on the triangle: push along the face normal
                triangle.normal * radius
            } else {
                diff * ((radius - dist) / dist)
            };

            // Keep the strongest push per axis rather than summing,
            // so shared edges between triangles don't double-correct
            for axis in 0..3 {
                if correction[axis].abs() > push[axis].abs() {
                    push[axis] = correction[axis];
                }
            }
        }

        hit.then_some(push)
    }

    fn collect_overlapping(node: &BvhNode, query: &Bounds, out: &mut Vec<u32>) {
        if !bounds_touch(node.bounds(), query) {
            return;
        }
        match node {
            BvhNode::Leaf { triangles, .. } => out.extend_from_slice(triangles),
            BvhNode::Branch { left, right, .. } => {
                Self::collect_overlapping(left, query, out);
                Self::collect_overlapping(right, query, out);
            }
        }
    }
}

/// Inclusive bounds test for candidate collection
///
/// Node bounds of flat geometry have zero extent on one axis, so the
/// strict-overlap test used between colliders would prune them away;
/// touching must count here.
fn bounds_touch(a: &Bounds, b: &Bounds) -> bool {
    a.min.x <= b.max.x
        && a.max.x >= b.min.x
        && a.min.y <= b.max.y
        && a.max.y >= b.min.y
        && a.min.z <= b.max.z
        && a.max.z >= b.min.z
}
