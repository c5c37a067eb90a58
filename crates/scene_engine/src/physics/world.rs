//! The physics world
//!
//! Owns bucketed handle lists into the scene arena and advances the
//! simulation: integrate dynamic bodies, find overlapping pairs, resolve
//! each pair once. The broad phase is exhaustive and pairwise; an
//! optional compute backend may accelerate it, but the CPU path is always
//! present and produces identical pairs.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::foundation::math::{Transform, Vec3};
use crate::physics::bounds::Bounds;
use crate::physics::compute::{cpu_overlap_pairs, ComputeBackend};
use crate::physics::raycast::{Ray, RaycastHit};
use crate::scene::components::Collider;
use crate::scene::{GameObjectId, Scene};

/// Push vectors shorter than this produce no velocity response
const MIN_PUSH_LENGTH: f32 = 1e-4;

/// An unordered pair of objects in contact, stored in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactPair {
    /// Lower handle of the pair
    pub a: GameObjectId,
    /// Higher handle of the pair
    pub b: GameObjectId,
}

impl ContactPair {
    /// Builds the canonical ordering for two handles
    #[must_use]
    pub fn new(x: GameObjectId, y: GameObjectId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

/// Lifecycle of a contact between two objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// The pair began overlapping this step
    Started,
    /// The pair stopped overlapping this step
    Ended,
}

/// A contact transition produced by [`PhysicsWorld::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// The objects involved
    pub pair: ContactPair,
    /// Whether the contact started or ended
    pub kind: ContactKind,
}

/// How an object participates in resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyClass {
    /// No rigidbody: immovable scenery
    Static,
    /// Kinematic rigidbody: externally driven, never displaced
    Kinematic,
    /// Dynamic rigidbody: integrated and displaced
    Dynamic,
}

/// The simulation container
///
/// Holds handles only; all object state lives in the [`Scene`]. Objects
/// are classified into buckets when added and re-classified only by
/// removing and re-adding them after a component change.
pub struct PhysicsWorld {
    /// World gravity acceleration in units per second squared
    pub gravity: Vec3,

    dynamics: Vec<GameObjectId>,
    kinematics: Vec<GameObjectId>,
    statics: Vec<GameObjectId>,
    collidables: Vec<GameObjectId>,
    meshes: Vec<GameObjectId>,

    backend: Option<Box<dyn ComputeBackend>>,

    active_contacts: HashSet<ContactPair>,
    pending_events: Vec<ContactEvent>,

    last_logged_count: usize,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// A world with default gravity `(0, -20, 0)`
    #[must_use]
    pub fn new() -> Self {
        Self::with_gravity(Vec3::new(0.0, -20.0, 0.0))
    }

    /// A world with explicit gravity
    #[must_use]
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            dynamics: Vec::new(),
            kinematics: Vec::new(),
            statics: Vec::new(),
            collidables: Vec::new(),
            meshes: Vec::new(),
            backend: None,
            active_contacts: HashSet::new(),
            pending_events: Vec::new(),
            last_logged_count: 0,
        }
    }

    /// Install a broad-phase compute backend
    ///
    /// Injected once at startup; there is no dynamic backend discovery.
    /// The CPU path remains available and takes over on any backend error.
    pub fn set_compute_backend(&mut self, backend: Box<dyn ComputeBackend>) {
        info!("physics: compute backend '{}' attached", backend.name());
        self.backend = Some(backend);
    }

    /// Whether a compute backend is currently installed
    #[must_use]
    pub fn has_compute_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Register an object with the world
    ///
    /// Classification reads the object's components once, here: no
    /// rigidbody makes it static, a kinematic rigidbody makes it
    /// kinematic, anything else is dynamic. Adding an already-registered
    /// object re-classifies it.
    pub fn add_object(&mut self, scene: &Scene, id: GameObjectId) {
        let Some(object) = scene.get(id) else {
            warn!("physics: ignoring stale handle in add_object");
            return;
        };

        self.remove_object(id);

        match object.rigidbody() {
            None => self.statics.push(id),
            Some(rb) if rb.is_kinematic => self.kinematics.push(id),
            Some(_) => self.dynamics.push(id),
        }
        if let Some(collider) = object.collider() {
            self.collidables.push(id);
            if matches!(collider, Collider::Mesh(_)) {
                self.meshes.push(id);
            }
        }
    }

    /// Drop an object from every bucket
    ///
    /// Safe to call with stale or unregistered handles.
    pub fn remove_object(&mut self, id: GameObjectId) {
        self.dynamics.retain(|&o| o != id);
        self.kinematics.retain(|&o| o != id);
        self.statics.retain(|&o| o != id);
        self.collidables.retain(|&o| o != id);
        self.meshes.retain(|&o| o != id);
    }

    /// All registered objects carrying a collider, in insertion order
    #[must_use]
    pub fn get_collidable_objects(&self) -> &[GameObjectId] {
        &self.collidables
    }

    /// Number of dynamic bodies
    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    /// Contact transitions accumulated since the last drain
    pub fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Nearest raycast hit over all collidable objects
    ///
    /// Inactive objects and stale handles are skipped. A zero-length
    /// direction hits nothing.
    #[must_use]
    pub fn raycast(
        &self,
        scene: &Scene,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(origin, direction);
        if ray.is_degenerate() {
            return None;
        }

        let mut best: Option<RaycastHit> = None;
        for &id in &self.collidables {
            let Some(object) = scene.get(id) else {
                continue;
            };
            if !object.active {
                continue;
            }
            let Some(collider) = object.collider() else {
                continue;
            };
            let Some(transform) = scene.world_transform(id) else {
                continue;
            };

            if let Some((distance, point, normal)) = collider.raycast(&transform, &ray, max_distance)
            {
                if best.as_ref().map_or(true, |hit| distance < hit.distance) {
                    best = Some(RaycastHit {
                        object: id,
                        distance,
                        point,
                        normal,
                    });
                }
            }
        }
        best
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Integration first, then a single broad-phase and resolution pass
    /// over the box/sphere collidables, then a precise pass resolving
    /// bodies against triangle-mesh colliders. Each overlapping pair is
    /// resolved exactly once per step; there is no iterative relaxation,
    /// so deeply stacked configurations may need several steps to fully
    /// separate.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        self.integrate(scene, dt);

        let snapshot = self.collect_bounds(scene);
        let pairs = self.broad_phase(&snapshot);

        let mut current = HashSet::new();
        for (i, j) in pairs {
            let id_a = snapshot[i as usize].0;
            let id_b = snapshot[j as usize].0;
            if self.resolve_pair(scene, id_a, id_b) {
                current.insert(ContactPair::new(id_a, id_b));
            }
        }

        // Mesh contacts bypass the AABB pass entirely: a mesh's root
        // bounds say nothing about where its surface is, so bodies are
        // tested against the triangles themselves. Dynamics get pushed
        // out; kinematics only report the contact.
        for &mesh_id in &self.meshes {
            for &id in &self.dynamics {
                if resolve_against_mesh(scene, id, mesh_id, true) {
                    current.insert(ContactPair::new(id, mesh_id));
                }
            }
            for &id in &self.kinematics {
                if resolve_against_mesh(scene, id, mesh_id, false) {
                    current.insert(ContactPair::new(id, mesh_id));
                }
            }
        }

        self.emit_contact_events(current);
        self.log_milestones();
    }

    /// Gravity and position integration for dynamic bodies
    fn integrate(&self, scene: &mut Scene, dt: f32) {
        for &id in &self.dynamics {
            let Some(object) = scene.get_mut(id) else {
                continue;
            };
            if !object.active {
                continue;
            }
            let Some(rb) = object.rigidbody_mut() else {
                continue;
            };
            if rb.use_gravity {
                rb.velocity += self.gravity * dt;
            }
            let velocity = rb.velocity;
            object.transform.position += velocity * dt;
        }
    }

    /// World-space bounds for every active box/sphere collidable
    ///
    /// Mesh colliders are excluded; they are resolved against triangles
    /// in their own pass, never against their root bounds.
    fn collect_bounds(&self, scene: &Scene) -> Vec<(GameObjectId, Bounds)> {
        let mut snapshot = Vec::with_capacity(self.collidables.len());
        for &id in &self.collidables {
            let Some(object) = scene.get(id) else {
                continue;
            };
            if !object.active {
                continue;
            }
            let Some(collider) = object.collider() else {
                continue;
            };
            if matches!(collider, Collider::Mesh(_)) {
                continue;
            }
            let Some(transform) = scene.world_transform(id) else {
                continue;
            };
            snapshot.push((id, collider.world_bounds(&transform)));
        }
        snapshot
    }

    /// Overlapping index pairs, sorted for deterministic resolution order
    fn broad_phase(&mut self, snapshot: &[(GameObjectId, Bounds)]) -> Vec<(u32, u32)> {
        let bounds: Vec<Bounds> = snapshot.iter().map(|&(_, b)| b).collect();

        let mut pairs = match self.backend.as_mut() {
            Some(backend) => match backend.overlap_pairs(&bounds) {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!(
                        "physics: compute backend '{}' failed ({e}), using cpu broad phase",
                        backend.name()
                    );
                    cpu_overlap_pairs(&bounds)
                }
            },
            None => cpu_overlap_pairs(&bounds),
        };

        let limit = bounds.len() as u32;
        pairs.retain(|&(i, j)| i < limit && j < limit && i != j);
        for pair in &mut pairs {
            if pair.0 > pair.1 {
                *pair = (pair.1, pair.0);
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn classify(&self, id: GameObjectId) -> BodyClass {
        // Bucket membership decides the class, not the live component:
        // an object edited after add_object keeps its old role until
        // re-added.
        if self.dynamics.contains(&id) {
            BodyClass::Dynamic
        } else if self.kinematics.contains(&id) {
            BodyClass::Kinematic
        } else {
            BodyClass::Static
        }
    }

    /// Resolve one pair; returns whether the bounds actually overlapped
    ///
    /// Bounds are recomputed from live transforms, so earlier resolutions
    /// in the same step are taken into account.
    fn resolve_pair(&self, scene: &mut Scene, id_a: GameObjectId, id_b: GameObjectId) -> bool {
        let (Some(obj_a), Some(obj_b)) = (scene.get(id_a), scene.get(id_b)) else {
            return false;
        };
        let (Some(col_a), Some(col_b)) = (obj_a.collider(), obj_b.collider()) else {
            return false;
        };
        let (Some(tf_a), Some(tf_b)) = (scene.world_transform(id_a), scene.world_transform(id_b))
        else {
            return false;
        };

        let bounds_a = col_a.world_bounds(&tf_a);
        let bounds_b = col_b.world_bounds(&tf_b);
        let mtv = bounds_a.resolve(&bounds_b);
        if mtv == Vec3::zeros() {
            return false;
        }

        let class_a = self.classify(id_a);
        let class_b = self.classify(id_b);

        match (class_a, class_b) {
            (BodyClass::Dynamic, BodyClass::Dynamic) => {
                resolve_dynamic_pair(scene, id_a, id_b, mtv);
            }
            (BodyClass::Dynamic, _) => {
                resolve_against_immovable(scene, id_a, id_b, mtv);
            }
            (_, BodyClass::Dynamic) => {
                resolve_against_immovable(scene, id_b, id_a, -mtv);
            }
            // Two immovable objects interpenetrating is a contact but
            // nothing to resolve
            _ => {}
        }
        true
    }

    /// Diff this step's contacts against the previous step's
    fn emit_contact_events(&mut self, current: HashSet<ContactPair>) {
        let mut started: Vec<ContactPair> =
            current.difference(&self.active_contacts).copied().collect();
        let mut ended: Vec<ContactPair> =
            self.active_contacts.difference(&current).copied().collect();
        started.sort_unstable();
        ended.sort_unstable();

        self.pending_events.extend(started.into_iter().map(|pair| ContactEvent {
            pair,
            kind: ContactKind::Started,
        }));
        self.pending_events.extend(ended.into_iter().map(|pair| ContactEvent {
            pair,
            kind: ContactKind::Ended,
        }));

        self.active_contacts = current;
    }

    fn log_milestones(&mut self) {
        let count = self.collidables.len();
        if count > 0 && count % 100 == 0 && count != self.last_logged_count {
            self.last_logged_count = count;
            let mode = if self.backend.is_some() {
                "compute"
            } else {
                "cpu"
            };
            debug!("physics: {count} collidable objects ({mode} broad phase)");
        }
    }
}

/// Dynamic body vs static or kinematic obstacle: full push-out
///
/// `mtv` pushes the dynamic side out of the obstacle. The obstacle is
/// never displaced, but a kinematic obstacle's velocity enters the
/// relative-velocity test so moving platforms and characters shove
/// dynamic bodies instead of phasing through them.
fn resolve_against_immovable(
    scene: &mut Scene,
    dynamic_id: GameObjectId,
    obstacle_id: GameObjectId,
    mtv: Vec3,
) {
    let obstacle_velocity;
    let obstacle_bounciness;
    let obstacle_friction;
    {
        let Some(obstacle) = scene.get(obstacle_id) else {
            return;
        };
        match obstacle.rigidbody() {
            Some(rb) => {
                obstacle_velocity = rb.velocity;
                obstacle_bounciness = Some(rb.bounciness);
                obstacle_friction = Some(rb.friction);
            }
            None => {
                obstacle_velocity = Vec3::zeros();
                obstacle_bounciness = None;
                obstacle_friction = None;
            }
        }
    }

    let Some(object) = scene.get_mut(dynamic_id) else {
        return;
    };
    object.transform.position += mtv;

    let Some(rb) = object.rigidbody_mut() else {
        return;
    };

    let push_length = mtv.magnitude();
    if push_length < MIN_PUSH_LENGTH {
        return;
    }
    let normal = mtv / push_length;

    let relative = rb.velocity - obstacle_velocity;
    let along_normal = relative.dot(&normal);
    if along_normal >= 0.0 {
        return;
    }

    // The less bouncy and less slippery participant wins
    let bounciness = obstacle_bounciness.map_or(rb.bounciness, |b| rb.bounciness.min(b));
    let friction = obstacle_friction.map_or(rb.friction, |f| rb.friction.min(f));

    rb.velocity -= normal * ((1.0 + bounciness) * along_normal);

    let normal_part = normal * rb.velocity.dot(&normal);
    let tangential = rb.velocity - normal_part;
    rb.velocity = normal_part + tangential * (1.0 - friction);
}

/// Dynamic vs dynamic: split displacement by inverse mass, exchange impulse
fn resolve_dynamic_pair(scene: &mut Scene, id_a: GameObjectId, id_b: GameObjectId, mtv: Vec3) {
    let Some([obj_a, obj_b]) = scene.get_disjoint_mut([id_a, id_b]) else {
        return;
    };

    let (Some(rb_a), Some(rb_b)) = (obj_a.rigidbody().copied(), obj_b.rigidbody().copied()) else {
        return;
    };

    let inv_a = rb_a.inverse_mass();
    let inv_b = rb_b.inverse_mass();
    let inv_sum = inv_a + inv_b;

    obj_a.transform.position += mtv * (inv_a / inv_sum);
    obj_b.transform.position -= mtv * (inv_b / inv_sum);

    let push_length = mtv.magnitude();
    if push_length < MIN_PUSH_LENGTH {
        return;
    }
    let normal = mtv / push_length;

    let relative = rb_a.velocity - rb_b.velocity;
    let along_normal = relative.dot(&normal);
    if along_normal >= 0.0 {
        return;
    }

    let bounciness = rb_a.bounciness.min(rb_b.bounciness);
    let friction = rb_a.friction.min(rb_b.friction);

    let impulse = normal * (-(1.0 + bounciness) * along_normal / inv_sum);

    let damp = |velocity: Vec3| {
        let normal_part = normal * velocity.dot(&normal);
        normal_part + (velocity - normal_part) * (1.0 - friction)
    };

    if let Some(rb) = obj_a.rigidbody_mut() {
        rb.velocity = damp(rb.velocity + impulse * inv_a);
    }
    if let Some(rb) = obj_b.rigidbody_mut() {
        rb.velocity = damp(rb.velocity - impulse * inv_b);
    }
}

/// Conservative bounding sphere for mesh contact tests
///
/// Boxes use half their smallest world dimension as the radius, so a box
/// corner may clip into a mesh but a contact is never reported for a box
/// that is clear of the surface.
fn bounding_sphere(collider: &Collider, transform: &Transform) -> Option<(Vec3, f32)> {
    match collider {
        Collider::Sphere(sphere) => Some((sphere.world_center(transform), sphere.radius)),
        Collider::Box(_) => {
            let bounds = collider.world_bounds(transform);
            let size = bounds.size();
            Some((bounds.center(), 0.5 * size.x.min(size.y).min(size.z)))
        }
        Collider::Mesh(_) => None,
    }
}

/// A body against a triangle-mesh collider: precise sphere push-out
///
/// The mesh never moves. When `displace` is set the partner is pushed
/// out along the accumulated triangle correction and gets the usual
/// velocity response; otherwise only the contact is reported (kinematic
/// positions belong to whatever drives them).
fn resolve_against_mesh(
    scene: &mut Scene,
    partner_id: GameObjectId,
    mesh_id: GameObjectId,
    displace: bool,
) -> bool {
    let push = {
        let (Some(partner), Some(mesh_object)) = (scene.get(partner_id), scene.get(mesh_id))
        else {
            return false;
        };
        if !partner.active || !mesh_object.active {
            return false;
        }
        let Some(Collider::Mesh(mesh)) = mesh_object.collider() else {
            return false;
        };
        if !mesh.is_built() {
            return false;
        }
        let Some(collider) = partner.collider() else {
            return false;
        };
        let Some(transform) = scene.world_transform(partner_id) else {
            return false;
        };
        let Some((center, radius)) = bounding_sphere(collider, &transform) else {
            return false;
        };
        if radius <= 0.0 {
            return false;
        }
        match mesh.bvh().sphere_intersect(center, radius) {
            Some(push) => push,
            None => return false,
        }
    };

    if !displace {
        return true;
    }

    let Some(object) = scene.get_mut(partner_id) else {
        return false;
    };
    object.transform.position += push;

    let Some(rb) = object.rigidbody_mut() else {
        return true;
    };
    let push_length = push.magnitude();
    if push_length < MIN_PUSH_LENGTH {
        return true;
    }
    let normal = push / push_length;
    let along_normal = rb.velocity.dot(&normal);
    if along_normal < 0.0 {
        rb.velocity -= normal * ((1.0 + rb.bounciness) * along_normal);
        let normal_part = normal * rb.velocity.dot(&normal);
        rb.velocity = normal_part + (rb.velocity - normal_part) * (1.0 - rb.friction);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::physics::compute::ComputeError;
    use crate::scene::components::{BoxCollider, Component, MeshCollider, Rigidbody, SphereCollider};
    use approx::assert_relative_eq;

    fn spawn_box(
        scene: &mut Scene,
        name: &str,
        position: Vec3,
        size: Vec3,
        rigidbody: Option<Rigidbody>,
    ) -> GameObjectId {
        let id = scene.spawn(name);
        let object = scene.get_mut(id).unwrap();
        object.transform = Transform::from_position(position);
        object.attach(Component::Collider(BoxCollider::new(size).into()));
        if let Some(rb) = rigidbody {
            object.attach(Component::Rigidbody(rb));
        }
        id
    }

    fn unit(v: f32) -> Vec3 {
        Vec3::new(v, v, v)
    }

    fn spawn_mesh(
        scene: &mut Scene,
        world: &mut PhysicsWorld,
        vertices: &[Vec3],
        indices: &[u32],
    ) -> GameObjectId {
        let id = scene.spawn("terrain");
        let mut mesh = MeshCollider::new();
        mesh.build_from_geometry(vertices, indices);
        scene.get_mut(id).unwrap().attach(Component::Collider(mesh.into()));
        world.add_object(scene, id);
        id
    }

    /// Flat ground quad at y = 0 spanning x, z in [-20, 20]
    fn ground_quad(scene: &mut Scene, world: &mut PhysicsWorld) -> GameObjectId {
        let vertices = [
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::new(20.0, 0.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            Vec3::new(-20.0, 0.0, 20.0),
        ];
        spawn_mesh(scene, world, &vertices, &[0, 2, 1, 0, 3, 2])
    }

    #[test]
    fn test_gravity_integration_scenario() {
        // Gravity magnitude 20, dt 0.1: velocity changes by exactly -2 in y.
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let id = spawn_box(
            &mut scene,
            "ball",
            Vec3::new(0.0, 100.0, 0.0),
            unit(1.0),
            Some(Rigidbody::default()),
        );
        world.add_object(&scene, id);

        world.update(&mut scene, 0.1);

        let object = scene.get(id).unwrap();
        assert_relative_eq!(object.rigidbody().unwrap().velocity.y, -2.0);
        assert_relative_eq!(object.transform.position.y, 100.0 - 0.2);
    }

    #[test]
    fn test_gravity_disabled_body_floats() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let rb = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        let id = spawn_box(&mut scene, "balloon", unit(0.0), unit(1.0), Some(rb));
        world.add_object(&scene, id);

        world.update(&mut scene, 0.1);
        assert_eq!(scene.get(id).unwrap().rigidbody().unwrap().velocity, Vec3::zeros());
    }

    #[test]
    fn test_dynamic_pushed_out_of_static() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let floor = spawn_box(
            &mut scene,
            "floor",
            Vec3::zeros(),
            Vec3::new(20.0, 1.0, 20.0),
            None,
        );
        let rb = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        // Overlapping the floor's top by 0.2
        let body = spawn_box(
            &mut scene,
            "crate",
            Vec3::new(0.0, 0.8, 0.0),
            unit(1.0),
            Some(rb),
        );
        world.add_object(&scene, floor);
        world.add_object(&scene, body);

        world.update(&mut scene, 1.0 / 60.0);

        assert_relative_eq!(scene.get(body).unwrap().transform.position.y, 1.0, epsilon = 1e-5);
        assert_eq!(scene.get(floor).unwrap().transform.position, Vec3::zeros());
    }

    #[test]
    fn test_dynamic_pair_splits_by_inverse_mass() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let still = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        let light = spawn_box(
            &mut scene,
            "light",
            Vec3::new(0.25, 0.0, 0.0),
            unit(1.0),
            Some(still.with_mass(1.0)),
        );
        let heavy = spawn_box(
            &mut scene,
            "heavy",
            Vec3::zeros(),
            unit(1.0),
            Some(still.with_mass(3.0)),
        );
        world.add_object(&scene, light);
        world.add_object(&scene, heavy);

        world.update(&mut scene, 1.0 / 60.0);

        // Overlap depth 0.75 split 3:1 toward the lighter body
        let light_x = scene.get(light).unwrap().transform.position.x;
        let heavy_x = scene.get(heavy).unwrap().transform.position.x;
        assert_relative_eq!(light_x - 0.25, 0.75 * 0.75, epsilon = 1e-5);
        assert_relative_eq!(heavy_x, -0.75 * 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_kinematic_is_never_displaced_but_shoves() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut kin_rb = Rigidbody::kinematic();
        kin_rb.velocity = Vec3::new(5.0, 0.0, 0.0);
        let kin = spawn_box(&mut scene, "platform", Vec3::zeros(), unit(1.0), Some(kin_rb));
        let dynamic_rb = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        let body = spawn_box(
            &mut scene,
            "crate",
            Vec3::new(0.5, 0.0, 0.0),
            unit(1.0),
            Some(dynamic_rb),
        );
        world.add_object(&scene, kin);
        world.add_object(&scene, body);

        world.update(&mut scene, 1.0 / 60.0);

        // Kinematic stays put (its own velocity is applied by its driver,
        // not by the world); the dynamic body is pushed clear and gains
        // velocity away from the shove.
        assert_eq!(scene.get(kin).unwrap().transform.position, Vec3::zeros());
        assert!(scene.get(body).unwrap().transform.position.x >= 1.0 - 1e-5);
        assert!(scene.get(body).unwrap().rigidbody().unwrap().velocity.x > 0.0);
    }

    #[test]
    fn test_lower_bounciness_wins() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut dead = Rigidbody::kinematic();
        dead.bounciness = 0.0;
        let floor = spawn_box(
            &mut scene,
            "pad",
            Vec3::zeros(),
            Vec3::new(10.0, 1.0, 10.0),
            Some(dead),
        );
        let bouncy = Rigidbody {
            use_gravity: false,
            bounciness: 1.0,
            friction: 0.0,
            velocity: Vec3::new(0.0, -4.0, 0.0),
            ..Rigidbody::default()
        };
        let ball = spawn_box(
            &mut scene,
            "ball",
            Vec3::new(0.0, 0.9, 0.0),
            unit(1.0),
            Some(bouncy),
        );
        world.add_object(&scene, floor);
        world.add_object(&scene, ball);

        world.update(&mut scene, 1.0 / 60.0);

        // min(1.0, 0.0) = 0: the normal component is absorbed, not reflected
        let velocity = scene.get(ball).unwrap().rigidbody().unwrap().velocity;
        assert_relative_eq!(velocity.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_raycast_nearest_hit_and_inactive_skip() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let near = spawn_box(&mut scene, "near", Vec3::new(3.0, 0.0, 0.0), unit(1.0), None);
        let far = spawn_box(&mut scene, "far", Vec3::new(8.0, 0.0, 0.0), unit(1.0), None);
        world.add_object(&scene, near);
        world.add_object(&scene, far);

        let hit = world
            .raycast(&scene, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 100.0)
            .unwrap();
        assert_eq!(hit.object, near);
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-5);

        scene.get_mut(near).unwrap().active = false;
        let hit = world
            .raycast(&scene, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 100.0)
            .unwrap();
        assert_eq!(hit.object, far);

        assert!(world
            .raycast(&scene, Vec3::zeros(), Vec3::zeros(), 100.0)
            .is_none());
    }

    #[test]
    fn test_contact_events_started_and_ended() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let a = spawn_box(&mut scene, "a", Vec3::zeros(), unit(4.0), None);
        let b = spawn_box(&mut scene, "b", Vec3::new(1.0, 0.0, 0.0), unit(4.0), None);
        world.add_object(&scene, a);
        world.add_object(&scene, b);

        world.update(&mut scene, 1.0 / 60.0);
        let events = world.drain_contact_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Started);
        assert_eq!(events[0].pair, ContactPair::new(a, b));

        scene.get_mut(b).unwrap().transform.position = Vec3::new(50.0, 0.0, 0.0);
        world.update(&mut scene, 1.0 / 60.0);
        let events = world.drain_contact_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Ended);
    }

    #[test]
    fn test_removed_object_stops_resolving() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let floor = spawn_box(&mut scene, "floor", Vec3::zeros(), Vec3::new(10.0, 1.0, 10.0), None);
        let rb = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        let body = spawn_box(&mut scene, "crate", Vec3::new(0.0, 0.8, 0.0), unit(1.0), Some(rb));
        world.add_object(&scene, floor);
        world.add_object(&scene, body);
        world.remove_object(body);

        world.update(&mut scene, 1.0 / 60.0);
        // No longer registered: position untouched by resolution
        assert_relative_eq!(scene.get(body).unwrap().transform.position.y, 0.8);
    }

    #[test]
    fn test_update_is_deterministic() {
        let build = || {
            let mut scene = Scene::new();
            let mut world = PhysicsWorld::new();
            let floor = spawn_box(
                &mut scene,
                "floor",
                Vec3::zeros(),
                Vec3::new(40.0, 1.0, 40.0),
                None,
            );
            world.add_object(&scene, floor);
            let mut bodies = Vec::new();
            for i in 0..12 {
                let offset = i as f32;
                let id = spawn_box(
                    &mut scene,
                    "crate",
                    Vec3::new(offset * 0.4 - 2.0, 2.0 + offset * 0.3, 0.0),
                    unit(1.0),
                    Some(Rigidbody::default()),
                );
                world.add_object(&scene, id);
                bodies.push(id);
            }
            (scene, world, bodies)
        };

        let (mut scene_a, mut world_a, bodies_a) = build();
        let (mut scene_b, mut world_b, bodies_b) = build();
        for _ in 0..120 {
            world_a.update(&mut scene_a, 1.0 / 60.0);
            world_b.update(&mut scene_b, 1.0 / 60.0);
        }
        for (&a, &b) in bodies_a.iter().zip(&bodies_b) {
            assert_eq!(
                scene_a.get(a).unwrap().transform.position,
                scene_b.get(b).unwrap().transform.position
            );
        }
    }

    /// Backend returning pairs in reverse order; the world must not care
    struct ReversedBackend;

    impl ComputeBackend for ReversedBackend {
        fn name(&self) -> &str {
            "reversed-test"
        }

        fn overlap_pairs(&mut self, bounds: &[Bounds]) -> Result<Vec<(u32, u32)>, ComputeError> {
            let mut pairs = cpu_overlap_pairs(bounds);
            pairs.reverse();
            for pair in &mut pairs {
                *pair = (pair.1, pair.0);
            }
            Ok(pairs)
        }
    }

    /// Backend that always fails
    struct BrokenBackend;

    impl ComputeBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken-test"
        }

        fn overlap_pairs(&mut self, _bounds: &[Bounds]) -> Result<Vec<(u32, u32)>, ComputeError> {
            Err(ComputeError::DispatchFailed("simulated".to_string()))
        }
    }

    fn stacked_scene() -> (Scene, PhysicsWorld, Vec<GameObjectId>) {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let floor = spawn_box(
            &mut scene,
            "floor",
            Vec3::zeros(),
            Vec3::new(40.0, 1.0, 40.0),
            None,
        );
        world.add_object(&scene, floor);
        let mut ids = Vec::new();
        for i in 0..8 {
            let id = spawn_box(
                &mut scene,
                "crate",
                Vec3::new(i as f32 * 0.3, 1.2 + i as f32 * 0.9, 0.0),
                unit(1.0),
                Some(Rigidbody::default()),
            );
            world.add_object(&scene, id);
            ids.push(id);
        }
        (scene, world, ids)
    }

    #[test]
    fn test_backend_pairs_match_cpu_results() {
        let (mut scene_cpu, mut world_cpu, ids_cpu) = stacked_scene();
        let (mut scene_gpu, mut world_gpu, ids_gpu) = stacked_scene();
        world_gpu.set_compute_backend(Box::new(ReversedBackend));
        assert!(world_gpu.has_compute_backend());

        for _ in 0..90 {
            world_cpu.update(&mut scene_cpu, 1.0 / 60.0);
            world_gpu.update(&mut scene_gpu, 1.0 / 60.0);
        }
        for (&a, &b) in ids_cpu.iter().zip(&ids_gpu) {
            assert_eq!(
                scene_cpu.get(a).unwrap().transform.position,
                scene_gpu.get(b).unwrap().transform.position
            );
        }
    }

    #[test]
    fn test_broken_backend_falls_back_to_cpu() {
        let (mut scene_cpu, mut world_cpu, ids_cpu) = stacked_scene();
        let (mut scene_broken, mut world_broken, ids_broken) = stacked_scene();
        world_broken.set_compute_backend(Box::new(BrokenBackend));

        for _ in 0..90 {
            world_cpu.update(&mut scene_cpu, 1.0 / 60.0);
            world_broken.update(&mut scene_broken, 1.0 / 60.0);
        }
        for (&a, &b) in ids_cpu.iter().zip(&ids_broken) {
            assert_eq!(
                scene_cpu.get(a).unwrap().transform.position,
                scene_broken.get(b).unwrap().transform.position
            );
        }
    }

    #[test]
    fn test_body_settles_on_mesh_surface() {
        // The quad is zero-thickness, so its root bounds never overlap
        // anything; only the triangle pass can catch the fall.
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let terrain = ground_quad(&mut scene, &mut world);

        let ball = scene.spawn("ball");
        {
            let object = scene.get_mut(ball).unwrap();
            object.transform = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
            object.attach(Component::Collider(SphereCollider::new(0.5).into()));
            object.attach(Component::Rigidbody(Rigidbody {
                bounciness: 0.0,
                ..Rigidbody::default()
            }));
        }
        world.add_object(&scene, ball);

        for _ in 0..120 {
            world.update(&mut scene, 1.0 / 60.0);
        }

        let object = scene.get(ball).unwrap();
        assert_relative_eq!(object.transform.position.y, 0.5, epsilon = 1e-3);
        assert_relative_eq!(object.rigidbody().unwrap().velocity.y, 0.0, epsilon = 1e-3);

        let events = world.drain_contact_events();
        assert!(events
            .iter()
            .any(|e| e.pair == ContactPair::new(ball, terrain)));
    }

    #[test]
    fn test_mesh_root_bounds_do_not_eject_hovering_body() {
        // Ramp rising from y = 0 at x = -10 to y = 5 at x = 10; the root
        // bounds fill the whole box even though the surface is a sheet.
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let vertices = [
            Vec3::new(-10.0, 0.0, -5.0),
            Vec3::new(-10.0, 0.0, 5.0),
            Vec3::new(10.0, 5.0, 5.0),
            Vec3::new(10.0, 5.0, -5.0),
        ];
        spawn_mesh(&mut scene, &mut world, &vertices, &[0, 1, 2, 0, 2, 3]);

        // Inside the root bounds but well above the local surface
        let rb = Rigidbody {
            use_gravity: false,
            ..Rigidbody::default()
        };
        let body = spawn_box(&mut scene, "crate", Vec3::new(-8.0, 2.0, 0.0), unit(1.0), Some(rb));
        world.add_object(&scene, body);

        world.update(&mut scene, 1.0 / 60.0);

        let object = scene.get(body).unwrap();
        assert_eq!(object.transform.position, Vec3::new(-8.0, 2.0, 0.0));
        assert_eq!(object.rigidbody().unwrap().velocity, Vec3::zeros());
    }

    #[test]
    fn test_kinematic_touching_mesh_reports_contact_without_displacement() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let terrain = ground_quad(&mut scene, &mut world);

        // Bounding sphere (radius 0.5) dips 0.2 below the surface
        let kin = spawn_box(
            &mut scene,
            "platform",
            Vec3::new(0.0, 0.3, 0.0),
            unit(1.0),
            Some(Rigidbody::kinematic()),
        );
        world.add_object(&scene, kin);

        world.update(&mut scene, 1.0 / 60.0);

        assert_eq!(scene.get(kin).unwrap().transform.position, Vec3::new(0.0, 0.3, 0.0));
        let events = world.drain_contact_events();
        assert!(events
            .iter()
            .any(|e| e.pair == ContactPair::new(kin, terrain) && e.kind == ContactKind::Started));
    }

    #[test]
    fn test_readding_reclassifies() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let id = spawn_box(&mut scene, "wall", Vec3::zeros(), unit(1.0), None);
        world.add_object(&scene, id);
        assert_eq!(world.dynamic_count(), 0);

        scene
            .get_mut(id)
            .unwrap()
            .attach(Component::Rigidbody(Rigidbody::default()));
        world.add_object(&scene, id);
        assert_eq!(world.dynamic_count(), 1);
        assert_eq!(world.get_collidable_objects().len(), 1);
    }
}
