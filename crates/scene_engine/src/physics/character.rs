//! Kinematic character movement
//!
//! The character is an axis-aligned box moved through the collidable set
//! with push-out resolution, split into a horizontal and a vertical
//! sub-move so sliding along walls keeps its full horizontal budget.
//! Horizontal hits on low ledges are converted into step climbs.
//! Triangle-mesh terrain is resolved separately, by pushing the
//! character's bounding sphere out of the mesh BVH.

use crate::foundation::math::Vec3;
use crate::physics::bounds::Bounds;
use crate::physics::world::PhysicsWorld;
use crate::scene::components::{CharacterController, Collider};
use crate::scene::{GameObjectId, Scene};

/// Extra lift above a climbed step so the landing never re-collides
const STEP_CLEARANCE: f32 = 0.01;

/// How far below the feet an obstacle top still counts as ground
const GROUND_TOLERANCE: f32 = 0.05;

/// Downward velocity held while grounded so the probe keeps contact
const GROUND_STICK_VELOCITY: f32 = -0.1;

impl PhysicsWorld {
    /// Move a character by `motion`, resolving collisions and steps
    ///
    /// Returns the displacement actually achieved. The object needs a
    /// [`CharacterController`] component; without one this is a no-op.
    /// Obstacles are the world's collidable objects minus the character
    /// itself, inactive objects, and kinematic bodies (two characters
    /// pass through each other).
    pub fn move_character(&self, scene: &mut Scene, id: GameObjectId, motion: Vec3) -> Vec3 {
        let Some(object) = scene.get(id) else {
            return Vec3::zeros();
        };
        let Some(mut character) = object.character().copied() else {
            return Vec3::zeros();
        };
        let original = object.transform.position;
        let mut position = original;

        let (obstacles, meshes) = self.collect_obstacles(scene, id);
        if obstacles.is_empty() && meshes.is_empty() {
            position += motion;
        } else {
            let horizontal = Vec3::new(motion.x, 0.0, motion.z);
            if horizontal != Vec3::zeros() {
                sub_move(&mut position, &mut character, horizontal, &obstacles);
            }
            if motion.y != 0.0 {
                sub_move(
                    &mut position,
                    &mut character,
                    Vec3::new(0.0, motion.y, 0.0),
                    &obstacles,
                );
            }
            resolve_mesh_contacts(scene, &meshes, &mut position, &mut character);
            ground_probe(&mut position, &mut character, motion.y, &obstacles);
        }

        if let Some(object) = scene.get_mut(id) {
            object.transform.position = position;
            if let Some(live) = object.character_mut() {
                live.grounded = character.grounded;
                live.vertical_velocity = character.vertical_velocity;
            }
        }
        position - original
    }

    /// Move a character from an input speed, applying gravity
    ///
    /// Gravity only accumulates while airborne or during the rising part
    /// of a jump; a grounded character instead holds a small downward
    /// velocity so the ground probe stays in contact on ramps and steps.
    /// A kinematic rigidbody on the same object mirrors the commanded
    /// velocity so the physics step can shove dynamic bodies out of the
    /// character's way.
    pub fn simple_move_character(
        &self,
        scene: &mut Scene,
        id: GameObjectId,
        speed: Vec3,
        dt: f32,
    ) -> Vec3 {
        let Some(object) = scene.get(id) else {
            return Vec3::zeros();
        };
        let Some(character) = object.character().copied() else {
            return Vec3::zeros();
        };

        let mut vertical = character.vertical_velocity;
        if character.use_gravity {
            if !character.grounded || vertical > 0.0 {
                vertical -= character.gravity * dt;
            } else {
                vertical = GROUND_STICK_VELOCITY;
            }
        }

        if let Some(object) = scene.get_mut(id) {
            if let Some(live) = object.character_mut() {
                live.vertical_velocity = vertical;
                // Landing this step will set it back
                live.grounded = false;
            }
        }

        let motion = Vec3::new(speed.x * dt, vertical * dt, speed.z * dt);
        let actual = self.move_character(scene, id, motion);

        if let Some(object) = scene.get_mut(id) {
            let vertical = object
                .character()
                .map_or(0.0, |character| character.vertical_velocity);
            if let Some(rb) = object.rigidbody_mut() {
                if rb.is_kinematic {
                    rb.velocity = Vec3::new(speed.x, vertical, speed.z);
                }
            }
        }
        actual
    }

    /// Everything the character can collide with: box/sphere obstacles as
    /// world-space bounds, mesh colliders as handles for triangle tests
    ///
    /// A mesh's root bounds say nothing about where its surface is, so
    /// meshes never enter the push-out list.
    fn collect_obstacles(
        &self,
        scene: &Scene,
        mover: GameObjectId,
    ) -> (Vec<Bounds>, Vec<GameObjectId>) {
        let mut obstacles = Vec::new();
        let mut meshes = Vec::new();
        for &id in self.get_collidable_objects() {
            if id == mover {
                continue;
            }
            let Some(object) = scene.get(id) else {
                continue;
            };
            if !object.active {
                continue;
            }
            if object.rigidbody().is_some_and(|rb| rb.is_kinematic) {
                continue;
            }
            let Some(collider) = object.collider() else {
                continue;
            };
            if let Collider::Mesh(mesh) = collider {
                if mesh.is_built() {
                    meshes.push(id);
                }
                continue;
            }
            let Some(transform) = scene.world_transform(id) else {
                continue;
            };
            obstacles.push(collider.world_bounds(&transform));
        }
        (obstacles, meshes)
    }
}

fn character_bounds(position: Vec3, character: &CharacterController) -> Bounds {
    Bounds::from_center_size(
        position,
        Vec3::new(2.0 * character.radius, character.height, 2.0 * character.radius),
    )
}

/// One axis-group move with push-out and step climbing
fn sub_move(
    position: &mut Vec3,
    character: &mut CharacterController,
    motion: Vec3,
    obstacles: &[Bounds],
) {
    *position += motion;
    let half_height = character.height * 0.5;
    let mut bounds = character_bounds(*position, character);

    for obstacle in obstacles {
        if !bounds.overlaps(obstacle) {
            continue;
        }
        let push = bounds.resolve(obstacle);
        let horizontal_hit = (push.x != 0.0 || push.z != 0.0) && push.y == 0.0;

        if horizontal_hit && motion.y == 0.0 {
            let feet = position.y - half_height;
            let rise = obstacle.max.y - feet;
            if rise > 0.0 && rise <= character.step_height {
                let raised = Vec3::new(position.x, position.y + rise + STEP_CLEARANCE, position.z);
                if !character_bounds(raised, character).overlaps(obstacle) {
                    *position = raised;
                    character.grounded = true;
                    bounds = character_bounds(*position, character);
                    continue;
                }
            }
        }

        *position += push;
        bounds = character_bounds(*position, character);
        if push.y > 0.0 {
            character.grounded = true;
            character.vertical_velocity = 0.0;
        }
    }
}

/// Push the character's bounding sphere out of any built mesh collider
///
/// The sphere sits at the character's center with the capsule radius, the
/// same approximation the physics step uses for bodies on terrain. An
/// upward push counts as landing.
fn resolve_mesh_contacts(
    scene: &Scene,
    meshes: &[GameObjectId],
    position: &mut Vec3,
    character: &mut CharacterController,
) {
    for &id in meshes {
        let Some(object) = scene.get(id) else {
            continue;
        };
        let Some(Collider::Mesh(mesh)) = object.collider() else {
            continue;
        };
        if let Some(push) = mesh.bvh().sphere_intersect(*position, character.radius) {
            *position += push;
            if push.y > 0.0 {
                character.grounded = true;
                if character.vertical_velocity < 0.0 {
                    character.vertical_velocity = 0.0;
                }
            }
        }
    }
}

/// Snap the feet onto the highest obstacle top within tolerance
///
/// Only runs when the character is not moving upward, so jumps clear the
/// ground before the probe can grab them back.
fn ground_probe(
    position: &mut Vec3,
    character: &mut CharacterController,
    vertical_motion: f32,
    obstacles: &[Bounds],
) {
    if vertical_motion > 0.0 {
        return;
    }
    let half_height = character.height * 0.5;
    let feet = position.y - half_height;

    let mut best_top: Option<f32> = None;
    for obstacle in obstacles {
        let clear_x = position.x + character.radius <= obstacle.min.x
            || position.x - character.radius >= obstacle.max.x;
        let clear_z = position.z + character.radius <= obstacle.min.z
            || position.z - character.radius >= obstacle.max.z;
        if clear_x || clear_z {
            continue;
        }

        let top = obstacle.max.y;
        if (feet - top).abs() <= GROUND_TOLERANCE && best_top.map_or(true, |best| top > best) {
            best_top = Some(top);
        }
    }

    if let Some(top) = best_top {
        position.y = top + half_height;
        character.grounded = true;
        if character.vertical_velocity < 0.0 {
            character.vertical_velocity = 0.0;
        }
    }
}
