//! # Scene Engine
//!
//! Core runtime for a real-time 3D scene engine with an embedded editor.
//!
//! This crate carries the simulation side of the engine: a scene arena of
//! game objects, collider components, a triangle-mesh BVH for precise
//! raycasts, rigidbody integration, and a kinematic character controller.
//! Rendering, windowing, input, and scene persistence live in collaborator
//! crates that only read and write plain component values through the
//! types exposed here.
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::foundation::math::Vec3;
//! use scene_engine::scene::{Scene, Component};
//! use scene_engine::scene::components::{BoxCollider, Rigidbody};
//! use scene_engine::physics::PhysicsWorld;
//!
//! let mut scene = Scene::new();
//! let mut world = PhysicsWorld::new();
//!
//! let floor = scene.spawn("floor");
//! scene.get_mut(floor).unwrap().attach(Component::Collider(
//!     BoxCollider::new(Vec3::new(20.0, 1.0, 20.0)).into(),
//! ));
//! world.add_object(&scene, floor);
//!
//! let crate_obj = scene.spawn("crate");
//! {
//!     let obj = scene.get_mut(crate_obj).unwrap();
//!     obj.transform.position = Vec3::new(0.0, 5.0, 0.0);
//!     obj.attach(Component::Collider(BoxCollider::new(Vec3::new(1.0, 1.0, 1.0)).into()));
//!     obj.attach(Component::Rigidbody(Rigidbody::default()));
//! }
//! world.add_object(&scene, crate_obj);
//!
//! for _ in 0..60 {
//!     world.update(&mut scene, 1.0 / 60.0);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;

// Convenience re-exports for the common types collaborators touch.
pub use physics::{Bounds, PhysicsWorld, Ray, RaycastHit};
pub use scene::{Component, GameObject, GameObjectId, Scene};
