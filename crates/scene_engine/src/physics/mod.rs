//! Physics simulation
//!
//! AABB collision with single-pass minimum-translation resolution,
//! precise raycasts through collider shapes and a triangle-mesh BVH, and
//! a kinematic character mover layered on top of the same collidable set.

pub mod bounds;
pub mod bvh;
pub mod character;
pub mod compute;
pub mod raycast;
pub mod world;

pub use bounds::Bounds;
pub use bvh::{MeshBvh, Triangle};
pub use compute::{cpu_overlap_pairs, ComputeBackend, ComputeError};
pub use raycast::{Ray, RaycastHit};
pub use world::{ContactEvent, ContactKind, ContactPair, PhysicsWorld};
