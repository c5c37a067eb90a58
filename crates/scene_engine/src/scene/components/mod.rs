//! Scene components
//!
//! Components are plain serializable values attached to game objects.
//! The closed [`Component`] enum covers every kind the engine ships;
//! persistence maps each kind to a stable string tag through the
//! [`registry::ComponentRegistry`].

pub mod character_controller;
pub mod collider;
pub mod registry;
pub mod rigidbody;

pub use character_controller::CharacterController;
pub use collider::{BoxCollider, Collider, MeshCollider, SphereCollider};
pub use registry::{ComponentRegistry, RegistryError};
pub use rigidbody::Rigidbody;

/// Any component attachable to a game object
#[derive(Debug, Clone)]
pub enum Component {
    /// Collision shape
    Collider(Collider),
    /// Dynamics state
    Rigidbody(Rigidbody),
    /// Kinematic character mover
    CharacterController(CharacterController),
}

impl Component {
    /// Stable string tag identifying the concrete component type
    ///
    /// These tags are the persistence format's type discriminators; they
    /// must never change for existing component kinds.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Collider(Collider::Box(_)) => "BoxCollider",
            Self::Collider(Collider::Sphere(_)) => "SphereCollider",
            Self::Collider(Collider::Mesh(_)) => "MeshCollider",
            Self::Rigidbody(_) => "Rigidbody",
            Self::CharacterController(_) => "CharacterController",
        }
    }
}
