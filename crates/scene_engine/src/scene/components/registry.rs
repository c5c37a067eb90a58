//! Component type registry
//!
//! Maps stable string tags to component factories for persistence. The
//! registry is an explicit context value built once at startup and passed
//! to whatever loads or saves scenes; there is no global registration
//! and no runtime type reflection. Component payloads travel as RON
//! strings so the scene file format stays independent of this crate.

use std::collections::HashMap;

use crate::scene::components::{
    BoxCollider, CharacterController, Component, MeshCollider, Rigidbody, SphereCollider,
};

/// Errors from registry (de)serialization
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// No factory registered for the tag
    #[error("unknown component type: {0}")]
    UnknownType(String),

    /// Payload failed to parse for a known tag
    #[error("failed to decode {tag} component: {message}")]
    Decode {
        /// The component tag being decoded
        tag: String,
        /// Parser diagnostic
        message: String,
    },

    /// Component failed to serialize
    #[error("failed to encode {tag} component: {message}")]
    Encode {
        /// The component tag being encoded
        tag: String,
        /// Serializer diagnostic
        message: String,
    },
}

/// A factory turning a RON payload into a component
pub type ComponentFactory = fn(&str) -> Result<Component, RegistryError>;

/// Tag-to-factory map for component persistence
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// An empty registry with no known types
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every builtin component type registered
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("BoxCollider", |data| {
            decode::<BoxCollider>("BoxCollider", data)
                .map(|c| Component::Collider(c.into()))
        });
        registry.register("SphereCollider", |data| {
            decode::<SphereCollider>("SphereCollider", data)
                .map(|c| Component::Collider(c.into()))
        });
        registry.register("MeshCollider", |data| {
            decode::<MeshCollider>("MeshCollider", data)
                .map(|c| Component::Collider(c.into()))
        });
        registry.register("Rigidbody", |data| {
            decode::<Rigidbody>("Rigidbody", data).map(Component::Rigidbody)
        });
        registry.register("CharacterController", |data| {
            decode::<CharacterController>("CharacterController", data)
                .map(Component::CharacterController)
        });
        registry
    }

    /// Register a factory under a tag, replacing any previous one
    pub fn register(&mut self, tag: &str, factory: ComponentFactory) {
        self.factories.insert(tag.to_string(), factory);
    }

    /// Whether a tag is known
    #[must_use]
    pub fn knows(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Build a component from its tag and RON payload
    pub fn deserialize(&self, tag: &str, data: &str) -> Result<Component, RegistryError> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| RegistryError::UnknownType(tag.to_string()))?;
        factory(data)
    }

    /// Serialize a component to its `(tag, RON payload)` pair
    ///
    /// Mesh colliders serialize as an empty shell: geometry is rebuilt
    /// from the source model on load, never persisted here.
    pub fn serialize(component: &Component) -> Result<(&'static str, String), RegistryError> {
        let tag = component.type_tag();
        let payload = match component {
            Component::Collider(crate::scene::components::Collider::Box(c)) => encode(tag, c),
            Component::Collider(crate::scene::components::Collider::Sphere(c)) => encode(tag, c),
            Component::Collider(crate::scene::components::Collider::Mesh(c)) => encode(tag, c),
            Component::Rigidbody(c) => encode(tag, c),
            Component::CharacterController(c) => encode(tag, c),
        }?;
        Ok((tag, payload))
    }
}

fn decode<T: serde::de::DeserializeOwned>(tag: &str, data: &str) -> Result<T, RegistryError> {
    ron::from_str(data).map_err(|e| RegistryError::Decode {
        tag: tag.to_string(),
        message: e.to_string(),
    })
}

fn encode<T: serde::Serialize>(tag: &str, value: &T) -> Result<String, RegistryError> {
    ron::to_string(value).map_err(|e| RegistryError::Encode {
        tag: tag.to_string(),
        message: e.to_string(),
    })
}
