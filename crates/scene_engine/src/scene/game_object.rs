//! Scene arena and game objects
//!
//! Objects live in a slotmap arena and are addressed by stable
//! `GameObjectId` handles. Hierarchy is expressed through handles in both
//! directions (parent and children), never through owning pointers, so
//! removing an object can't leave a dangling reference: stale handles
//! simply stop resolving.

use slotmap::SlotMap;

use crate::foundation::math::Transform;
use crate::scene::components::{CharacterController, Collider, Component, Rigidbody};

slotmap::new_key_type! {
    /// Stable handle to a [`GameObject`] in a [`Scene`]
    pub struct GameObjectId;
}

/// A named object in the scene with a transform and optional components
#[derive(Debug, Clone)]
pub struct GameObject {
    /// Display name, mainly for logs and editor listings
    pub name: String,
    /// Local transform relative to the parent (world transform when unparented)
    pub transform: Transform,
    /// Inactive objects are skipped by physics queries and the update step
    pub active: bool,

    parent: Option<GameObjectId>,
    children: Vec<GameObjectId>,

    collider: Option<Collider>,
    rigidbody: Option<Rigidbody>,
    character: Option<CharacterController>,
}

impl GameObject {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::identity(),
            active: true,
            parent: None,
            children: Vec::new(),
            collider: None,
            rigidbody: None,
            character: None,
        }
    }

    /// Parent handle, if any
    #[must_use]
    pub fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    /// Child handles in attach order
    #[must_use]
    pub fn children(&self) -> &[GameObjectId] {
        &self.children
    }

    /// Attach a component, replacing any existing one of the same kind
    pub fn attach(&mut self, component: Component) {
        match component {
            Component::Collider(collider) => self.collider = Some(collider),
            Component::Rigidbody(rigidbody) => self.rigidbody = Some(rigidbody),
            Component::CharacterController(character) => self.character = Some(character),
        }
    }

    /// The collider component, if attached
    #[must_use]
    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    /// Mutable access to the collider component
    pub fn collider_mut(&mut self) -> Option<&mut Collider> {
        self.collider.as_mut()
    }

    /// The rigidbody component, if attached
    #[must_use]
    pub fn rigidbody(&self) -> Option<&Rigidbody> {
        self.rigidbody.as_ref()
    }

    /// Mutable access to the rigidbody component
    pub fn rigidbody_mut(&mut self) -> Option<&mut Rigidbody> {
        self.rigidbody.as_mut()
    }

    /// The character controller component, if attached
    #[must_use]
    pub fn character(&self) -> Option<&CharacterController> {
        self.character.as_ref()
    }

    /// Mutable access to the character controller component
    pub fn character_mut(&mut self) -> Option<&mut CharacterController> {
        self.character.as_mut()
    }
}

/// Arena of game objects
///
/// The scene owns all objects; every other system (physics, rendering,
/// persistence) refers to them through [`GameObjectId`] handles and reads
/// or writes plain component values.
#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<GameObjectId, GameObject>,
}

impl Scene {
    /// Creates an empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a new root-level object and return its handle
    pub fn spawn(&mut self, name: &str) -> GameObjectId {
        self.objects.insert(GameObject::new(name))
    }

    /// Remove an object, unlinking it from the hierarchy
    ///
    /// Children are reparented to the scene root (their local transforms
    /// are left untouched). Returns the removed object, or `None` for a
    /// stale handle.
    pub fn remove(&mut self, id: GameObjectId) -> Option<GameObject> {
        let removed = self.objects.remove(id)?;
        if let Some(parent) = removed.parent {
            if let Some(parent_obj) = self.objects.get_mut(parent) {
                parent_obj.children.retain(|&child| child != id);
            }
        }
        for &child in &removed.children {
            if let Some(child_obj) = self.objects.get_mut(child) {
                child_obj.parent = None;
            }
        }
        Some(removed)
    }

    /// Look up an object by handle
    #[must_use]
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutable lookup by handle
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Mutable access to several distinct objects at once
    pub fn get_disjoint_mut<const N: usize>(
        &mut self,
        ids: [GameObjectId; N],
    ) -> Option<[&mut GameObject; N]> {
        self.objects.get_disjoint_mut(ids)
    }

    /// Whether the handle still resolves
    #[must_use]
    pub fn contains(&self, id: GameObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the scene holds no objects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects with their handles
    pub fn iter(&self) -> impl Iterator<Item = (GameObjectId, &GameObject)> {
        self.objects.iter()
    }

    /// Reparent `child` under `parent`, or detach it with `None`
    ///
    /// Rejects stale handles, self-parenting, and cycles (parenting an
    /// object under one of its own descendants) by leaving the hierarchy
    /// unchanged and returning `false`.
    pub fn set_parent(&mut self, child: GameObjectId, parent: Option<GameObjectId>) -> bool {
        if !self.objects.contains_key(child) {
            return false;
        }
        if let Some(parent) = parent {
            if parent == child || !self.objects.contains_key(parent) {
                return false;
            }
            // Walk up from the new parent; finding `child` means a cycle
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return false;
                }
                cursor = self.objects[current].parent;
            }
        }

        if let Some(old_parent) = self.objects[child].parent {
            if let Some(old) = self.objects.get_mut(old_parent) {
                old.children.retain(|&c| c != child);
            }
        }
        self.objects[child].parent = parent;
        if let Some(parent) = parent {
            self.objects[parent].children.push(child);
        }
        true
    }

    /// World-space transform of an object, composed through its parents
    #[must_use]
    pub fn world_transform(&self, id: GameObjectId) -> Option<Transform> {
        let object = self.objects.get(id)?;
        let mut chain = vec![&object.transform];
        let mut cursor = object.parent;
        while let Some(current) = cursor {
            let parent = self.objects.get(current)?;
            chain.push(&parent.transform);
            cursor = parent.parent;
        }
        let mut result = Transform::identity();
        for transform in chain.into_iter().rev() {
            result = result.combine(transform);
        }
        Some(result)
    }
}
