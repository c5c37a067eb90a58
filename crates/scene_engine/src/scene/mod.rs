//! Scene graph: the object arena and its components

pub mod components;
pub mod game_object;

pub use components::Component;
pub use game_object::{GameObject, GameObjectId, Scene};
