//! Character controller component
//!
//! Plain state for a kinematic character mover. The movement algorithm
//! itself lives in [`crate::physics::PhysicsWorld::move_character`]; this
//! component only carries configuration and runtime state, so it stays
//! trivially serializable.

use serde::{Deserialize, Serialize};

/// Kinematic character mover configuration and state
///
/// The character is approximated by an axis-aligned box of `2 * radius`
/// width and `height` tall, centered on the owning object's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterController {
    /// Total height of the character volume
    pub height: f32,
    /// Half-width of the character volume
    pub radius: f32,
    /// Tallest ledge the character steps onto without jumping
    pub step_height: f32,
    /// Downward acceleration applied by `simple_move` (positive = down)
    pub gravity: f32,
    /// Whether `simple_move` applies gravity at all
    pub use_gravity: bool,

    /// Whether the character currently stands on something (runtime state)
    #[serde(skip)]
    pub grounded: bool,
    /// Vertical velocity in units per second (runtime state)
    #[serde(skip)]
    pub vertical_velocity: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            height: 1.8,
            radius: 0.4,
            step_height: 0.4,
            gravity: 20.0,
            use_gravity: true,
            grounded: false,
            vertical_velocity: 0.0,
        }
    }
}

impl CharacterController {
    /// A controller with default human-scale dimensions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch the character upward; `simple_move` gravity takes over
    pub fn jump(&mut self, speed: f32) {
        self.vertical_velocity = speed;
        self.grounded = false;
    }
}
