//! Game-specific components
//!
//! Plain data records stored in the [`World`](crate::world::World)'s
//! component tables. Systems own the behaviour; these types only carry state.

use nova_engine::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Kind of destructible world object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Small rocky body
    Asteroid,
    /// Large body; may carry a ring decoration
    Planet,
}

/// Identity of a destructible world object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectMeta {
    /// What the object is
    pub kind: ObjectKind,
    /// Credits worth of loot dropped when destroyed
    pub loot_value: f32,
}

/// Hit points of a destructible object
///
/// `hp` is kept inside `[0, max_hp]`; zero means destruction-eligible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    /// Current hit points
    pub hp: f32,
    /// Maximum hit points
    pub max_hp: f32,
}

impl Health {
    /// Full health
    pub fn full(max_hp: f32) -> Self {
        let max_hp = max_hp.max(0.0);
        Self { hp: max_hp, max_hp }
    }

    /// Whether the object has run out of hit points
    pub fn is_depleted(&self) -> bool {
        self.hp <= 0.0
    }

    /// Remaining fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            self.hp / self.max_hp
        } else {
            0.0
        }
    }
}

/// Everything needed to create a destructible object's identity rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSpec {
    /// Object kind
    pub kind: ObjectKind,
    /// Loot value dropped on destruction
    pub loot_value: f32,
    /// Starting and maximum hit points
    pub max_hp: f32,
}

/// Kind of collectible pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootKind {
    /// Mined resource carved out of a voxel body
    Gem,
    /// Salvage dropped by a destroyed object
    Coin,
}

/// Identity of a collectible pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loot {
    /// Pickup kind
    pub kind: LootKind,
    /// Credits awarded on collection
    pub value: f32,
}

/// World-space pose of a simulated body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Euler rotation in radians (XYZ)
    pub rotation: Vec3,
    /// Non-uniform scale; destructible objects keep it uniform
    pub scale: Vec3,
}

impl Transform {
    /// Transform at `position` with no rotation and unit scale
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder-style uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::repeat(scale);
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
        }
    }
}

/// Per-loot animation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LootMotion {
    /// Spin rate per tick around each axis
    pub rotation_speed: Vec3,
    /// Phase offset of the float sinusoid
    pub drift_offset: f32,
    /// Anchor height of the float sinusoid
    pub float_base_y: f32,
    /// Scale the pickup was spawned with
    pub base_scale: f32,
}
