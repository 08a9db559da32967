//! Gameplay systems
//!
//! Each system owns its private state and mutates the shared simulation
//! state handed to it through a [`TickContext`]. The game runs them in a
//! fixed order every tick:
//!
//! Movement → Environment → Camera → Combat → VoxelDestruction →
//! Navigation hook → Vfx → Loot

pub mod camera;
pub mod combat;
pub mod environment;
pub mod loot;
pub mod movement;
pub mod spawn;
pub mod vfx;
pub mod voxel_destruction;

pub use camera::{Camera, CameraSystem, ScreenPoint};
pub use combat::{CombatSystem, FireOutcome, LockState, Projectile};
pub use environment::EnvironmentSystem;
pub use loot::LootSystem;
pub use movement::{MovementReport, MovementSystem};
pub use spawn::{ObjectBlueprint, SpawnSystem};
pub use vfx::{ParticleKey, VfxSystem};
pub use voxel_destruction::{VoxelDestructionSystem, VoxelHit};

use crate::render::Registry;
use crate::state::ShipStats;
use crate::world::World;

/// Shared mutable state borrowed by the systems for one tick
///
/// The world is never global; the game builds a context from its own fields
/// and threads it through each system call.
pub struct TickContext<'a, R, E, V> {
    /// Entity store
    pub world: &'a mut World,
    /// Entity ↔ renderable index
    pub registry: &'a mut Registry,
    /// Render collaborator
    pub renderer: &'a mut R,
    /// Notification collaborator
    pub events: &'a mut E,
    /// Voxel-geometry collaborator
    pub voxels: &'a mut V,
    /// Player resources
    pub stats: &'a mut ShipStats,
}
