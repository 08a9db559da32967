//! # Starminer
//!
//! Simulation core of a space mining and combat game built on
//! [`nova_engine`]. The host application supplies the collaborators:
//!
//! - a [`RenderBackend`](render::RenderBackend) that receives poses and
//!   presentation flags
//! - a [`GameEvents`](hooks::GameEvents) listener for audio, HUD and
//!   navigation
//! - a [`VoxelGeometry`](voxel::VoxelGeometry) owner for destructible shapes
//! - a [`KeyState`](input::KeyState) snapshot per frame
//!
//! and calls [`Game::frame`](game::Game::frame) once per rendered frame.
//!
//! ## Quick Start
//!
//! ```rust
//! use starminer::prelude::*;
//!
//! let mut game = Game::new(
//!     GameConfig::default(),
//!     HeadlessRenderer::new(),
//!     EventLog::new(),
//!     VoxelStore::new(),
//! )
//! .expect("default config is valid");
//! game.seed_field();
//!
//! let keys = KeyState::with_held(["w"]);
//! game.frame(0.0, &keys);
//! let report = game.frame(0.06, &keys);
//! assert_eq!(report.steps, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod game;
pub mod hooks;
pub mod input;
pub mod render;
pub mod state;
pub mod systems;
pub mod voxel;
pub mod world;

#[cfg(test)]
mod tests;

pub use game::{Game, GameError, GameResult};

/// Common imports for hosts
pub mod prelude {
    pub use crate::{
        components::{Loot, LootKind, ObjectKind, ObjectSpec, Transform},
        config::{GameConfig, OccluderPolicy, ShipLoadout},
        game::{Game, GameError},
        hooks::{EventLog, GameEvent, GameEvents, NullEvents},
        input::KeyState,
        render::{HeadlessRenderer, RenderBackend},
        state::ShipStats,
        systems::{FireOutcome, LockState, ObjectBlueprint},
        voxel::{VoxelGeometry, VoxelGrid, VoxelStore},
        world::World,
    };
    pub use nova_engine::prelude::*;
}
