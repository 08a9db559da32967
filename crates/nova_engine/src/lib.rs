//! # Nova Engine
//!
//! The simulation-side half of a small game engine. Rendering, audio and
//! windowing live behind collaborator traits in the game crate; this crate
//! owns the pieces every simulation needs regardless of how it is drawn.
//!
//! ## Features
//!
//! - **Entities and component tables**: monotonically allocated ids and
//!   hash-map backed per-component storage
//! - **Render registry**: bidirectional entity/handle binding with a typed
//!   side-table for render-only data
//! - **Fixed timestep**: accumulator loop with catch-up cap and frame clamp
//! - **Object pools**: bounded free lists for short-lived instances
//! - **Configuration**: TOML/RON loading for any serde config type
//!
//! ## Quick Start
//!
//! ```rust
//! use nova_engine::prelude::*;
//!
//! let mut ids = EntityAllocator::new();
//! let mut positions: ComponentTable<Vec3> = ComponentTable::new();
//! let entity = ids.allocate();
//! positions.insert(entity, Vec3::new(0.0, 1.0, 0.0));
//!
//! let mut fixed = FixedTimestepLoop::new(60.0, 5);
//! fixed.advance(0.0, |_dt| {});
//! let report = fixed.advance(1.0 / 30.0, |dt| {
//!     if let Some(p) = positions.get_mut(entity) {
//!         p.y += dt;
//!     }
//! });
//! assert_eq!(report.steps, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod pool;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        ecs::{ComponentTable, Entity, EntityAllocator, RenderRegistry},
        foundation::{
            math::{IVec3, Quat, Vec3},
            time::{FixedTimestepLoop, StepReport},
        },
        pool::{ObjectPool, PoolStats, Released},
    };
}
