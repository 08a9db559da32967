//! Entity-Component storage primitives
//!
//! Entities are bare ids; component data lives in independent
//! [`ComponentTable`]s owned by the game's world type, so an entity may carry
//! any subset of components. [`RenderRegistry`] is a derived index binding
//! entities to renderer handles.

pub mod entity;
pub mod registry;
pub mod storage;

pub use entity::{Entity, EntityAllocator};
pub use registry::RenderRegistry;
pub use storage::ComponentTable;
