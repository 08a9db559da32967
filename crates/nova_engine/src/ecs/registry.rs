//! Render registry
//!
//! Bidirectional binding between entities and renderer handles, plus a typed
//! side-table for render-only data (pool kind, child decorations) that no
//! component table should own. The registry never owns entities; it is an
//! index the world's destruction path keeps in sync.

use super::Entity;
use std::collections::HashMap;
use std::hash::Hash;

/// A single entity → handle binding with its render-side data
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBinding<H, M> {
    /// Renderer handle bound to the entity
    pub handle: H,
    /// Render-only data attached to the binding
    pub meta: M,
}

/// Entity ↔ render handle table
#[derive(Debug, Clone)]
pub struct RenderRegistry<H, M = ()> {
    by_entity: HashMap<Entity, RenderBinding<H, M>>,
    by_handle: HashMap<H, Entity>,
}

impl<H, M> RenderRegistry<H, M>
where
    H: Copy + Eq + Hash,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_entity: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }

    /// Bind `entity` to `handle`
    ///
    /// Rebinding an entity replaces its previous binding, which is returned so
    /// the caller can release the old handle.
    pub fn bind(&mut self, entity: Entity, handle: H, meta: M) -> Option<RenderBinding<H, M>> {
        let previous = self.unbind(entity);
        if let Some(stale_owner) = self.by_handle.insert(handle, entity) {
            log::warn!("Render handle rebound from {} to {}", stale_owner, entity);
            self.by_entity.remove(&stale_owner);
        }
        self.by_entity.insert(entity, RenderBinding { handle, meta });
        previous
    }

    /// Remove the binding for `entity`; a no-op returning `None` when unbound
    pub fn unbind(&mut self, entity: Entity) -> Option<RenderBinding<H, M>> {
        let binding = self.by_entity.remove(&entity)?;
        self.by_handle.remove(&binding.handle);
        Some(binding)
    }

    /// Handle bound to `entity`
    pub fn get(&self, entity: Entity) -> Option<H> {
        self.by_entity.get(&entity).map(|binding| binding.handle)
    }

    /// Full binding for `entity`
    pub fn binding(&self, entity: Entity) -> Option<&RenderBinding<H, M>> {
        self.by_entity.get(&entity)
    }

    /// Mutable side-table data for `entity`
    pub fn meta_mut(&mut self, entity: Entity) -> Option<&mut M> {
        self.by_entity.get_mut(&entity).map(|binding| &mut binding.meta)
    }

    /// Entity owning `handle`
    pub fn entity_of(&self, handle: H) -> Option<Entity> {
        self.by_handle.get(&handle).copied()
    }

    /// Whether `entity` has a binding
    pub fn is_bound(&self, entity: Entity) -> bool {
        self.by_entity.contains_key(&entity)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    /// Iterate over `(entity, handle)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Entity, H)> + '_ {
        self.by_entity
            .iter()
            .map(|(entity, binding)| (*entity, binding.handle))
    }
}

impl<H, M> Default for RenderRegistry<H, M>
where
    H: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
