//! Component Storage
//!
//! One [`ComponentTable`] per component type, keyed by entity. Lookup and
//! mutation are O(1) on average and iteration only ever sees rows that are
//! currently present.

use super::Entity;
use std::collections::hash_map::{self, HashMap};

/// Map from entity to a single component record
#[derive(Debug, Clone)]
pub struct ComponentTable<T> {
    rows: HashMap<Entity, T>,
}

impl<T> ComponentTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self { rows: HashMap::new() }
    }

    /// Insert or replace the row for `entity`, returning the previous record
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.rows.insert(entity, component)
    }

    /// Remove the row for `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.rows.remove(&entity)
    }

    /// Borrow the row for `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.rows.get(&entity)
    }

    /// Mutably borrow the row for `entity`
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.rows.get_mut(&entity)
    }

    /// Whether `entity` has a row in this table
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over `(entity, record)` pairs
    pub fn iter(&self) -> hash_map::Iter<'_, Entity, T> {
        self.rows.iter()
    }

    /// Iterate mutably over `(entity, record)` pairs
    pub fn iter_mut(&mut self) -> hash_map::IterMut<'_, Entity, T> {
        self.rows.iter_mut()
    }

    /// Snapshot of the entities that currently have a row
    ///
    /// Useful when a pass needs to mutate other tables while walking this one.
    pub fn entities(&self) -> Vec<Entity> {
        self.rows.keys().copied().collect()
    }

    /// Drop every row
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<T> Default for ComponentTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a ComponentTable<T> {
    type Item = (&'a Entity, &'a T);
    type IntoIter = hash_map::Iter<'a, Entity, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
