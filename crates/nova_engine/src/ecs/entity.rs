//! Entity implementation

use std::fmt;

/// Entity identifier
///
/// Carries no data of its own; an entity exists while its owning world says
/// it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: u32,
}

impl Entity {
    /// Create an entity handle from a raw id
    pub const fn from_raw(id: u32) -> Self {
        Self { id }
    }

    /// Get the entity ID
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

/// Monotonic entity id generator
///
/// Ids are never reused, so a stale id can never alias a newer entity.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next_entity_id: u32,
}

impl EntityAllocator {
    /// Create an allocator whose first id is 1 (0 is never handed out)
    pub fn new() -> Self {
        Self { next_entity_id: 1 }
    }

    /// Allocate the next entity id, or `None` once the id space is spent
    pub fn try_allocate(&mut self) -> Option<Entity> {
        let entity = Entity::from_raw(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.checked_add(1)?;
        Some(entity)
    }

    /// Allocate the next entity id
    ///
    /// # Panics
    ///
    /// Panics after `u32::MAX - 1` allocations; ids are never reused, so an
    /// allocator cannot outlive its id space. Use
    /// [`try_allocate`](Self::try_allocate) where that bound is reachable.
    pub fn allocate(&mut self) -> Entity {
        match self.try_allocate() {
            Some(entity) => entity,
            None => panic!("entity id space exhausted"),
        }
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u32 {
        self.next_entity_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
