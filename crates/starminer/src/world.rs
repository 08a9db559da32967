//! Simulation world
//!
//! A component-table entity store. The world is constructed by the game and
//! passed explicitly into every system; it is never global, so independent
//! simulations (tests, replays) can coexist.

use crate::components::{Health, Loot, LootMotion, ObjectMeta, ObjectSpec, Transform};
use nova_engine::ecs::{ComponentTable, Entity, EntityAllocator};
use nova_engine::foundation::math::{Quat, Vec3};
use std::collections::HashSet;

/// Entity store with one table per component type
#[derive(Debug, Default)]
pub struct World {
    allocator: EntityAllocator,
    entities: HashSet<Entity>,

    /// Destructible object identity
    pub object_meta: ComponentTable<ObjectMeta>,
    /// Hit points; present exactly when `object_meta` is
    pub health: ComponentTable<Health>,
    /// Collectible identity
    pub loot: ComponentTable<Loot>,
    /// Authoritative pose
    pub transform: ComponentTable<Transform>,
    /// Per-tick displacement
    pub velocity: ComponentTable<Vec3>,
    /// Authoritative orientation for bodies that compose rotations
    pub rotation: ComponentTable<Quat>,
    /// Loot animation parameters
    pub loot_motion: ComponentTable<LootMotion>,
    /// Constant angular velocity per tick
    pub spin: ComponentTable<Vec3>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a bare entity
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity);
        entity
    }

    /// Create a destructible object with its identity and health rows
    pub fn create_object(&mut self, spec: ObjectSpec) -> Entity {
        let entity = self.create_entity();
        self.object_meta.insert(
            entity,
            ObjectMeta {
                kind: spec.kind,
                loot_value: spec.loot_value,
            },
        );
        self.health.insert(entity, Health::full(spec.max_hp));
        entity
    }

    /// Create a collectible with its identity row
    pub fn create_loot(&mut self, loot: Loot) -> Entity {
        let entity = self.create_entity();
        self.loot.insert(entity, loot);
        entity
    }

    /// Remove an entity and every component row it owns
    ///
    /// Removing an entity that does not exist is a no-op. Returns whether the
    /// entity was live.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        let was_live = self.entities.remove(&entity);
        self.object_meta.remove(entity);
        self.health.remove(entity);
        self.loot.remove(entity);
        self.transform.remove(entity);
        self.velocity.remove(entity);
        self.rotation.remove(entity);
        self.loot_motion.remove(entity);
        self.spin.remove(entity);
        was_live
    }

    /// Whether `entity` is live
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world has no live entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Snapshot of destructible object entities in creation order
    pub fn objects(&self) -> Vec<Entity> {
        let mut objects = self.object_meta.entities();
        objects.sort_unstable();
        objects
    }

    /// Snapshot of loot entities in creation order
    pub fn loot_entities(&self) -> Vec<Entity> {
        let mut loot = self.loot.entities();
        loot.sort_unstable();
        loot
    }

    /// Current health of `entity`
    pub fn health(&self, entity: Entity) -> Option<Health> {
        self.health.get(entity).copied()
    }

    /// Subtract `amount` hit points, clamped to `[0, max_hp]`
    ///
    /// Returns the updated record, or `None` if the entity has no health row.
    pub fn damage(&mut self, entity: Entity, amount: f32) -> Option<Health> {
        let health = self.health.get_mut(entity)?;
        let amount = if amount.is_finite() { amount } else { health.max_hp.copysign(amount) };
        health.hp = (health.hp - amount).clamp(0.0, health.max_hp);
        Some(*health)
    }

    /// World-space position of `entity`
    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.transform.get(entity).map(|t| t.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LootKind, ObjectKind};

    fn asteroid(max_hp: f32) -> ObjectSpec {
        ObjectSpec {
            kind: ObjectKind::Asteroid,
            loot_value: 5.0,
            max_hp,
        }
    }

    fn populate_everything(world: &mut World, entity: Entity) {
        world.transform.insert(entity, Transform::default());
        world.velocity.insert(entity, Vec3::x());
        world.rotation.insert(entity, Quat::identity());
        world.spin.insert(entity, Vec3::y());
        world.loot_motion.insert(
            entity,
            LootMotion {
                rotation_speed: Vec3::zeros(),
                drift_offset: 0.0,
                float_base_y: 0.0,
                base_scale: 1.0,
            },
        );
    }

    fn present_anywhere(world: &World, entity: Entity) -> bool {
        world.contains(entity)
            || world.object_meta.contains(entity)
            || world.health.contains(entity)
            || world.loot.contains(entity)
            || world.transform.contains(entity)
            || world.velocity.contains(entity)
            || world.rotation.contains(entity)
            || world.loot_motion.contains(entity)
            || world.spin.contains(entity)
            || world.transform.iter().any(|(e, _)| *e == entity)
    }

    #[test]
    fn test_create_object_seeds_meta_and_health() {
        let mut world = World::new();
        let e = world.create_object(asteroid(30.0));
        assert_eq!(world.object_meta.get(e).map(|m| m.kind), Some(ObjectKind::Asteroid));
        assert_eq!(world.health(e), Some(Health { hp: 30.0, max_hp: 30.0 }));
        assert!(world.loot.get(e).is_none());
    }

    #[test]
    fn test_remove_purges_every_table() {
        let mut world = World::new();
        let object = world.create_object(asteroid(10.0));
        let loot = world.create_loot(Loot {
            kind: LootKind::Gem,
            value: 3.0,
        });
        let bare = world.create_entity();
        for entity in [object, loot, bare] {
            populate_everything(&mut world, entity);
        }

        for entity in [object, loot, bare] {
            assert!(world.remove_entity(entity));
            assert!(!present_anywhere(&world, entity));
        }
        assert!(world.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut world = World::new();
        let keep = world.create_object(asteroid(10.0));
        let gone = world.create_object(asteroid(10.0));
        populate_everything(&mut world, keep);
        populate_everything(&mut world, gone);

        assert!(world.remove_entity(gone));
        let after_once = (world.len(), world.transform.len(), world.health.len());
        assert!(!world.remove_entity(gone));
        assert_eq!((world.len(), world.transform.len(), world.health.len()), after_once);
        assert!(world.contains(keep));
    }

    #[test]
    fn test_damage_clamps_to_valid_range() {
        let mut world = World::new();
        let e = world.create_object(asteroid(10.0));
        let sequence = [3.0, -50.0, 7.5, 1e9, -1e9, f32::INFINITY, f32::NEG_INFINITY, 0.0];
        for amount in sequence {
            let health = world.damage(e, amount).unwrap();
            assert!((0.0..=health.max_hp).contains(&health.hp), "hp {} after {}", health.hp, amount);
        }
        assert_eq!(world.damage(e, 1e9).unwrap().hp, 0.0);
        assert_eq!(world.damage(e, -1e9).unwrap().hp, 10.0);
    }

    #[test]
    fn test_damage_without_health_row() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.damage(e, 5.0).is_none());
        assert!(world.health(e).is_none());
    }
}
