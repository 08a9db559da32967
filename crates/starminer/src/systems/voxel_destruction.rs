//! Voxel carving
//!
//! Converts a projectile hit into localized voxel loss and throttles the
//! expensive mesh rebuild. Removal size scales with the object's own
//! voxels-per-hit-point ratio and is clamped per hit; rebuilds are
//! deduplicated per entity, rate-limited by object size and capped per tick.

use crate::config::VoxelConfig;
use crate::voxel::{VoxelGeometry, VoxelGrid};
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, IVec3, Quat, Vec3};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of carving one hit into an object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelHit {
    /// Cells removed
    pub removed: usize,
    /// World positions of removed resource cells; these become gems
    pub resource_positions: Vec<Vec3>,
    /// World positions of removed structural cells; these become debris
    pub debris_positions: Vec<Vec3>,
    /// The hit carved away the last cell
    pub depleted: bool,
}

/// Object-space frame of a voxel object
struct ObjectFrame {
    position: Vec3,
    rotation: Quat,
    scale: f32,
}

impl ObjectFrame {
    fn to_local(&self, world: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(world - self.position)) / self.scale
    }

    fn to_world(&self, local: &Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }
}

/// Carves hits into voxel objects and schedules mesh rebuilds
#[derive(Debug, Clone)]
pub struct VoxelDestructionSystem {
    config: VoxelConfig,
    queue: VecDeque<Entity>,
    queued: HashSet<Entity>,
    last_rebuild: HashMap<Entity, f32>,
    sim_time: f32,
}

impl VoxelDestructionSystem {
    /// Create a destruction system
    pub fn new(config: &VoxelConfig) -> Self {
        Self {
            config: config.clone(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            last_rebuild: HashMap::new(),
            sim_time: 0.0,
        }
    }

    /// Voxels removed for `damage` on an object with `initial_count` cells and `max_hp`
    pub fn removal_quota(&self, damage: f32, initial_count: usize, max_hp: f32) -> usize {
        let min = self.config.min_voxels_per_hit;
        let max = self.config.max_voxels_per_hit.max(min);
        if max_hp <= 0.0 {
            return max;
        }
        let raw = (damage * initial_count as f32 / max_hp).ceil();
        if raw.is_nan() {
            return min;
        }
        raw.clamp(min as f32, max as f32) as usize
    }

    /// Carve a hit at `hit_world` travelling along `incoming_velocity`
    ///
    /// Returns `None` when the entity has no voxel occupancy or no transform.
    /// A hit that finds no filled cell within the search radius removes
    /// nothing and queues no rebuild.
    pub fn on_hit<V: VoxelGeometry>(
        &mut self,
        entity: Entity,
        hit_world: Vec3,
        incoming_velocity: Vec3,
        damage: f32,
        world: &World,
        voxels: &mut V,
    ) -> Option<VoxelHit> {
        let transform = world.transform.get(entity)?;
        let max_hp = world.health(entity).map_or(0.0, |h| h.max_hp);
        let grid = voxels.grid_mut(entity)?;

        let frame = ObjectFrame {
            position: transform.position,
            rotation: utils::quat_from_euler(&transform.rotation),
            scale: transform.scale.x.max(f32::EPSILON),
        };

        // Step 1: hit cell, nudged half a voxel into the surface
        let mut local = frame.to_local(&hit_world);
        if let Some(direction) = incoming_velocity.try_normalize(f32::EPSILON) {
            local += frame.rotation.inverse_transform_vector(&direction) * (grid.voxel_size() * 0.5);
        }
        let hit_cell = grid.cell_at(&local);

        // Step 2: quota and nearest-first search
        let quota = self.removal_quota(damage, grid.initial_count(), max_hp);
        let selected = nearest_cells(grid, hit_cell, quota, self.config.max_search_radius);

        let mut hit = VoxelHit::default();
        if selected.is_empty() {
            log::trace!("Hit on {} found no voxels near {:?}", entity, hit_cell);
            return Some(hit);
        }

        // Step 3: remove and partition
        for cell in &selected {
            let center = frame.to_world(&grid.cell_center(cell));
            match grid.remove(cell) {
                Some(true) => hit.resource_positions.push(center),
                Some(false) => hit.debris_positions.push(center),
                None => continue,
            }
            hit.removed += 1;
        }
        hit.depleted = grid.is_empty();

        // Step 4: schedule the rebuild
        self.request_rebuild(entity);

        log::trace!(
            "Carved {} voxels from {} ({} resources, depleted: {})",
            hit.removed,
            entity,
            hit.resource_positions.len(),
            hit.depleted
        );
        Some(hit)
    }

    /// Queue a mesh rebuild; an entity already queued stays queued once
    pub fn request_rebuild(&mut self, entity: Entity) {
        if self.queued.insert(entity) {
            self.queue.push_back(entity);
        }
    }

    /// Whether `entity` is waiting for a rebuild
    pub fn is_queued(&self, entity: Entity) -> bool {
        self.queued.contains(&entity)
    }

    /// Number of entities waiting for a rebuild
    pub fn pending_rebuilds(&self) -> usize {
        self.queue.len()
    }

    /// Minimum seconds between rebuilds of an object at `scale`
    pub fn rebuild_interval(&self, scale: f32) -> f32 {
        self.config.rebuild_interval + self.config.rebuild_interval_per_scale * scale.max(0.0)
    }

    /// Process queued rebuilds for this tick
    ///
    /// At most `max_rebuilds_per_tick` rebuilds run. Entities still cooling
    /// down go to the back of the queue. Returns the rebuilds performed.
    pub fn update<V: VoxelGeometry>(&mut self, dt: f32, world: &World, voxels: &mut V) -> usize {
        self.sim_time += dt;
        let mut processed = 0;

        for _ in 0..self.queue.len() {
            if processed >= self.config.max_rebuilds_per_tick {
                break;
            }
            let Some(entity) = self.queue.pop_front() else {
                break;
            };
            if voxels.grid(entity).is_none() {
                self.queued.remove(&entity);
                continue;
            }

            let scale = world.transform.get(entity).map_or(1.0, |t| t.scale.x);
            let interval = self.rebuild_interval(scale);
            let due = self
                .last_rebuild
                .get(&entity)
                .map_or(true, |last| self.sim_time - last >= interval);

            if due {
                voxels.rebuild_mesh(entity);
                self.last_rebuild.insert(entity, self.sim_time);
                self.queued.remove(&entity);
                processed += 1;
            } else {
                self.queue.push_back(entity);
            }
        }
        processed
    }

    /// Drop all rebuild state for a destroyed entity
    pub fn forget(&mut self, entity: Entity) {
        if self.queued.remove(&entity) {
            self.queue.retain(|queued| *queued != entity);
        }
        self.last_rebuild.remove(&entity);
    }
}

/// Up to `quota` filled cells nearest `center`, searching shells out to `max_radius`
fn nearest_cells(grid: &VoxelGrid, center: IVec3, quota: usize, max_radius: i32) -> Vec<IVec3> {
    let mut candidates: Vec<(i32, IVec3)> = Vec::new();
    if quota == 0 {
        return Vec::new();
    }

    for radius in 0..=max_radius.max(0) {
        for x in -radius..=radius {
            for y in -radius..=radius {
                for z in -radius..=radius {
                    if x.abs().max(y.abs()).max(z.abs()) != radius {
                        continue;
                    }
                    let cell = center + IVec3::new(x, y, z);
                    if grid.contains(&cell) {
                        candidates.push((x * x + y * y + z * z, cell));
                    }
                }
            }
        }

        // Cells in later shells are at least `radius + 1` away
        if candidates.len() >= quota {
            candidates.sort_by_key(|(distance_sq, cell)| (*distance_sq, cell.x, cell.y, cell.z));
            let next_shell = (radius + 1) * (radius + 1);
            if candidates[quota - 1].0 <= next_shell {
                break;
            }
        }
    }

    candidates.sort_by_key(|(distance_sq, cell)| (*distance_sq, cell.x, cell.y, cell.z));
    candidates.truncate(quota);
    candidates.into_iter().map(|(_, cell)| cell).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ObjectKind, ObjectSpec, Transform};
    use crate::voxel::VoxelStore;

    fn setup(grid: VoxelGrid, max_hp: f32) -> (World, VoxelStore, Entity) {
        let mut world = World::new();
        let entity = world.create_object(ObjectSpec {
            kind: ObjectKind::Asteroid,
            loot_value: 1.0,
            max_hp,
        });
        world.transform.insert(entity, Transform::default());
        let mut store = VoxelStore::new();
        store.attach(entity, grid);
        (world, store, entity)
    }

    #[test]
    fn test_quota_clamps() {
        let system = VoxelDestructionSystem::new(&VoxelConfig::default());
        assert_eq!(system.removal_quota(20.0, 100, 100.0), 18);
        assert_eq!(system.removal_quota(5.0, 100, 100.0), 5);
        assert_eq!(system.removal_quota(0.01, 100, 100.0), 1);
        assert_eq!(system.removal_quota(f32::NAN, 100, 100.0), 1);
    }

    #[test]
    fn test_hit_removes_nearest_cells() {
        let (world, mut store, e) = setup(VoxelGrid::filled_box(IVec3::new(5, 5, 5), 1.0), 125.0);
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        // Hit the -Z face in the middle, travelling +Z
        let hit = system
            .on_hit(e, Vec3::new(0.0, 0.0, -2.5), Vec3::z(), 1.0, &world, &mut store)
            .unwrap();
        assert_eq!(hit.removed, 1);
        assert!(!store.grid(e).unwrap().contains(&IVec3::new(2, 2, 0)));
        assert!(system.is_queued(e));
    }

    #[test]
    fn test_missing_occupancy_is_noop() {
        let (world, _, e) = setup(VoxelGrid::sphere(2, 1.0), 10.0);
        let mut empty = VoxelStore::new();
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        assert!(system
            .on_hit(e, Vec3::zeros(), Vec3::z(), 10.0, &world, &mut empty)
            .is_none());
        assert_eq!(system.pending_rebuilds(), 0);
    }

    #[test]
    fn test_far_hit_removes_nothing() {
        let (world, mut store, e) = setup(VoxelGrid::sphere(2, 1.0), 10.0);
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        let hit = system
            .on_hit(e, Vec3::new(500.0, 0.0, 0.0), Vec3::z(), 10.0, &world, &mut store)
            .unwrap();
        assert_eq!(hit, VoxelHit::default());
        assert_eq!(system.pending_rebuilds(), 0);
    }

    #[test]
    fn test_depletion_is_reported() {
        let grid = VoxelGrid::filled_box(IVec3::new(2, 1, 1), 1.0).with_resources([IVec3::new(0, 0, 0)]);
        let (world, mut store, e) = setup(grid, 1.0);
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        let hit = system
            .on_hit(e, Vec3::zeros(), Vec3::x(), 100.0, &world, &mut store)
            .unwrap();
        assert_eq!(hit.removed, 2);
        assert_eq!(hit.resource_positions.len(), 1);
        assert_eq!(hit.debris_positions.len(), 1);
        assert!(hit.depleted);
    }

    #[test]
    fn test_rebuilds_are_deduplicated_and_throttled() {
        let (world, mut store, e) = setup(VoxelGrid::sphere(4, 0.25), 100.0);
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        let dt = 1.0 / 60.0;

        system.request_rebuild(e);
        system.request_rebuild(e);
        assert_eq!(system.pending_rebuilds(), 1);
        assert_eq!(system.update(dt, &world, &mut store), 1);

        // Hit again straight away: cooling down, stays queued
        system.request_rebuild(e);
        assert_eq!(system.update(dt, &world, &mut store), 0);
        assert!(system.is_queued(e));

        let mut ticks = 0;
        while system.is_queued(e) {
            system.update(dt, &world, &mut store);
            ticks += 1;
            assert!(ticks < 60);
        }
        assert_eq!(store.rebuild_count(e), 2);
    }

    #[test]
    fn test_rebuilds_capped_per_tick() {
        let mut world = World::new();
        let mut store = VoxelStore::new();
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        for _ in 0..7 {
            let e = world.create_entity();
            store.attach(e, VoxelGrid::sphere(2, 1.0));
            system.request_rebuild(e);
        }
        assert_eq!(system.update(0.016, &world, &mut store), 3);
        assert_eq!(system.update(0.016, &world, &mut store), 3);
        assert_eq!(system.update(0.016, &world, &mut store), 1);
        assert_eq!(store.total_rebuilds(), 7);
    }

    #[test]
    fn test_forget_drops_queue_entry() {
        let (world, mut store, e) = setup(VoxelGrid::sphere(2, 1.0), 10.0);
        let mut system = VoxelDestructionSystem::new(&VoxelConfig::default());
        system.request_rebuild(e);
        system.forget(e);
        assert_eq!(system.pending_rebuilds(), 0);
        assert_eq!(system.update(0.016, &world, &mut store), 0);
    }
}
