//! Materialization and the destruction handoff
//!
//! Creates loot and destructible objects together with their renderables,
//! and owns the single code path that tears an object down. Loot render
//! handles come from per-kind pools so pickups are recycled rather than
//! reallocated.

use super::vfx::VfxSystem;
use super::voxel_destruction::VoxelDestructionSystem;
use super::TickContext;
use crate::components::{Loot, LootKind, LootMotion, ObjectKind, ObjectSpec, Transform};
use crate::config::{LootConfig, WorldConfig};
use crate::hooks::GameEvents;
use crate::render::{Pose, Registry, RenderBackend, RenderHandle, RenderKind, RenderSlot};
use crate::voxel::{VoxelGeometry, VoxelGrid};
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{constants, IVec3, Vec3};
use nova_engine::pool::{ObjectPool, Released};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Everything needed to place a destructible object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectBlueprint {
    /// Identity and health
    pub spec: ObjectSpec,
    /// Initial pose; scale must be uniform
    pub transform: Transform,
    /// Angular velocity per tick
    pub spin: Vec3,
    /// Voxel occupancy handed to the geometry collaborator
    pub grid: Option<VoxelGrid>,
    /// Attach a ring decoration
    pub ring: bool,
}

impl ObjectBlueprint {
    /// Blueprint at `position` with uniform `scale` and no voxels
    pub fn new(spec: ObjectSpec, position: Vec3, scale: f32) -> Self {
        Self {
            spec,
            transform: Transform::from_position(position).with_uniform_scale(scale),
            spin: Vec3::zeros(),
            grid: None,
            ring: false,
        }
    }

    /// Builder-style voxel occupancy
    pub fn with_grid(mut self, grid: VoxelGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Builder-style spin
    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.spin = spin;
        self
    }

    /// Builder-style ring decoration
    pub fn with_ring(mut self, ring: bool) -> Self {
        self.ring = ring;
        self
    }
}

/// Spawns loot and objects, and tears objects down exactly once
#[derive(Debug)]
pub struct SpawnSystem {
    loot: LootConfig,
    layout: WorldConfig,
    loot_pools: HashMap<LootKind, ObjectPool<RenderHandle>>,
    rng: StdRng,
    destroyed: u64,
}

impl SpawnSystem {
    /// Create a spawner with empty loot pools
    pub fn new(loot: &LootConfig, layout: &WorldConfig, seed: u64) -> Self {
        let loot_pools = [(LootKind::Gem, "gem"), (LootKind::Coin, "coin")]
            .into_iter()
            .map(|(kind, name)| (kind, ObjectPool::new(name, loot.pool_capacity)))
            .collect();
        Self {
            loot: loot.clone(),
            layout: layout.clone(),
            loot_pools,
            rng: StdRng::seed_from_u64(seed),
            destroyed: 0,
        }
    }

    /// Objects destroyed so far
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }

    /// Free render handles pooled for `kind`
    pub fn loot_pool(&self, kind: LootKind) -> Option<&ObjectPool<RenderHandle>> {
        self.loot_pools.get(&kind)
    }

    /// Coins dropped by an object worth `loot_value`
    pub fn coin_count(&self, loot_value: f32) -> u32 {
        if loot_value <= 0.0 || self.loot.coin_value <= 0.0 {
            return 0;
        }
        let raw = (loot_value / self.loot.coin_value).ceil();
        raw.clamp(1.0, self.loot.max_drops_per_object.max(1) as f32) as u32
    }

    /// Create one pickup at `position` drifting with `velocity`
    pub fn spawn_loot<R: RenderBackend>(
        &mut self,
        world: &mut World,
        registry: &mut Registry,
        renderer: &mut R,
        loot: Loot,
        position: Vec3,
        velocity: Vec3,
    ) -> Entity {
        let entity = world.create_loot(loot);
        let scale = self.loot.pickup_scale;
        let transform = Transform::from_position(position).with_uniform_scale(scale);
        world.transform.insert(entity, transform);
        world.velocity.insert(entity, velocity);
        world.loot_motion.insert(
            entity,
            LootMotion {
                rotation_speed: Vec3::new(
                    self.rng.gen_range(-0.03..0.03),
                    self.rng.gen_range(0.01..0.04),
                    self.rng.gen_range(-0.03..0.03),
                ),
                drift_offset: self.rng.gen_range(0.0..constants::TAU),
                float_base_y: position.y,
                base_scale: scale,
            },
        );

        let kind = RenderKind::Loot(loot.kind);
        let mut fresh = false;
        let handle = match self.loot_pools.get_mut(&loot.kind) {
            Some(pool) => pool.acquire_or_else(|| {
                fresh = true;
                renderer.create(kind)
            }),
            None => {
                fresh = true;
                renderer.create(kind)
            }
        };
        if !fresh {
            renderer.reset(handle);
        }
        renderer.set_visible(handle, true);
        renderer.set_pose(handle, &Pose::from(&transform));
        registry.bind(entity, handle, RenderSlot::pooled(kind));
        entity
    }

    /// Scatter `count` pickups sharing `total_value` around `center`
    pub fn spawn_loot_burst<R: RenderBackend>(
        &mut self,
        world: &mut World,
        registry: &mut Registry,
        renderer: &mut R,
        kind: LootKind,
        total_value: f32,
        count: u32,
        center: Vec3,
    ) -> Vec<Entity> {
        if count == 0 {
            return Vec::new();
        }
        let value = total_value / count as f32;
        (0..count)
            .map(|_| {
                let direction = self.random_direction();
                let velocity = direction * self.loot.scatter_speed * self.rng.gen_range(0.5..1.0);
                self.spawn_loot(world, registry, renderer, Loot { kind, value }, center, velocity)
            })
            .collect()
    }

    /// Remove a pickup and return its renderable to the pool
    ///
    /// Returns whether the entity was a live pickup.
    pub fn despawn_loot<R: RenderBackend>(
        &mut self,
        world: &mut World,
        registry: &mut Registry,
        renderer: &mut R,
        entity: Entity,
    ) -> bool {
        let Some(loot) = world.loot.get(entity).copied() else {
            return false;
        };
        if let Some(binding) = registry.unbind(entity) {
            renderer.set_visible(binding.handle, false);
            let released = match self.loot_pools.get_mut(&loot.kind) {
                Some(pool) => pool.release(binding.handle),
                None => Released::Discarded(binding.handle),
            };
            if let Released::Discarded(handle) = released {
                renderer.destroy(handle);
            }
        }
        world.remove_entity(entity)
    }

    /// Place a destructible object and its renderables
    pub fn spawn_object<R: RenderBackend, V: VoxelGeometry>(
        &mut self,
        world: &mut World,
        registry: &mut Registry,
        renderer: &mut R,
        voxels: &mut V,
        blueprint: ObjectBlueprint,
    ) -> Entity {
        let entity = world.create_object(blueprint.spec);
        world.transform.insert(entity, blueprint.transform);
        if blueprint.spin != Vec3::zeros() {
            world.spin.insert(entity, blueprint.spin);
        }
        if let Some(grid) = blueprint.grid {
            voxels.attach(entity, grid);
        }

        let kind = RenderKind::Object(blueprint.spec.kind);
        let handle = renderer.create(kind);
        let pose = Pose::from(&blueprint.transform);
        renderer.set_pose(handle, &pose);
        let mut slot = RenderSlot::owned(kind);
        if blueprint.ring {
            let ring = renderer.create(RenderKind::PlanetRing);
            renderer.set_pose(ring, &pose);
            slot.decorations.push(ring);
        }
        registry.bind(entity, handle, slot);
        entity
    }

    /// Scatter the configured asteroids and planets through the field
    pub fn seed_field<R: RenderBackend, V: VoxelGeometry>(
        &mut self,
        world: &mut World,
        registry: &mut Registry,
        renderer: &mut R,
        voxels: &mut V,
    ) -> Vec<Entity> {
        let mut spawned = Vec::new();
        for _ in 0..self.layout.field_asteroids {
            let blueprint = self.asteroid_blueprint();
            spawned.push(self.spawn_object(world, registry, renderer, voxels, blueprint));
        }
        for _ in 0..self.layout.field_planets {
            let blueprint = self.planet_blueprint();
            spawned.push(self.spawn_object(world, registry, renderer, voxels, blueprint));
        }
        log::info!("Seeded field with {} objects", spawned.len());
        spawned
    }

    fn asteroid_blueprint(&mut self) -> ObjectBlueprint {
        let scale = self.rng.gen_range(2.0..6.0);
        let spec = ObjectSpec {
            kind: ObjectKind::Asteroid,
            loot_value: (scale * 5.0_f32).round(),
            max_hp: scale * 10.0,
        };
        let grid = self.seeded_grid(4, 0.25, 0.12);
        let spin = Vec3::new(
            self.rng.gen_range(-0.01..0.01),
            self.rng.gen_range(-0.01..0.01),
            self.rng.gen_range(-0.01..0.01),
        );
        ObjectBlueprint::new(spec, self.field_position(scale), scale)
            .with_grid(grid)
            .with_spin(spin)
    }

    fn planet_blueprint(&mut self) -> ObjectBlueprint {
        let scale = self.rng.gen_range(18.0..30.0);
        let spec = ObjectSpec {
            kind: ObjectKind::Planet,
            loot_value: (scale * 4.0_f32).round(),
            max_hp: scale * 40.0,
        };
        let grid = self.seeded_grid(6, 1.0 / 6.0, 0.05);
        let ring = self.rng.gen_bool(0.5);
        ObjectBlueprint::new(spec, self.field_position(scale), scale)
            .with_grid(grid)
            .with_spin(Vec3::new(0.0, 0.002, 0.0))
            .with_ring(ring)
    }

    fn seeded_grid(&mut self, radius_cells: i32, voxel_size: f32, resource_fraction: f64) -> VoxelGrid {
        let grid = VoxelGrid::sphere(radius_cells, voxel_size);
        let mut cells: Vec<IVec3> = grid.cells().copied().collect();
        cells.sort_unstable_by_key(|c| (c.x, c.y, c.z));
        let resources: Vec<IVec3> = cells
            .into_iter()
            .filter(|_| self.rng.gen_bool(resource_fraction))
            .collect();
        grid.with_resources(resources)
    }

    /// Random point in the field clear of the base and the launch point
    fn field_position(&mut self, scale: f32) -> Vec3 {
        let clearance = self.layout.field_clearance + scale;
        let mut candidate = Vec3::zeros();
        for _ in 0..32 {
            candidate = self.random_direction() * self.rng.gen_range(0.0..1.0_f32).cbrt() * self.layout.field_radius;
            let clear_of_base = (candidate - self.layout.base_position).norm() > clearance;
            let clear_of_launch = candidate.norm() > clearance;
            if clear_of_base && clear_of_launch {
                break;
            }
        }
        candidate
    }

    fn random_direction(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..constants::TAU);
        let z: f32 = self.rng.gen_range(-1.0..1.0);
        let r = (1.0 - z * z).sqrt();
        Vec3::new(r * theta.cos(), z, r * theta.sin())
    }

    /// Tear down a destructible object
    ///
    /// Spawns the explosion, notifies listeners, drops the loot burst,
    /// releases voxel and render state, then removes the entity. A second call
    /// for the same entity finds no object and does nothing. Returns whether
    /// the object was destroyed by this call.
    pub fn destroy_object<R: RenderBackend, E: GameEvents, V: VoxelGeometry>(
        &mut self,
        ctx: &mut TickContext<'_, R, E, V>,
        vfx: &mut VfxSystem,
        voxel_system: &mut VoxelDestructionSystem,
        entity: Entity,
    ) -> bool {
        let Some(meta) = ctx.world.object_meta.get(entity).copied() else {
            return false;
        };
        let (position, scale) = ctx
            .world
            .transform
            .get(entity)
            .map_or((Vec3::zeros(), 1.0), |t| (t.position, t.scale.x));

        // Step 1: effects and notifications
        vfx.spawn_explosion(ctx.renderer, position, scale);
        ctx.events.play_explosion(position, scale);
        ctx.events.object_destroyed(entity, meta.kind, position);

        // Step 2: loot
        let coins = self.coin_count(meta.loot_value);
        self.spawn_loot_burst(
            ctx.world,
            ctx.registry,
            ctx.renderer,
            LootKind::Coin,
            meta.loot_value,
            coins,
            position,
        );

        // Step 3: release voxel and render state, then the entity
        ctx.voxels.remove(entity);
        voxel_system.forget(entity);
        if let Some(binding) = ctx.registry.unbind(entity) {
            vfx.cancel_flash(binding.handle);
            renderer_destroy_all(ctx.renderer, binding.handle, &binding.meta.decorations);
        }
        ctx.world.remove_entity(entity);

        self.destroyed += 1;
        log::info!("Destroyed {:?} {} at {:?}, dropped {} coins", meta.kind, entity, position, coins);
        true
    }
}

fn renderer_destroy_all<R: RenderBackend>(renderer: &mut R, handle: RenderHandle, decorations: &[RenderHandle]) {
    for decoration in decorations {
        renderer.destroy(*decoration);
    }
    renderer.destroy(handle);
}
