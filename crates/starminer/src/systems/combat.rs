//! Target lock, firing and projectile collision
//!
//! The lock is a per-tick state machine. Acquisition scores every object in
//! range, inside the forward cone and near the screen center; a held lock is
//! kept under a looser keep radius so it does not flicker, and any unlock
//! starts a short re-acquire cooldown.
//!
//! Projectiles travel in straight lines. Each tick a projectile's swept
//! segment is tested against object collision spheres using squared
//! distances; the first object along the segment takes the hit.

use super::camera::{Camera, ScreenPoint};
use super::spawn::SpawnSystem;
use super::vfx::VfxSystem;
use super::voxel_destruction::VoxelDestructionSystem;
use super::TickContext;
use crate::components::{Loot, LootKind, ObjectKind};
use crate::config::{CombatConfig, LockConfig, ShipLoadout, VoxelConfig};
use crate::hooks::GameEvents;
use crate::render::{Pose, RenderBackend, RenderHandle, RenderKind};
use crate::voxel::VoxelGeometry;
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, Quat, Vec3};
use nova_engine::pool::{ObjectPool, Released};

/// Target lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    /// No target
    #[default]
    Unlocked,
    /// Aim assist is locked onto an object
    Locked(Entity),
}

impl LockState {
    /// Locked target, if any
    pub fn target(self) -> Option<Entity> {
        match self {
            Self::Unlocked => None,
            Self::Locked(entity) => Some(entity),
        }
    }
}

/// Result of a fire request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A projectile was spawned
    Fired,
    /// The wall-clock fire interval has not elapsed
    CoolingDown,
    /// No energy left
    OutOfEnergy,
    /// Docked; weapons are offline
    Paused,
    /// No player ship to fire from
    Unavailable,
}

/// A live projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// World-space position
    pub position: Vec3,
    /// Displacement per tick
    pub velocity: Vec3,
    /// Seconds left before expiry
    pub life: f32,
    /// Renderable borrowed from the projectile pool
    pub handle: RenderHandle,
    /// Target this shot ignores occluders for, per the occluder policy
    pub pierce_target: Option<Entity>,
}

/// Collision candidate snapshot for one tick
#[derive(Debug, Clone, Copy)]
struct Collidable {
    entity: Entity,
    center: Vec3,
    radius_sq: f32,
}

/// Combat state: lock, crosshair, weapon timing and live projectiles
#[derive(Debug)]
pub struct CombatSystem {
    combat: CombatConfig,
    lock_config: LockConfig,
    weapon_power: f32,
    resource_loot_value: f32,
    lock: LockState,
    cooldown: f32,
    crosshair: (f32, f32),
    last_shot: Option<f64>,
    energy_notified: bool,
    reported_energy: f32,
    projectiles: Vec<Projectile>,
    pool: ObjectPool<RenderHandle>,
}

impl CombatSystem {
    /// Create a combat system for a ship with `loadout`
    pub fn new(
        combat: &CombatConfig,
        lock: &LockConfig,
        voxel: &VoxelConfig,
        loadout: &ShipLoadout,
        pool_capacity: usize,
    ) -> Self {
        Self {
            combat: combat.clone(),
            lock_config: lock.clone(),
            weapon_power: loadout.weapon_power,
            resource_loot_value: voxel.resource_loot_value,
            lock: LockState::Unlocked,
            cooldown: 0.0,
            crosshair: (0.0, 0.0),
            last_shot: None,
            energy_notified: false,
            reported_energy: loadout.max_energy.floor(),
            projectiles: Vec::new(),
            pool: ObjectPool::new("projectile", pool_capacity),
        }
    }

    /// Current lock state
    pub fn lock(&self) -> LockState {
        self.lock
    }

    /// Locked target, if any
    pub fn lock_target(&self) -> Option<Entity> {
        self.lock.target()
    }

    /// Smoothed crosshair in NDC
    pub fn crosshair(&self) -> (f32, f32) {
        self.crosshair
    }

    /// Live projectiles
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Free projectile renderables
    pub fn projectile_pool(&self) -> &ObjectPool<RenderHandle> {
        &self.pool
    }

    /// Seconds until a new lock may be acquired
    pub fn reacquire_cooldown(&self) -> f32 {
        self.cooldown.max(0.0)
    }

    /// Collision radius of `entity`, from its uniform scale and kind
    fn collision_radius(&self, world: &World, entity: Entity) -> Option<f32> {
        let kind = world.object_meta.get(entity)?.kind;
        let scale = world.transform.get(entity)?.scale.x;
        Some(scale * self.combat.bounding_radius(kind))
    }

    fn unlock<E: GameEvents>(&mut self, events: &mut E, reason: &str) {
        if let LockState::Locked(target) = self.lock {
            log::debug!("Lock on {} released: {}", target, reason);
            self.lock = LockState::Unlocked;
            self.cooldown = self.lock_config.reacquire_cooldown;
            events.lock_changed(None);
        }
    }

    /// Drop the lock if the target no longer exists
    fn validate_lock<E: GameEvents>(&mut self, world: &World, events: &mut E) {
        if let LockState::Locked(target) = self.lock {
            if !world.object_meta.contains(target) {
                self.unlock(events, "target destroyed");
            }
        }
    }

    /// Whether a held lock survives this tick
    fn keeps_lock(&self, world: &World, camera: &Camera, target: Entity) -> bool {
        let Some(position) = world.position(target) else {
            return false;
        };
        camera.project(&position).is_some_and(|screen| {
            screen.within(1.0) && screen.center_distance() <= self.lock_config.keep_radius
        })
    }

    /// Best acquisition candidate, lowest score wins
    fn find_target(&self, world: &World, camera: &Camera, origin: Vec3, forward: Vec3) -> Option<Entity> {
        let cfg = &self.lock_config;
        let cone = utils::deg_to_rad(cfg.cone_degrees).max(f32::EPSILON);
        let max_range = cfg.max_range.max(f32::EPSILON);
        let acquire = cfg.acquire_radius.max(f32::EPSILON);
        let mut best: Option<(f32, Entity)> = None;

        for entity in world.objects() {
            let Some(position) = world.position(entity) else {
                continue;
            };
            let offset = position - origin;
            let distance = offset.norm();
            if distance > max_range || distance <= f32::EPSILON {
                continue;
            }
            let angle = (forward.dot(&offset) / distance).clamp(-1.0, 1.0).acos();
            if angle > cone {
                continue;
            }
            let Some(screen) = camera.project(&position) else {
                continue;
            };
            if !screen.within(cfg.screen_margin) || screen.center_distance() > acquire {
                continue;
            }

            let radius = self.collision_radius(world, entity).unwrap_or(0.0);
            let size_assist = (radius / distance).clamp(0.0, 1.0);
            let score = cfg.weight_screen * screen.center_distance() / acquire
                + cfg.weight_distance * distance / max_range
                + cfg.weight_angle * angle / cone
                - cfg.weight_size * size_assist;

            if best.map_or(true, |(best_score, _)| score < best_score) {
                best = Some((score, entity));
            }
        }
        best.map(|(_, entity)| entity)
    }

    /// Run the lock state machine for one tick
    fn update_lock<E: GameEvents>(
        &mut self,
        world: &World,
        events: &mut E,
        camera: &Camera,
        player: Entity,
        dt: f32,
    ) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.validate_lock(world, events);

        if let LockState::Locked(target) = self.lock {
            if !self.keeps_lock(world, camera, target) {
                self.unlock(events, "left keep radius");
            }
            return;
        }
        if self.cooldown > 0.0 {
            return;
        }

        let Some(origin) = world.position(player) else {
            return;
        };
        let Some(rotation) = world.rotation.get(player) else {
            return;
        };
        if let Some(target) = self.find_target(world, camera, origin, rotation * Vec3::z()) {
            log::debug!("Locked onto {}", target);
            self.lock = LockState::Locked(target);
            events.lock_changed(Some(target));
        }
    }

    /// Ease the crosshair toward the locked target or the screen center
    fn update_crosshair<E: GameEvents>(&mut self, world: &World, events: &mut E, camera: &Camera, dt: f32) {
        let cfg = &self.lock_config;
        let screen = self
            .lock
            .target()
            .and_then(|target| world.position(target))
            .and_then(|position| camera.project(&position));

        let (goal, depth_factor) = match screen {
            Some(ScreenPoint { x, y, depth }) => {
                let factor = (depth / cfg.max_range.max(f32::EPSILON)).clamp(0.0, 1.0);
                let pull = 1.0 - cfg.crosshair_depth_pull * factor;
                ((x * pull, y * pull), factor)
            }
            None => ((0.0, 0.0), 0.0),
        };
        let rate = cfg.crosshair_rate * (1.0 - cfg.crosshair_depth_smoothing * depth_factor);
        let alpha = utils::smoothing_factor(rate, dt);
        self.crosshair = (
            utils::lerp(self.crosshair.0, goal.0, alpha),
            utils::lerp(self.crosshair.1, goal.1, alpha),
        );
        events.crosshair_moved(self.crosshair.0, self.crosshair.1, screen.is_some());
    }

    /// Regain energy and report whole-unit changes
    fn regen_energy<R, E: GameEvents, V>(&mut self, ctx: &mut TickContext<'_, R, E, V>, dt: f32) {
        if ctx.stats.paused {
            return;
        }
        ctx.stats.regen_energy(self.combat.energy_regen_per_sec * dt);
        let whole = ctx.stats.energy.floor();
        if whole != self.reported_energy {
            self.reported_energy = whole;
            ctx.events.stats_changed(*ctx.stats);
        }
        if ctx.stats.energy > 0.0 {
            self.energy_notified = false;
        }
    }

    /// Attempt to fire at wall-clock time `wall_time`
    ///
    /// Rejected shots consume nothing.
    pub fn try_fire<R: RenderBackend, E: GameEvents, V>(
        &mut self,
        ctx: &mut TickContext<'_, R, E, V>,
        player: Entity,
        wall_time: f64,
    ) -> FireOutcome {
        if ctx.stats.paused {
            return FireOutcome::Paused;
        }
        if self
            .last_shot
            .is_some_and(|last| wall_time - last < self.combat.fire_interval)
        {
            return FireOutcome::CoolingDown;
        }
        if ctx.stats.energy <= 0.0 {
            if !self.energy_notified {
                self.energy_notified = true;
                ctx.events.show_message("Energy depleted");
            }
            return FireOutcome::OutOfEnergy;
        }
        let (Some(origin), Some(rotation)) = (ctx.world.position(player), ctx.world.rotation.get(player).copied())
        else {
            return FireOutcome::Unavailable;
        };

        ctx.stats.spend_energy(self.combat.energy_cost);
        self.reported_energy = ctx.stats.energy.floor();
        self.last_shot = Some(wall_time);

        let muzzle = origin + rotation * self.combat.muzzle_offset;
        let forward = rotation * Vec3::z();
        let locked = self
            .lock
            .target()
            .and_then(|target| ctx.world.position(target).map(|position| (target, position)));
        let direction = locked
            .and_then(|(_, position)| (position - muzzle).try_normalize(f32::EPSILON))
            .unwrap_or(forward);
        let pierce_target = locked.map(|(target, _)| target).filter(|target| {
            ctx.world
                .object_meta
                .get(*target)
                .is_some_and(|meta| self.combat.occluder_policy.pierces_for(meta.kind))
        });

        let mut fresh = false;
        let handle = self.pool.acquire_or_else(|| {
            fresh = true;
            ctx.renderer.create(RenderKind::Projectile)
        });
        if !fresh {
            ctx.renderer.reset(handle);
        }
        ctx.renderer.set_visible(handle, true);
        ctx.renderer.set_pose(handle, &projectile_pose(muzzle, direction));

        self.projectiles.push(Projectile {
            position: muzzle,
            velocity: direction * self.combat.projectile_speed,
            life: self.combat.projectile_life,
            handle,
            pierce_target,
        });
        ctx.events.play_shot(muzzle);
        ctx.events.stats_changed(*ctx.stats);
        log::trace!("Fired from {:?} toward {:?}", muzzle, direction);
        FireOutcome::Fired
    }

    fn recycle<R: RenderBackend>(&mut self, renderer: &mut R, handle: RenderHandle) {
        renderer.set_visible(handle, false);
        if let Released::Discarded(handle) = self.pool.release(handle) {
            renderer.destroy(handle);
        }
    }

    /// Snapshot of every object that can be hit this tick
    fn collidables(&self, world: &World) -> Vec<Collidable> {
        world
            .objects()
            .into_iter()
            .filter_map(|entity| {
                let center = world.position(entity)?;
                let radius = self.collision_radius(world, entity)?;
                Some(Collidable {
                    entity,
                    center,
                    radius_sq: radius * radius,
                })
            })
            .collect()
    }

    /// One combat tick
    ///
    /// `fire_at` carries the wall-clock time of a fire request, if any.
    /// Returns the outcome of that request.
    pub fn update<R: RenderBackend, E: GameEvents, V: VoxelGeometry>(
        &mut self,
        ctx: &mut TickContext<'_, R, E, V>,
        camera: &Camera,
        player: Entity,
        spawn: &mut SpawnSystem,
        vfx: &mut VfxSystem,
        voxel_system: &mut VoxelDestructionSystem,
        fire_at: Option<f64>,
        dt: f32,
        step_scale: f32,
    ) -> Option<FireOutcome> {
        // Step 1: energy, lock and crosshair
        self.regen_energy(ctx, dt);
        self.update_lock(ctx.world, ctx.events, camera, player, dt);
        self.update_crosshair(ctx.world, ctx.events, camera, dt);

        // Step 2: firing
        let outcome = fire_at.map(|wall_time| self.try_fire(ctx, player, wall_time));

        // Step 3: projectiles
        let mut collidables = self.collidables(ctx.world);
        let projectiles = std::mem::take(&mut self.projectiles);
        let mut survivors = Vec::with_capacity(projectiles.len());

        for mut projectile in projectiles {
            projectile.life -= dt;
            if projectile.life <= 0.0 {
                self.recycle(ctx.renderer, projectile.handle);
                continue;
            }

            // A pierce target that is gone no longer exempts anything
            projectile.pierce_target = projectile.pierce_target.filter(|target| ctx.world.contains(*target));

            let start = projectile.position;
            let end = start + projectile.velocity * step_scale;
            let hit = first_hit(&collidables, &start, &end, projectile.pierce_target);

            let Some((index, hit_point)) = hit else {
                projectile.position = end;
                ctx.renderer
                    .set_pose(projectile.handle, &projectile_pose(end, projectile.velocity));
                survivors.push(projectile);
                continue;
            };

            self.recycle(ctx.renderer, projectile.handle);
            let target = collidables[index].entity;
            let center = collidables[index].center;
            if self.apply_hit(ctx, spawn, vfx, voxel_system, target, center, hit_point, projectile.velocity) {
                collidables.swap_remove(index);
            }
        }
        self.projectiles = survivors;

        // Step 4: a target destroyed this tick releases the lock now
        self.validate_lock(ctx.world, ctx.events);
        outcome
    }

    /// Damage, feedback, carving and destruction for one hit
    ///
    /// Returns whether the object was destroyed.
    fn apply_hit<R: RenderBackend, E: GameEvents, V: VoxelGeometry>(
        &mut self,
        ctx: &mut TickContext<'_, R, E, V>,
        spawn: &mut SpawnSystem,
        vfx: &mut VfxSystem,
        voxel_system: &mut VoxelDestructionSystem,
        target: Entity,
        center: Vec3,
        hit_point: Vec3,
        incoming: Vec3,
    ) -> bool {
        let damage = self.weapon_power;
        let Some(health) = ctx.world.damage(target, damage) else {
            return false;
        };

        if let Some(handle) = ctx.registry.get(target) {
            vfx.flash(ctx.renderer, handle, self.combat.hit_flash_secs);
        }
        vfx.spawn_sparks(ctx.renderer, hit_point);
        ctx.events.play_hit(hit_point, damage);

        let carved = voxel_system.on_hit(target, hit_point, incoming, damage, ctx.world, ctx.voxels);
        let mut depleted = false;
        if let Some(carved) = carved {
            for position in &carved.resource_positions {
                let drift = (position - center)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vec3::zeros)
                    * 0.05;
                spawn.spawn_loot(
                    ctx.world,
                    ctx.registry,
                    ctx.renderer,
                    Loot {
                        kind: LootKind::Gem,
                        value: self.resource_loot_value,
                    },
                    *position,
                    drift,
                );
            }
            vfx.spawn_debris(ctx.renderer, center, &carved.debris_positions);
            depleted = carved.depleted;
        }

        log::trace!("Hit {} for {}, hp {}/{}", target, damage, health.hp, health.max_hp);
        if health.is_depleted() || depleted {
            return spawn.destroy_object(ctx, vfx, voxel_system, target);
        }
        false
    }
}

/// Index of the first collidable along `start..end` and the entry point
fn first_hit(collidables: &[Collidable], start: &Vec3, end: &Vec3, only: Option<Entity>) -> Option<(usize, Vec3)> {
    let mut best: Option<(f32, usize)> = None;
    for (index, candidate) in collidables.iter().enumerate() {
        if only.is_some_and(|target| target != candidate.entity) {
            continue;
        }
        if utils::segment_point_distance_sq(start, end, &candidate.center) > candidate.radius_sq {
            continue;
        }
        let t = segment_entry(start, end, &candidate.center, candidate.radius_sq);
        if best.map_or(true, |(best_t, _)| t < best_t) {
            best = Some((t, index));
        }
    }
    best.map(|(t, index)| (index, start + (end - start) * t))
}

/// Segment parameter where `start..end` enters the sphere; the segment is
/// known to intersect it
fn segment_entry(start: &Vec3, end: &Vec3, center: &Vec3, radius_sq: f32) -> f32 {
    let direction = end - start;
    let offset = start - center;
    let c = offset.norm_squared() - radius_sq;
    if c <= 0.0 {
        return 0.0;
    }
    let a = direction.norm_squared();
    if a <= f32::EPSILON {
        return 0.0;
    }
    let b = 2.0 * offset.dot(&direction);
    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    ((-b - discriminant.sqrt()) / (2.0 * a)).clamp(0.0, 1.0)
}

fn projectile_pose(position: Vec3, direction: Vec3) -> Pose {
    let rotation = Quat::rotation_between(&Vec3::z(), &direction).unwrap_or_else(Quat::identity);
    Pose {
        position,
        rotation,
        scale: Vec3::repeat(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collidable(id: u32, z: f32, radius: f32) -> Collidable {
        Collidable {
            entity: Entity::from_raw(id),
            center: Vec3::new(0.0, 0.0, z),
            radius_sq: radius * radius,
        }
    }

    #[test]
    fn test_first_hit_prefers_nearest_along_path() {
        let candidates = [collidable(1, 9.0, 1.0), collidable(2, 3.0, 1.0)];
        let (index, point) = first_hit(&candidates, &Vec3::zeros(), &Vec3::new(0.0, 0.0, 10.0), None).unwrap();
        assert_eq!(index, 1);
        assert!((point.z - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_swept_segment_catches_fast_projectiles() {
        // Both endpoints are outside the sphere, the segment crosses it
        let candidates = [collidable(1, 5.0, 0.5)];
        assert!(first_hit(&candidates, &Vec3::zeros(), &Vec3::new(0.0, 0.0, 10.0), None).is_some());
        assert!(first_hit(&candidates, &Vec3::zeros(), &Vec3::new(0.0, 0.0, 4.0), None).is_none());
    }

    #[test]
    fn test_pierce_target_ignores_others() {
        let candidates = [collidable(1, 3.0, 1.0), collidable(2, 8.0, 1.0)];
        let hit = first_hit(
            &candidates,
            &Vec3::zeros(),
            &Vec3::new(0.0, 0.0, 10.0),
            Some(Entity::from_raw(2)),
        );
        assert_eq!(hit.map(|(index, _)| index), Some(1));
    }

    #[test]
    fn test_segment_entry_inside_is_zero() {
        assert_eq!(segment_entry(&Vec3::zeros(), &Vec3::z(), &Vec3::zeros(), 4.0), 0.0);
    }

    #[test]
    fn test_lock_state_target() {
        assert_eq!(LockState::Unlocked.target(), None);
        let e = Entity::from_raw(4);
        assert_eq!(LockState::Locked(e).target(), Some(e));
    }
}
