//! Pickup motion, magnet and collection
//!
//! Runs last in the tick so collection sees the player's final position.
//! The vertical float is recomputed from an anchor each tick instead of being
//! integrated, so it cannot drift over a long session; drift velocity moves
//! the anchor, never the oscillation.

use super::spawn::SpawnSystem;
use super::TickContext;
use crate::components::LootKind;
use crate::config::{LootConfig, WorldConfig};
use crate::hooks::GameEvents;
use crate::render::{Pose, RenderBackend};
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, Vec3};

/// Drifts, floats, attracts and collects pickups; deposits cargo at base
#[derive(Debug, Clone)]
pub struct LootSystem {
    config: LootConfig,
    base_position: Vec3,
    base_radius: f32,
    time: f32,
    last_full_notice: Option<f32>,
    collected: u64,
}

impl LootSystem {
    /// Create a loot system
    pub fn new(config: &LootConfig, layout: &WorldConfig) -> Self {
        Self {
            config: config.clone(),
            base_position: layout.base_position,
            base_radius: layout.base_radius,
            time: 0.0,
            last_full_notice: None,
            collected: 0,
        }
    }

    /// Pickups collected so far
    pub fn collected_count(&self) -> u64 {
        self.collected
    }

    /// Simulation seconds seen by the float animation
    pub fn elapsed(&self) -> f32 {
        self.time
    }

    /// Scale of a pickup `distance` away from the player
    fn consume_scale(&self, base_scale: f32, distance: f32) -> f32 {
        if distance >= self.config.consume_range || self.config.consume_range <= 0.0 {
            return base_scale;
        }
        let t = (distance / self.config.consume_range).clamp(0.0, 1.0);
        base_scale * utils::lerp(self.config.min_consume_scale, 1.0, t)
    }

    /// Advance one pickup; returns its distance to the player
    fn animate(&self, world: &mut World, entity: Entity, player: Option<Vec3>, step_scale: f32) -> Option<f32> {
        let mut motion = *world.loot_motion.get(entity)?;
        let velocity = world.velocity.get_mut(entity)?;
        let transform = world.transform.get_mut(entity)?;

        // Step 1: drift moves the anchor, then damps
        transform.position.x += velocity.x * step_scale;
        transform.position.z += velocity.z * step_scale;
        motion.float_base_y += velocity.y * step_scale;
        *velocity *= utils::damping(self.config.drag, step_scale);

        // Step 2: absolute float and spin
        transform.position.y = motion.float_base_y
            + self.config.float_amplitude * (self.config.float_frequency * self.time + motion.drift_offset).sin();
        transform.rotation += motion.rotation_speed * step_scale;

        // Step 3: magnet and consume shrink
        let distance = player.map(|target| {
            let offset = target - transform.position;
            let distance = offset.norm();
            if distance < self.config.magnet_range && distance > f32::EPSILON {
                let falloff = 1.0 - distance / self.config.magnet_range;
                *velocity += offset / distance * (self.config.magnet_strength * falloff * step_scale);
            }
            distance
        });
        let scale = distance.map_or(motion.base_scale, |d| self.consume_scale(motion.base_scale, d));
        transform.scale = Vec3::repeat(scale);

        if let Some(stored) = world.loot_motion.get_mut(entity) {
            *stored = motion;
        }
        distance
    }

    /// One loot tick
    pub fn update<R: RenderBackend, E: GameEvents, V>(
        &mut self,
        ctx: &mut TickContext<'_, R, E, V>,
        spawn: &mut SpawnSystem,
        player: Entity,
        dt: f32,
        step_scale: f32,
    ) {
        self.time += dt;
        let player_position = ctx.world.position(player);
        let mut pickups: Vec<(Entity, Vec3, LootKind)> = Vec::new();

        for entity in ctx.world.loot_entities() {
            let distance = self.animate(ctx.world, entity, player_position, step_scale);

            if let (Some(handle), Some(transform)) = (ctx.registry.get(entity), ctx.world.transform.get(entity)) {
                ctx.renderer.set_pose(handle, &Pose::from(transform));
            }

            if distance.map_or(true, |d| d > self.config.collect_range) {
                continue;
            }
            let Some(loot) = ctx.world.loot.get(entity).copied() else {
                continue;
            };
            if ctx.stats.store(loot.value) {
                let position = ctx.world.position(entity).unwrap_or_else(Vec3::zeros);
                pickups.push((entity, position, loot.kind));
            } else if self
                .last_full_notice
                .map_or(true, |last| self.time - last >= self.config.full_notice_interval)
            {
                self.last_full_notice = Some(self.time);
                ctx.events.show_message("Storage full");
            }
        }

        for (entity, position, kind) in &pickups {
            spawn.despawn_loot(ctx.world, ctx.registry, ctx.renderer, *entity);
            ctx.events.play_pickup(*position, *kind);
            self.collected += 1;
        }
        if !pickups.is_empty() {
            log::debug!("Collected {} pickups, hold {}/{}", pickups.len(), ctx.stats.storage, ctx.stats.max_storage);
            ctx.events.stats_changed(*ctx.stats);
        }

        // Home base deposit
        if let Some(position) = player_position {
            let docked = (position - self.base_position).norm() <= self.base_radius;
            if docked && ctx.stats.storage > 0 && !ctx.stats.paused {
                let units = ctx.stats.storage;
                let credits = ctx.stats.deposit();
                ctx.stats.paused = true;
                log::info!("Deposited {} units for {} credits", units, credits);
                ctx.events.show_message(&format!("Deposited {units} units for {credits:.0} credits"));
                ctx.events.stats_changed(*ctx.stats);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Loot;
    use crate::components::Transform;
    use crate::config::GameConfig;
    use crate::hooks::{EventLog, GameEvent};
    use crate::render::{HeadlessRenderer, Registry};
    use crate::state::ShipStats;
    use crate::voxel::VoxelStore;

    const DT: f32 = 1.0 / 60.0;

    struct Fixture {
        world: World,
        registry: Registry,
        renderer: HeadlessRenderer,
        events: EventLog,
        voxels: VoxelStore,
        stats: ShipStats,
        spawn: SpawnSystem,
        loot: LootSystem,
        player: Entity,
    }

    impl Fixture {
        fn new(player_at: Vec3) -> Self {
            let config = GameConfig::default();
            let mut world = World::new();
            let player = world.create_entity();
            world.transform.insert(player, Transform::from_position(player_at));
            Self {
                world,
                registry: Registry::new(),
                renderer: HeadlessRenderer::new(),
                events: EventLog::new(),
                voxels: VoxelStore::new(),
                stats: ShipStats::from_loadout(&config.loadout, 0),
                spawn: SpawnSystem::new(&config.loot, &config.world, 11),
                loot: LootSystem::new(&config.loot, &config.world),
                player,
            }
        }

        fn drop_gem(&mut self, position: Vec3, velocity: Vec3) -> Entity {
            let loot = Loot {
                kind: LootKind::Gem,
                value: 2.0,
            };
            self.spawn
                .spawn_loot(&mut self.world, &mut self.registry, &mut self.renderer, loot, position, velocity)
        }

        fn tick(&mut self) {
            let mut ctx = TickContext {
                world: &mut self.world,
                registry: &mut self.registry,
                renderer: &mut self.renderer,
                events: &mut self.events,
                voxels: &mut self.voxels,
                stats: &mut self.stats,
            };
            self.loot.update(&mut ctx, &mut self.spawn, self.player, DT, 1.0);
        }
    }

    #[test]
    fn test_collect_under_capacity() {
        let mut f = Fixture::new(Vec3::new(0.0, 0.0, 300.0));
        let gem = f.drop_gem(Vec3::new(0.0, 0.0, 300.5), Vec3::zeros());
        f.tick();
        assert!(!f.world.contains(gem));
        assert!(!f.registry.is_bound(gem));
        assert_eq!(f.stats.storage, 1);
        assert_eq!(f.stats.credits, 2.0);
        assert_eq!(f.events.count(|e| matches!(e, GameEvent::Pickup { .. })), 1);
    }

    #[test]
    fn test_full_hold_leaves_loot() {
        let mut f = Fixture::new(Vec3::new(0.0, 0.0, 300.0));
        f.stats.storage = f.stats.max_storage;
        let gem = f.drop_gem(Vec3::new(0.0, 0.0, 300.5), Vec3::zeros());
        for _ in 0..30 {
            f.tick();
        }
        assert!(f.world.contains(gem));
        assert_eq!(f.stats.storage, f.stats.max_storage);
        // Half a second of ticks, one notice
        assert_eq!(f.events.messages().filter(|m| *m == "Storage full").count(), 1);
    }

    #[test]
    fn test_magnet_pulls_toward_player() {
        let mut f = Fixture::new(Vec3::new(0.0, 0.0, 300.0));
        let gem = f.drop_gem(Vec3::new(10.0, 0.0, 300.0), Vec3::zeros());
        let before = f.world.position(gem).unwrap().x;
        for _ in 0..10 {
            f.tick();
        }
        assert!(f.world.position(gem).unwrap().x < before);
        assert!(f.world.velocity.get(gem).unwrap().x < 0.0);
    }

    #[test]
    fn test_pickup_shrinks_when_close() {
        let f = Fixture::new(Vec3::zeros());
        let base = 1.0;
        assert_eq!(f.loot.consume_scale(base, 10.0), base);
        assert!(f.loot.consume_scale(base, 2.5) < base);
        assert_eq!(f.loot.consume_scale(base, 0.0), LootConfig::default().min_consume_scale);
    }

    #[test]
    fn test_deposit_at_base_pauses() {
        let base = WorldConfig::default().base_position;
        let mut f = Fixture::new(base);
        f.stats.store(7.0);
        f.tick();
        assert!(f.stats.paused);
        assert_eq!(f.stats.storage, 0);
        assert_eq!(f.stats.banked_credits, 7.0);
        assert!(f.events.messages().any(|m| m.starts_with("Deposited")));

        // Nothing more to deposit
        f.stats.paused = false;
        f.tick();
        assert!(!f.stats.paused);
    }
}
