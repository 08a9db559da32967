//! Passive world motion and render sync
//!
//! Spins ambient bodies, writes every bound non-loot entity's pose into its
//! renderable, and keeps the ambient dust field wrapped around the player so
//! it never runs out.

use crate::config::WorldConfig;
use crate::render::{Pose, Registry, RenderBackend, RenderHandle, RenderKind};
use crate::world::World;
use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{utils, Vec3};
use rand::Rng;

/// One ambient dust mote
#[derive(Debug, Clone, Copy)]
struct Mote {
    handle: RenderHandle,
    position: Vec3,
}

/// Spin integration, pose sync and ambient wrap
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSystem {
    motes: Vec<Mote>,
    half_extent: f32,
}

impl EnvironmentSystem {
    /// Create an environment system with no ambient field
    pub fn new() -> Self {
        Self::default()
    }

    /// Scatter the ambient dust field around `center`
    pub fn spawn_ambient<R: RenderBackend>(
        &mut self,
        renderer: &mut R,
        rng: &mut impl Rng,
        center: Vec3,
        config: &WorldConfig,
    ) {
        self.half_extent = config.ambient_half_extent;
        let extent = config.ambient_half_extent.max(f32::EPSILON);
        for _ in 0..config.ambient_count {
            let offset = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            let handle = renderer.create(RenderKind::Dust);
            let position = center + offset;
            renderer.set_pose(handle, &Pose::at(position, 1.0));
            self.motes.push(Mote { handle, position });
        }
        log::debug!("Spawned {} ambient motes", self.motes.len());
    }

    /// Number of ambient motes
    pub fn ambient_count(&self) -> usize {
        self.motes.len()
    }

    /// Positions of the ambient motes
    pub fn ambient_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.motes.iter().map(|mote| mote.position)
    }

    /// Advance spin, sync render poses and wrap the ambient field
    pub fn update<R: RenderBackend>(
        &mut self,
        world: &mut World,
        registry: &Registry,
        renderer: &mut R,
        player: Entity,
        step_scale: f32,
    ) {
        // Step 1: spin
        for (entity, spin) in world.spin.iter() {
            if let Some(transform) = world.transform.get_mut(*entity) {
                transform.rotation += spin * step_scale;
            }
        }

        // Step 2: pose sync; loot writes its own pose
        for (entity, handle) in registry.iter() {
            let Some(binding) = registry.binding(entity) else {
                continue;
            };
            if matches!(binding.meta.kind, RenderKind::Loot(_)) {
                continue;
            }
            let Some(transform) = world.transform.get(entity) else {
                continue;
            };
            let mut pose = Pose::from(transform);
            if let Some(rotation) = world.rotation.get(entity) {
                pose.rotation = *rotation;
            }
            renderer.set_pose(handle, &pose);
            for decoration in &binding.meta.decorations {
                renderer.set_pose(*decoration, &pose);
            }
        }

        // Step 3: ambient wrap around the player
        let Some(center) = world.position(player) else {
            return;
        };
        for mote in &mut self.motes {
            let wrapped = Vec3::new(
                utils::wrap_around(mote.position.x, center.x, self.half_extent),
                utils::wrap_around(mote.position.y, center.y, self.half_extent),
                utils::wrap_around(mote.position.z, center.z, self.half_extent),
            );
            if wrapped != mote.position {
                mote.position = wrapped;
                renderer.set_pose(mote.handle, &Pose::at(wrapped, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LootKind, Transform};
    use crate::render::{HeadlessRenderer, RenderSlot};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spin_accumulates_rotation() {
        let mut world = World::new();
        let rock = world.create_entity();
        world.transform.insert(rock, Transform::default());
        world.spin.insert(rock, Vec3::new(0.0, 0.01, 0.0));
        let mut env = EnvironmentSystem::new();
        let mut renderer = HeadlessRenderer::new();
        for _ in 0..10 {
            env.update(&mut world, &Registry::new(), &mut renderer, rock, 1.0);
        }
        assert_relative_eq!(world.transform.get(rock).unwrap().rotation.y, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_pose_sync_skips_loot() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut renderer = HeadlessRenderer::new();

        let rock = world.create_entity();
        world.transform.insert(rock, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        let rock_handle = renderer.create(RenderKind::Dust);
        registry.bind(rock, rock_handle, RenderSlot::owned(RenderKind::Dust));

        let gem = world.create_entity();
        world.transform.insert(gem, Transform::from_position(Vec3::new(5.0, 5.0, 5.0)));
        let gem_handle = renderer.create(RenderKind::Loot(LootKind::Gem));
        registry.bind(gem, gem_handle, RenderSlot::pooled(RenderKind::Loot(LootKind::Gem)));

        EnvironmentSystem::new().update(&mut world, &registry, &mut renderer, rock, 1.0);
        let pose = renderer.object(rock_handle).unwrap().pose.unwrap();
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(renderer.object(gem_handle).unwrap().pose.is_none());
    }

    #[test]
    fn test_ambient_field_follows_player() {
        let mut world = World::new();
        let player = world.create_entity();
        world.transform.insert(player, Transform::default());
        let mut renderer = HeadlessRenderer::new();
        let mut rng = StdRng::seed_from_u64(7);
        let config = WorldConfig::default();

        let mut env = EnvironmentSystem::new();
        env.spawn_ambient(&mut renderer, &mut rng, Vec3::zeros(), &config);
        assert_eq!(env.ambient_count(), config.ambient_count);

        let far = Vec3::new(1_000.0, -400.0, 2_500.0);
        world.transform.insert(player, Transform::from_position(far));
        env.update(&mut world, &Registry::new(), &mut renderer, player, 1.0);
        for position in env.ambient_positions() {
            assert!((position - far).amax() <= config.ambient_half_extent);
        }
    }
}
