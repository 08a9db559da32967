//! Pooled particle effects
//!
//! Every short-lived visual (engine trail, sparks, fireballs, smoke, debris)
//! borrows a render handle from a per-kind [`ObjectPool`]. One update pass
//! integrates all live particles; a particle whose life runs out leaves the
//! live set and goes back to its pool in the same step, so a handle is never
//! both live and free.
//!
//! Hit highlights are also reverted here, by duration counted down in sim
//! time rather than by wall-clock timers.

use crate::config::VfxConfig;
use crate::render::{ParticleKind, Pose, RenderBackend, RenderHandle, RenderKind};
use nova_engine::foundation::math::{utils, Vec3};
use nova_engine::pool::{ObjectPool, PoolStats, Released};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    /// Key of a live particle
    pub struct ParticleKey;
}

/// One live particle
#[derive(Debug, Clone, Copy)]
struct Particle {
    kind: ParticleKind,
    handle: RenderHandle,
    position: Vec3,
    velocity: Vec3,
    life: f32,
    max_life: f32,
    start_scale: f32,
    end_scale: f32,
}

impl Particle {
    /// Progress through the particle's life in `[0, 1]`
    fn progress(&self) -> f32 {
        if self.max_life <= 0.0 {
            1.0
        } else {
            (1.0 - self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    fn pose(&self) -> Pose {
        Pose::at(self.position, utils::lerp(self.start_scale, self.end_scale, self.progress()))
    }
}

/// Parameters for a single emitted particle
#[derive(Debug, Clone, Copy)]
struct Emission {
    position: Vec3,
    velocity: Vec3,
    life: f32,
    start_scale: f32,
    end_scale: f32,
}

/// Particle pools, the live particle set and flash timers
#[derive(Debug)]
pub struct VfxSystem {
    config: VfxConfig,
    pools: HashMap<ParticleKind, ObjectPool<RenderHandle>>,
    live: SlotMap<ParticleKey, Particle>,
    flashes: HashMap<RenderHandle, f32>,
    trail_timer: f32,
    rng: StdRng,
}

impl VfxSystem {
    /// Create empty pools for every particle kind
    pub fn new(config: &VfxConfig, seed: u64) -> Self {
        let pools = ParticleKind::ALL
            .into_iter()
            .map(|kind| (kind, ObjectPool::new(pool_name(kind), config.pool_capacity)))
            .collect();
        Self {
            config: config.clone(),
            pools,
            live: SlotMap::with_key(),
            flashes: HashMap::new(),
            trail_timer: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of live particles
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of live particles of `kind`
    pub fn live_count_of(&self, kind: ParticleKind) -> usize {
        self.live.values().filter(|p| p.kind == kind).count()
    }

    /// Handles of live particles
    pub fn live_handles(&self) -> impl Iterator<Item = (ParticleKind, RenderHandle)> + '_ {
        self.live.values().map(|p| (p.kind, p.handle))
    }

    /// Free handles pooled for `kind`
    pub fn pool(&self, kind: ParticleKind) -> Option<&ObjectPool<RenderHandle>> {
        self.pools.get(&kind)
    }

    /// Usage statistics of the `kind` pool
    pub fn pool_stats(&self, kind: ParticleKind) -> PoolStats {
        self.pools.get(&kind).map(ObjectPool::stats).unwrap_or_default()
    }

    /// Whether a flash highlight is pending revert on `handle`
    pub fn is_flashing(&self, handle: RenderHandle) -> bool {
        self.flashes.contains_key(&handle)
    }

    /// Highlight `handle` for `secs` of simulation time
    pub fn flash<R: RenderBackend>(&mut self, renderer: &mut R, handle: RenderHandle, secs: f32) {
        renderer.set_flash(handle, true);
        self.flashes.insert(handle, secs.max(0.0));
    }

    /// Forget a pending flash revert; used when the handle is about to be destroyed
    pub fn cancel_flash(&mut self, handle: RenderHandle) {
        self.flashes.remove(&handle);
    }

    fn emit<R: RenderBackend>(&mut self, renderer: &mut R, kind: ParticleKind, emission: Emission) -> ParticleKey {
        let mut fresh = false;
        let handle = match self.pools.get_mut(&kind) {
            Some(pool) => pool.acquire_or_else(|| {
                fresh = true;
                renderer.create(RenderKind::Particle(kind))
            }),
            None => {
                fresh = true;
                renderer.create(RenderKind::Particle(kind))
            }
        };
        if !fresh {
            renderer.reset(handle);
        }
        renderer.set_visible(handle, true);

        let particle = Particle {
            kind,
            handle,
            position: emission.position,
            velocity: emission.velocity,
            life: emission.life,
            max_life: emission.life,
            start_scale: emission.start_scale,
            end_scale: emission.end_scale,
        };
        renderer.set_pose(handle, &particle.pose());
        renderer.set_opacity(handle, 1.0);
        self.live.insert(particle)
    }

    fn random_direction(&mut self) -> Vec3 {
        loop {
            let candidate = Vec3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            let length_sq = candidate.norm_squared();
            if length_sq > 1e-4 && length_sq <= 1.0 {
                return candidate / length_sq.sqrt();
            }
        }
    }

    /// Sparks at a projectile impact
    pub fn spawn_sparks<R: RenderBackend>(&mut self, renderer: &mut R, position: Vec3) {
        for _ in 0..self.config.spark_count {
            let velocity = self.random_direction() * self.config.spark_speed;
            self.emit(
                renderer,
                ParticleKind::Spark,
                Emission {
                    position,
                    velocity,
                    life: self.config.spark_life,
                    start_scale: 0.3,
                    end_scale: 0.05,
                },
            );
        }
    }

    /// Fireball, smoke and debris for a destroyed object of size `magnitude`
    pub fn spawn_explosion<R: RenderBackend>(&mut self, renderer: &mut R, position: Vec3, magnitude: f32) {
        let size = magnitude.max(0.1);
        self.emit(
            renderer,
            ParticleKind::Fireball,
            Emission {
                position,
                velocity: Vec3::zeros(),
                life: self.config.fireball_life,
                start_scale: size * 0.5,
                end_scale: size * 1.6,
            },
        );
        for _ in 0..self.config.smoke_count {
            let velocity = self.random_direction() * (self.config.spark_speed * 0.2);
            let offset = self.random_direction() * (size * 0.5);
            self.emit(
                renderer,
                ParticleKind::Smoke,
                Emission {
                    position: position + offset,
                    velocity,
                    life: self.config.smoke_life,
                    start_scale: size * 0.4,
                    end_scale: size * 1.2,
                },
            );
        }
        let debris: Vec<Vec3> = (0..self.config.debris_count)
            .map(|_| position + self.random_direction() * (size * 0.5))
            .collect();
        self.spawn_debris(renderer, position, &debris);
    }

    /// One debris cube per position, flung away from `center`
    pub fn spawn_debris<R: RenderBackend>(&mut self, renderer: &mut R, center: Vec3, positions: &[Vec3]) {
        for position in positions {
            let outward = (position - center)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(|| self.random_direction());
            self.emit(
                renderer,
                ParticleKind::Debris,
                Emission {
                    position: *position,
                    velocity: outward * self.config.debris_speed,
                    life: self.config.debris_life,
                    start_scale: 0.4,
                    end_scale: 0.1,
                },
            );
        }
    }

    /// Rate-limited engine trail behind a thrusting ship
    ///
    /// Emits at most one puff per tick; the timer resets while coasting.
    pub fn emit_trail<R: RenderBackend>(
        &mut self,
        renderer: &mut R,
        dt: f32,
        thrusting: bool,
        exhaust: Vec3,
        backward: Vec3,
    ) {
        if !thrusting {
            self.trail_timer = 0.0;
            return;
        }
        self.trail_timer += dt;
        if self.trail_timer < self.config.trail_interval {
            return;
        }
        self.trail_timer = (self.trail_timer - self.config.trail_interval).min(self.config.trail_interval);
        self.emit(
            renderer,
            ParticleKind::Trail,
            Emission {
                position: exhaust,
                velocity: backward * 0.05,
                life: self.config.trail_life,
                start_scale: 0.35,
                end_scale: 0.05,
            },
        );
    }

    /// Advance flashes and every live particle by one tick
    pub fn update<R: RenderBackend>(&mut self, renderer: &mut R, dt: f32, step_scale: f32) {
        // Step 1: revert expired flashes
        let mut reverted = Vec::new();
        for (handle, remaining) in &mut self.flashes {
            *remaining -= dt;
            if *remaining <= 0.0 {
                reverted.push(*handle);
            }
        }
        for handle in reverted {
            self.flashes.remove(&handle);
            renderer.set_flash(handle, false);
        }

        // Step 2: integrate particles, collecting the expired ones
        let drag = utils::damping(self.config.particle_drag, step_scale);
        let mut expired = Vec::new();
        for (key, particle) in &mut self.live {
            particle.life -= dt;
            if particle.life <= 0.0 {
                expired.push(key);
                continue;
            }
            particle.position += particle.velocity * step_scale;
            particle.velocity *= drag;
            renderer.set_pose(particle.handle, &particle.pose());
            renderer.set_opacity(particle.handle, 1.0 - particle.progress());
        }

        // Step 3: expired particles return to their pools
        for key in expired {
            if let Some(particle) = self.live.remove(key) {
                self.recycle(renderer, particle.kind, particle.handle);
            }
        }
    }

    fn recycle<R: RenderBackend>(&mut self, renderer: &mut R, kind: ParticleKind, handle: RenderHandle) {
        renderer.set_visible(handle, false);
        let released = match self.pools.get_mut(&kind) {
            Some(pool) => pool.release(handle),
            None => Released::Discarded(handle),
        };
        if let Released::Discarded(handle) = released {
            renderer.destroy(handle);
        }
    }
}

fn pool_name(kind: ParticleKind) -> &'static str {
    match kind {
        ParticleKind::Trail => "trail",
        ParticleKind::Smoke => "smoke",
        ParticleKind::Spark => "spark",
        ParticleKind::Fireball => "fireball",
        ParticleKind::Debris => "debris",
    }
}
