//! Render collaborator boundary
//!
//! The simulation writes poses and presentation flags into opaque renderer
//! handles and never reads visual state back. [`RenderBackend`] is the seam;
//! [`HeadlessRenderer`] is an in-memory implementation used by tests and the
//! headless runner.

use crate::components::{LootKind, ObjectKind, Transform};
use crate::systems::camera::Camera;
use nova_engine::ecs::RenderRegistry;
use nova_engine::foundation::math::{utils, Quat, Vec3};
use std::collections::HashMap;

/// Opaque handle to a renderable owned by the render collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderHandle(pub u64);

/// Short-lived particle kinds driven by the VFX pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Engine exhaust puff
    Trail,
    /// Lingering explosion smoke
    Smoke,
    /// Hit spark
    Spark,
    /// Explosion core
    Fireball,
    /// Structural debris cube
    Debris,
}

impl ParticleKind {
    /// Every particle kind, for pool setup
    pub const ALL: [Self; 5] = [Self::Trail, Self::Smoke, Self::Spark, Self::Fireball, Self::Debris];
}

/// What a renderable represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// Player ship
    Ship,
    /// Destructible object body
    Object(ObjectKind),
    /// Ring decoration around a planet
    PlanetRing,
    /// Collectible pickup
    Loot(LootKind),
    /// Projectile bolt
    Projectile,
    /// Ambient background mote
    Dust,
    /// Pooled particle
    Particle(ParticleKind),
}

/// Pose written into a renderable each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World-space position
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Scale
    pub scale: Vec3,
}

impl Pose {
    /// Pose at `position` with identity rotation and uniform `scale`
    pub fn at(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            scale: Vec3::repeat(scale),
        }
    }
}

impl From<&Transform> for Pose {
    fn from(transform: &Transform) -> Self {
        Self {
            position: transform.position,
            rotation: utils::quat_from_euler(&transform.rotation),
            scale: transform.scale,
        }
    }
}

/// Render-only data attached to an entity binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSlot {
    /// Kind the handle was created as
    pub kind: RenderKind,
    /// Whether the handle goes back to a pool on destruction
    pub pooled: bool,
    /// Child decorations released together with the entity
    pub decorations: Vec<RenderHandle>,
}

impl RenderSlot {
    /// Slot for a handle owned outright by its entity
    pub fn owned(kind: RenderKind) -> Self {
        Self {
            kind,
            pooled: false,
            decorations: Vec::new(),
        }
    }

    /// Slot for a handle borrowed from a pool
    pub fn pooled(kind: RenderKind) -> Self {
        Self {
            kind,
            pooled: true,
            decorations: Vec::new(),
        }
    }
}

/// Entity ↔ renderable index used by the game
pub type Registry = RenderRegistry<RenderHandle, RenderSlot>;

/// Render collaborator
///
/// All calls are fire-and-forget from the simulation's point of view.
pub trait RenderBackend {
    /// Create a renderable of `kind`
    fn create(&mut self, kind: RenderKind) -> RenderHandle;

    /// Destroy a renderable permanently
    fn destroy(&mut self, handle: RenderHandle);

    /// Restore default visual state on a reused pooled renderable
    fn reset(&mut self, handle: RenderHandle);

    /// Show or hide a renderable
    fn set_visible(&mut self, handle: RenderHandle, visible: bool);

    /// Write a pose
    fn set_pose(&mut self, handle: RenderHandle, pose: &Pose);

    /// Write an opacity in `[0, 1]`
    fn set_opacity(&mut self, handle: RenderHandle, opacity: f32);

    /// Toggle the hit highlight
    fn set_flash(&mut self, handle: RenderHandle, on: bool);

    /// Position the view
    fn set_camera(&mut self, camera: &Camera);
}

/// State recorded for one headless renderable
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessObject {
    /// Kind it was created as
    pub kind: RenderKind,
    /// Last pose written
    pub pose: Option<Pose>,
    /// Visibility flag
    pub visible: bool,
    /// Last opacity written
    pub opacity: f32,
    /// Hit highlight flag
    pub flash: bool,
}

/// In-memory renderer that records what the simulation wrote
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
    objects: HashMap<RenderHandle, HeadlessObject>,
    camera: Option<Camera>,
    created: u64,
    destroyed: u64,
}

impl HeadlessRenderer {
    /// Empty renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state of `handle`
    pub fn object(&self, handle: RenderHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    /// Number of renderables alive (visible or hidden)
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of visible renderables of `kind`
    pub fn visible_count(&self, kind: RenderKind) -> usize {
        self.objects
            .values()
            .filter(|object| object.visible && object.kind == kind)
            .count()
    }

    /// Total `create` calls
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Total `destroy` calls
    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    /// Last camera written
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }
}

impl RenderBackend for HeadlessRenderer {
    fn create(&mut self, kind: RenderKind) -> RenderHandle {
        self.next_handle += 1;
        self.created += 1;
        let handle = RenderHandle(self.next_handle);
        self.objects.insert(
            handle,
            HeadlessObject {
                kind,
                pose: None,
                visible: true,
                opacity: 1.0,
                flash: false,
            },
        );
        handle
    }

    fn destroy(&mut self, handle: RenderHandle) {
        if self.objects.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn reset(&mut self, handle: RenderHandle) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.pose = None;
            object.visible = true;
            object.opacity = 1.0;
            object.flash = false;
        }
    }

    fn set_visible(&mut self, handle: RenderHandle, visible: bool) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.visible = visible;
        }
    }

    fn set_pose(&mut self, handle: RenderHandle, pose: &Pose) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.pose = Some(*pose);
        }
    }

    fn set_opacity(&mut self, handle: RenderHandle, opacity: f32) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn set_flash(&mut self, handle: RenderHandle, on: bool) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.flash = on;
        }
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.camera = Some(camera.clone());
    }
}
