//! Voxel-geometry collaborator boundary
//!
//! Destructible objects model their shape as a set of filled grid cells. The
//! occupancy lives with the collaborator that owns render geometry, never in
//! the [`World`](crate::world::World); the destruction system only mutates
//! occupancy and asks for mesh rebuilds through [`VoxelGeometry`].

use nova_engine::ecs::Entity;
use nova_engine::foundation::math::{IVec3, Vec3};
use std::collections::{HashMap, HashSet};

/// Occupancy of one voxel object in object-local space
///
/// Cell `c` spans `origin + c × voxel_size` to `origin + (c + 1) × voxel_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    cells: HashSet<IVec3>,
    resources: HashSet<IVec3>,
    voxel_size: f32,
    origin: Vec3,
    initial_count: usize,
}

impl VoxelGrid {
    /// Grid holding exactly `cells`
    pub fn from_cells(cells: impl IntoIterator<Item = IVec3>, voxel_size: f32, origin: Vec3) -> Self {
        let cells: HashSet<IVec3> = cells.into_iter().collect();
        Self {
            initial_count: cells.len(),
            cells,
            resources: HashSet::new(),
            voxel_size: voxel_size.max(f32::EPSILON),
            origin,
        }
    }

    /// Solid box of `dims` cells centered on the local origin
    pub fn filled_box(dims: IVec3, voxel_size: f32) -> Self {
        let mut cells = Vec::new();
        for x in 0..dims.x {
            for y in 0..dims.y {
                for z in 0..dims.z {
                    cells.push(IVec3::new(x, y, z));
                }
            }
        }
        let origin = -dims.map(|d| d as f32) * voxel_size * 0.5;
        Self::from_cells(cells, voxel_size, origin)
    }

    /// Ball of cells whose centers lie within `radius_cells` voxels of the local origin
    pub fn sphere(radius_cells: i32, voxel_size: f32) -> Self {
        let r = radius_cells.max(1);
        let limit = r as f32 * r as f32;
        let mut cells = Vec::new();
        for x in -r..r {
            for y in -r..r {
                for z in -r..r {
                    let center = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
                    if center.norm_squared() <= limit {
                        cells.push(IVec3::new(x, y, z));
                    }
                }
            }
        }
        Self::from_cells(cells, voxel_size, Vec3::zeros())
    }

    /// Mark `cells` as resource-bearing; cells not in the grid are ignored
    pub fn with_resources(mut self, cells: impl IntoIterator<Item = IVec3>) -> Self {
        for cell in cells {
            if self.cells.contains(&cell) {
                self.resources.insert(cell);
            }
        }
        self
    }

    /// Edge length of one cell in local units
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Cells filled when the grid was built
    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    /// Cells currently filled
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cell has been carved away
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `cell` is filled
    pub fn contains(&self, cell: &IVec3) -> bool {
        self.cells.contains(cell)
    }

    /// Whether `cell` is filled and carries a resource
    pub fn is_resource(&self, cell: &IVec3) -> bool {
        self.resources.contains(cell)
    }

    /// Number of resource cells left
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Iterate over filled cells
    pub fn cells(&self) -> impl Iterator<Item = &IVec3> {
        self.cells.iter()
    }

    /// Cell containing a local-space point
    pub fn cell_at(&self, local: &Vec3) -> IVec3 {
        let scaled = (local - self.origin) / self.voxel_size;
        IVec3::new(
            scaled.x.floor() as i32,
            scaled.y.floor() as i32,
            scaled.z.floor() as i32,
        )
    }

    /// Local-space center of `cell`
    pub fn cell_center(&self, cell: &IVec3) -> Vec3 {
        self.origin + (cell.map(|c| c as f32) + Vec3::repeat(0.5)) * self.voxel_size
    }

    /// Clear `cell`; returns whether it was a resource, or `None` if it was empty
    pub fn remove(&mut self, cell: &IVec3) -> Option<bool> {
        if !self.cells.remove(cell) {
            return None;
        }
        Some(self.resources.remove(cell))
    }
}

/// Owner of voxel occupancy and the mesh rebuild
pub trait VoxelGeometry {
    /// Take ownership of `entity`'s occupancy
    fn attach(&mut self, entity: Entity, grid: VoxelGrid);

    /// Occupancy of `entity`
    fn grid(&self, entity: Entity) -> Option<&VoxelGrid>;

    /// Mutable occupancy of `entity`
    fn grid_mut(&mut self, entity: Entity) -> Option<&mut VoxelGrid>;

    /// Rebuild the renderable surface from the current occupancy
    fn rebuild_mesh(&mut self, entity: Entity);

    /// Drop everything held for `entity`
    fn remove(&mut self, entity: Entity);
}

/// In-memory voxel collaborator that counts rebuilds
#[derive(Debug, Default)]
pub struct VoxelStore {
    grids: HashMap<Entity, VoxelGrid>,
    rebuilds: HashMap<Entity, u32>,
    total_rebuilds: u64,
}

impl VoxelStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds performed for `entity`
    pub fn rebuild_count(&self, entity: Entity) -> u32 {
        self.rebuilds.get(&entity).copied().unwrap_or(0)
    }

    /// Rebuilds performed for every entity
    pub fn total_rebuilds(&self) -> u64 {
        self.total_rebuilds
    }

    /// Number of objects with occupancy
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Whether no object has occupancy
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl VoxelGeometry for VoxelStore {
    fn attach(&mut self, entity: Entity, grid: VoxelGrid) {
        self.grids.insert(entity, grid);
    }

    fn grid(&self, entity: Entity) -> Option<&VoxelGrid> {
        self.grids.get(&entity)
    }

    fn grid_mut(&mut self, entity: Entity) -> Option<&mut VoxelGrid> {
        self.grids.get_mut(&entity)
    }

    fn rebuild_mesh(&mut self, entity: Entity) {
        if self.grids.contains_key(&entity) {
            *self.rebuilds.entry(entity).or_insert(0) += 1;
            self.total_rebuilds += 1;
        }
    }

    fn remove(&mut self, entity: Entity) {
        self.grids.remove(&entity);
        self.rebuilds.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_filled_box_is_centered() {
        let grid = VoxelGrid::filled_box(IVec3::new(4, 4, 4), 0.5);
        assert_eq!(grid.len(), 64);
        assert_eq!(grid.initial_count(), 64);
        assert_eq!(grid.cell_at(&Vec3::new(0.01, 0.01, 0.01)), IVec3::new(2, 2, 2));
        assert_eq!(grid.cell_at(&Vec3::new(-0.01, -0.01, -0.01)), IVec3::new(1, 1, 1));
        assert_relative_eq!(grid.cell_center(&IVec3::new(0, 0, 0)), Vec3::repeat(-0.75));
    }

    #[test]
    fn test_sphere_is_symmetric() {
        let grid = VoxelGrid::sphere(3, 1.0);
        assert!(grid.contains(&IVec3::new(0, 0, 0)));
        assert!(grid.contains(&IVec3::new(-1, -1, -1)));
        assert!(!grid.contains(&IVec3::new(-3, -3, -3)));
        assert_eq!(grid.len() % 8, 0);
    }

    #[test]
    fn test_remove_reports_resources() {
        let mut grid = VoxelGrid::filled_box(IVec3::new(2, 1, 1), 1.0)
            .with_resources([IVec3::new(1, 0, 0), IVec3::new(9, 9, 9)]);
        assert_eq!(grid.resource_count(), 1);
        assert_eq!(grid.remove(&IVec3::new(0, 0, 0)), Some(false));
        assert_eq!(grid.remove(&IVec3::new(1, 0, 0)), Some(true));
        assert_eq!(grid.remove(&IVec3::new(1, 0, 0)), None);
        assert!(grid.is_empty());
        assert_eq!(grid.initial_count(), 2);
    }

    #[test]
    fn test_store_counts_rebuilds() {
        let mut store = VoxelStore::new();
        let e = Entity::from_raw(1);
        store.rebuild_mesh(e);
        assert_eq!(store.total_rebuilds(), 0);
        store.attach(e, VoxelGrid::sphere(2, 1.0));
        store.rebuild_mesh(e);
        store.rebuild_mesh(e);
        assert_eq!(store.rebuild_count(e), 2);
        store.remove(e);
        assert!(store.grid(e).is_none());
        assert_eq!(store.rebuild_count(e), 0);
    }
}
