//! Spatial partitioning for enemy broadphase queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of enemies in nearby cells, rather than O(n) for brute force. Every query
//! returns entries ordered by (distance, entity) so results never depend on
//! hash map iteration order.

use crate::components::*;
use bevy_ecs::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Grid-based spatial partitioning of live enemies.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to the enemies in that cell.
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, (i32, i32)>,
    /// Largest collision radius currently stored, used to widen overlap queries.
    max_radius: f32,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl SpatialEntry {
    #[inline]
    fn dist_sq(&self, x: f32, y: f32) -> f32 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            64.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
            max_radius: 0.0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
        self.max_radius = 0.0;
    }

    /// Insert an entity at a position, moving it if already present.
    pub fn insert(&mut self, entity: Entity, x: f32, y: f32, radius: f32) {
        if !x.is_finite() || !y.is_finite() {
            self.remove(entity);
            return;
        }
        let cell = self.world_to_cell(x, y);

        if let Some(old_cell) = self.entity_cells.get(&entity).copied() {
            if let Some(entries) = self.cells.get_mut(&old_cell) {
                entries.retain(|e| e.entity != entity);
            }
        }

        let radius = finite_or(radius, 0.0).max(0.0);
        self.max_radius = self.max_radius.max(radius);
        self.cells.entry(cell).or_default().push(SpatialEntry { entity, x, y, radius });
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the grid.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| e.entity != entity);
            }
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_cells.contains_key(&entity)
    }

    /// All entries whose center lies within `radius` of a point, closest first.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        if !radius.is_finite() {
            return self.sorted(self.all_entries().collect(), x, y);
        }
        if radius < 0.0 {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let results = self
            .cells_around(x, y, radius)
            .into_iter()
            .filter(|entry| entry.dist_sq(x, y) <= radius_sq)
            .collect();
        self.sorted(results, x, y)
    }

    /// All entries whose disc strictly overlaps the disc at `(x, y)` with `radius`.
    pub fn query_overlapping(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let radius = finite_or(radius, 0.0).max(0.0);
        let results = self
            .cells_around(x, y, radius + self.max_radius)
            .into_iter()
            .filter(|entry| entry.dist_sq(x, y).sqrt() < radius + entry.radius)
            .collect();
        self.sorted(results, x, y)
    }

    /// Closest entry within `max_radius` accepted by `filter`.
    pub fn nearest(
        &self,
        x: f32,
        y: f32,
        max_radius: f32,
        mut filter: impl FnMut(&SpatialEntry) -> bool,
    ) -> Option<SpatialEntry> {
        self.query_radius(x, y, max_radius)
            .into_iter()
            .find(|entry| filter(entry))
    }

    /// Get total entity count.
    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }

    fn all_entries(&self) -> impl Iterator<Item = SpatialEntry> + '_ {
        self.cells.values().flatten().copied()
    }

    /// Candidates from every cell within `radius`. A window wider than the
    /// number of occupied cells scans the occupied cells instead.
    fn cells_around(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let reach = ((radius / self.cell_size).ceil() as i32).saturating_add(1);
        let span = 2 * reach as i64 + 1;
        if span.saturating_mul(span) > self.cells.len() as i64 {
            return self.all_entries().collect();
        }
        let center = self.world_to_cell(x, y);
        (-reach..=reach)
            .flat_map(|dx| {
                (-reach..=reach)
                    .map(move |dy| (center.0.saturating_add(dx), center.1.saturating_add(dy)))
            })
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .collect()
    }

    fn sorted(&self, mut results: Vec<SpatialEntry>, x: f32, y: f32) -> Vec<SpatialEntry> {
        results.sort_by(|a, b| {
            a.dist_sq(x, y)
                .partial_cmp(&b.dist_sq(x, y))
                .unwrap_or(Ordering::Equal)
                .then(a.entity.cmp(&b.entity))
        });
        results
    }
}

/// System that rebuilds the spatial grid from live enemies.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<
        (Entity, &Position, &Health, Option<&Footprint>, Option<&CollisionRadius>),
        With<Enemy>,
    >,
) {
    grid.clear();

    for (entity, pos, health, footprint, radius) in query.iter() {
        if !health.is_alive() {
            continue;
        }
        grid.insert(entity, pos.x, pos.y, collision_radius(footprint, radius));
    }
}
