//! Uniform-grid spatial index over enemy positions.
//!
//! The grid is rebuilt exactly once per tick, after movement and before any
//! targeting or collision pass, so every read within a tick sees the same
//! snapshot. Queries return a superset: every entry whose cell overlaps the
//! bounding box of the query circle. Callers must still distance-check.

use breach_defence_core::{geometry::circle_rect_overlaps, Bounds, EnemyId};
use glam::Vec2;

const CELL_SIZE: f32 = 80.0;

/// Uniform grid mapping cells to the enemies whose centres fall inside them.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    origin: Vec2,
    columns: u32,
    rows: u32,
    cells: Vec<Vec<(EnemyId, Vec2)>>,
}

impl SpatialGrid {
    /// Creates an empty grid covering the provided bounds.
    #[must_use]
    pub(crate) fn new(bounds: Bounds) -> Self {
        let columns = (bounds.width() / CELL_SIZE).ceil().max(1.0) as u32;
        let rows = (bounds.height() / CELL_SIZE).ceil().max(1.0) as u32;
        let capacity = columns as usize * rows as usize;
        Self {
            origin: bounds.min(),
            columns,
            rows,
            cells: vec![Vec::new(); capacity],
        }
    }

    /// Replaces all indexed positions in O(n).
    pub(crate) fn rebuild(&mut self, entries: impl Iterator<Item = (EnemyId, Vec2)>) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for (id, position) in entries {
            let index = self.cell_index(position);
            self.cells[index].push((id, position));
        }
    }

    /// Pushes every indexed entry whose cell overlaps the query circle's
    /// bounding box. Entries arrive grouped by cell; callers needing a
    /// deterministic order sort by id.
    pub fn query(&self, center: Vec2, radius: f32, out: &mut Vec<(EnemyId, Vec2)>) {
        out.clear();
        let (min_col, min_row) = self.cell_coords(center - Vec2::splat(radius));
        let (max_col, max_row) = self.cell_coords(center + Vec2::splat(radius));

        for row in min_row..=max_row {
            for column in min_col..=max_col {
                let cell_min = self.origin
                    + Vec2::new(column as f32 * CELL_SIZE, row as f32 * CELL_SIZE);
                let cell_max = cell_min + Vec2::splat(CELL_SIZE);
                if !circle_rect_overlaps(center, radius, cell_min, cell_max) {
                    continue;
                }
                let index = row as usize * self.columns as usize + column as usize;
                out.extend_from_slice(&self.cells[index]);
            }
        }
    }

    fn cell_coords(&self, position: Vec2) -> (u32, u32) {
        let local = position - self.origin;
        let column = (local.x / CELL_SIZE).floor().max(0.0) as u32;
        let row = (local.y / CELL_SIZE).floor().max(0.0) as u32;
        (column.min(self.columns - 1), row.min(self.rows - 1))
    }

    fn cell_index(&self, position: Vec2) -> usize {
        let (column, row) = self.cell_coords(position);
        row as usize * self.columns as usize + column as usize
    }
}
