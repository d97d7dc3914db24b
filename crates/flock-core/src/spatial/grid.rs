//! Uniform Spatial Grid
//!
//! Buckets entity indices by cell so neighbourhood queries touch only the 3x3
//! block of cells around a point instead of the whole population.
//!
//! Storage is flat: one `entries` array sorted by cell, plus `cell_starts`
//! offsets where cell `c` owns `entries[cell_starts[c]..cell_starts[c + 1]]`.
//! Rebuilding is a counting sort (count, prefix sum, scatter) that reuses the
//! same buffers every tick.

use crate::components::{Agent, Source};
use crate::error::ConfigError;

/// Upper bound on `cols x rows`; cell offsets are one `usize` per cell
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Anything with a position on the plane
pub trait Positioned {
    fn position(&self) -> (f32, f32);
}

impl Positioned for Agent {
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl Positioned for Source {
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl Positioned for (f32, f32) {
    fn position(&self) -> (f32, f32) {
        *self
    }
}

/// Validated grid geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    cell_size: f32,
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
}

impl GridSpec {
    /// `ceil(width / cell_size) x ceil(height / cell_size)` cells covering the region.
    pub fn new(cell_size: f32, width: f32, height: f32) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("grid_cell_size", cell_size),
            ("region_width", width),
            ("region_height", height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive {
                    field,
                    value: value as f64,
                });
            }
        }

        // Sized in f64 first: tiny cells would saturate a usize cast and overflow the product
        let cols = (width as f64 / cell_size as f64).ceil().max(1.0);
        let rows = (height as f64 / cell_size as f64).ceil().max(1.0);
        let cells = cols * rows;
        if cells > MAX_GRID_CELLS as f64 {
            return Err(ConfigError::GridTooLarge {
                cell_size: cell_size as f64,
                cells,
                max: MAX_GRID_CELLS,
            });
        }
        let (cols, rows) = (cols as usize, rows as usize);

        Ok(Self {
            cell_size,
            width,
            height,
            cols,
            rows,
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Cell `(col, row)` containing a point. Points outside the region
    /// (and NaN) are clamped onto the nearest edge cell.
    #[inline]
    pub fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        // Float-to-int casts saturate: negatives and NaN become 0
        let col = ((x / self.cell_size).floor() as usize).min(self.cols - 1);
        let row = ((y / self.cell_size).floor() as usize).min(self.rows - 1);
        (col, row)
    }

    #[inline]
    pub fn cell_index(&self, x: f32, y: f32) -> usize {
        let (col, row) = self.cell_coords(x, y);
        row * self.cols + col
    }
}

/// Spatial grid over one population. Rebuild every tick before querying.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    spec: GridSpec,
    /// `cell_count + 1` offsets into `entries`
    cell_starts: Vec<usize>,
    /// Entity indices, grouped by cell, ascending within a cell
    entries: Vec<usize>,
    /// Scatter cursor, reused between rebuilds
    cursor: Vec<usize>,
}

impl SpatialGrid {
    /// Create an empty grid
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            cell_starts: vec![0; spec.cell_count() + 1],
            entries: Vec::new(),
            cursor: Vec::with_capacity(spec.cell_count()),
        }
    }

    /// Build a grid over `entities`
    pub fn build<P: Positioned>(entities: &[P], spec: GridSpec) -> Self {
        let mut grid = Self::new(spec);
        grid.rebuild(entities);
        grid
    }

    /// O(n) rebuild from current positions, replacing all previous contents.
    pub fn rebuild<P: Positioned>(&mut self, entities: &[P]) {
        let cells = self.spec.cell_count();

        // Pass 1: count per cell, shifted by one so the prefix sum lands in place
        self.cell_starts.clear();
        self.cell_starts.resize(cells + 1, 0);
        for entity in entities {
            let (x, y) = entity.position();
            self.cell_starts[self.spec.cell_index(x, y) + 1] += 1;
        }

        // Prefix sum -> offsets
        for c in 0..cells {
            self.cell_starts[c + 1] += self.cell_starts[c];
        }

        // Pass 2: scatter
        self.cursor.clear();
        self.cursor.extend_from_slice(&self.cell_starts[..cells]);
        self.entries.clear();
        self.entries.resize(entities.len(), 0);
        for (idx, entity) in entities.iter().enumerate() {
            let (x, y) = entity.position();
            let cell = self.spec.cell_index(x, y);
            self.entries[self.cursor[cell]] = idx;
            self.cursor[cell] += 1;
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entities bucketed in a single cell
    pub fn cell_entries(&self, col: usize, row: usize) -> &[usize] {
        if col >= self.spec.cols || row >= self.spec.rows {
            return &[];
        }
        let cell = row * self.spec.cols + col;
        &self.entries[self.cell_starts[cell]..self.cell_starts[cell + 1]]
    }

    /// Number of cells holding at least one entity
    pub fn occupied_cells(&self) -> usize {
        self.cell_starts.windows(2).filter(|w| w[1] > w[0]).count()
    }

    /// Indices in the 3x3 block of cells around the cell containing `(x, y)`,
    /// clipped at the grid edges. Yields row by row; the cells of one row are
    /// adjacent in `entries`, so each row is a single slice.
    pub fn neighborhood(&self, x: f32, y: f32) -> impl Iterator<Item = usize> + '_ {
        let (col, row) = self.spec.cell_coords(x, y);
        let col_lo = col.saturating_sub(1);
        let col_hi = (col + 1).min(self.spec.cols - 1);
        let row_lo = row.saturating_sub(1);
        let row_hi = (row + 1).min(self.spec.rows - 1);
        let cols = self.spec.cols;

        (row_lo..=row_hi).flat_map(move |r| {
            let first = r * cols + col_lo;
            let last = r * cols + col_hi;
            self.entries[self.cell_starts[first]..self.cell_starts[last + 1]]
                .iter()
                .copied()
        })
    }

    /// Collect the 3x3 neighbourhood into `out`, clearing it first
    pub fn query_into(&self, x: f32, y: f32, out: &mut Vec<usize>) {
        out.clear();
        out.extend(self.neighborhood(x, y));
    }

    /// Allocating form of [`SpatialGrid::query_into`]
    pub fn query(&self, x: f32, y: f32) -> Vec<usize> {
        self.neighborhood(x, y).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_100() -> GridSpec {
        // 10 x 10 cells of 10 units
        GridSpec::new(10.0, 100.0, 100.0).unwrap()
    }

    #[test]
    fn test_grid_dimensions_round_up() {
        let spec = GridSpec::new(50.0, 820.0, 600.0).unwrap();
        assert_eq!(spec.cols(), 17);
        assert_eq!(spec.rows(), 12);
        assert_eq!(spec.cell_count(), 204);

        // Cell larger than the region still yields one cell
        let spec = GridSpec::new(500.0, 100.0, 100.0).unwrap();
        assert_eq!((spec.cols(), spec.rows()), (1, 1));
    }

    #[test]
    fn test_grid_spec_rejects_bad_geometry() {
        assert!(matches!(
            GridSpec::new(0.0, 100.0, 100.0),
            Err(ConfigError::NonPositive { field: "grid_cell_size", .. })
        ));
        assert!(matches!(
            GridSpec::new(10.0, -1.0, 100.0),
            Err(ConfigError::NonPositive { field: "region_width", .. })
        ));
        assert!(GridSpec::new(10.0, 100.0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_grid_spec_rejects_oversized_grid() {
        // Would saturate both dimensions to usize::MAX without the cap
        assert!(matches!(
            GridSpec::new(1e-20, 800.0, 600.0),
            Err(ConfigError::GridTooLarge { .. })
        ));

        // 80_000 x 60_000 cells: finite but far too many to allocate
        let err = GridSpec::new(0.01, 800.0, 600.0).unwrap_err();
        assert!(err.to_string().contains("grid_cell_size"));

        // 1024 x 1024 sits exactly on the cap
        let spec = GridSpec::new(1.0, 1024.0, 1024.0).unwrap();
        assert_eq!(spec.cell_count(), MAX_GRID_CELLS);
        assert!(GridSpec::new(1.0, 1025.0, 1024.0).is_err());
    }

    #[test]
    fn test_cell_coords_clamp_out_of_range() {
        let spec = spec_100();
        assert_eq!(spec.cell_coords(0.0, 0.0), (0, 0));
        assert_eq!(spec.cell_coords(15.0, 25.0), (1, 2));
        // Exactly on the far edge belongs to the last cell
        assert_eq!(spec.cell_coords(100.0, 100.0), (9, 9));
        assert_eq!(spec.cell_coords(-5.0, 250.0), (0, 9));
        assert_eq!(spec.cell_coords(f32::NAN, 5.0), (0, 0));
    }

    #[test]
    fn test_build_buckets_every_entity() {
        let positions: Vec<(f32, f32)> = vec![(5.0, 5.0), (15.0, 5.0), (6.0, 4.0), (95.0, 95.0), (120.0, -3.0)];
        let grid = SpatialGrid::build(&positions, spec_100());

        assert_eq!(grid.len(), 5);
        assert_eq!(grid.cell_entries(0, 0), &[0, 2]);
        assert_eq!(grid.cell_entries(1, 0), &[1]);
        assert_eq!(grid.cell_entries(9, 9), &[3]);
        // Out-of-range entity clamped into the edge cell
        assert_eq!(grid.cell_entries(9, 0), &[4]);
        assert_eq!(grid.occupied_cells(), 4);
        assert!(grid.cell_entries(10, 0).is_empty());
    }

    #[test]
    fn test_query_returns_3x3_neighbourhood() {
        let positions: Vec<(f32, f32)> = vec![
            (55.0, 55.0), // centre cell (5, 5)
            (45.0, 45.0), // (4, 4) diagonal neighbour
            (65.0, 55.0), // (6, 5)
            (75.0, 55.0), // (7, 5) two cells away
            (55.0, 35.0), // (5, 3) two cells away
        ];
        let grid = SpatialGrid::build(&positions, spec_100());

        let mut found = grid.query(52.0, 58.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_clips_at_edges() {
        let positions: Vec<(f32, f32)> = vec![(1.0, 1.0), (12.0, 12.0), (95.0, 5.0), (5.0, 95.0)];
        let grid = SpatialGrid::build(&positions, spec_100());

        let mut found = grid.query(0.0, 0.0);
        found.sort_unstable();
        // No wraparound onto the far columns or rows
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = SpatialGrid::build(&[(5.0f32, 5.0f32), (95.0, 95.0)], spec_100());
        assert_eq!(grid.query(5.0, 5.0), vec![0]);

        grid.rebuild(&[(95.0f32, 95.0f32), (94.0, 96.0), (5.0, 5.0)]);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.query(5.0, 5.0), vec![2]);
        assert_eq!(grid.query(95.0, 95.0), vec![0, 1]);

        let mut out = vec![99];
        grid.query_into(50.0, 50.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_grid_queries() {
        let grid = SpatialGrid::new(spec_100());
        assert!(grid.is_empty());
        assert_eq!(grid.query(50.0, 50.0), Vec::<usize>::new());
        assert_eq!(grid.occupied_cells(), 0);
    }
}
