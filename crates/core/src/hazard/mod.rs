//! Flood hazard field
//!
//! The flood is a stochastic cellular spread: every tick each flooded cell tries to
//! flood each non-wall Moore neighbour with probability `intensity`. Attempts are
//! made against the field as it stood at the start of the tick, so cells flooded
//! this tick only start spreading next tick. The field never shrinks.

use crate::core_types::Coord;
use crate::error::{EvacError, Result};
use crate::grid::Grid;
use rand::Rng;
use rustc_hash::FxHashSet;

/// Set of flooded cells
///
/// Stored twice: a row-major mask for O(1) lookups and an insertion-ordered list so
/// spread attempts happen in a reproducible order for a given RNG seed.
#[derive(Debug, Clone)]
pub struct HazardField {
    mask: Vec<bool>,
    cells: Vec<Coord>,
    cols: usize,
}

impl HazardField {
    /// Create an empty field sized for the grid
    #[must_use]
    pub fn new(grid: &Grid) -> Self {
        Self {
            mask: vec![false; grid.len()],
            cells: Vec::new(),
            cols: grid.cols(),
        }
    }

    /// Whether a cell is flooded
    #[inline]
    #[must_use]
    pub fn is_flooded(&self, coord: Coord) -> bool {
        coord.col < self.cols
            && self
                .mask
                .get(coord.row * self.cols + coord.col)
                .copied()
                .unwrap_or(false)
    }

    /// Flooded cells in the order they flooded
    #[must_use]
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// Number of flooded cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing is flooded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flood a single cell outside of the spread rule
    ///
    /// Returns `Ok(true)` when the cell was newly flooded, `Ok(false)` when it was
    /// already under water. Walls are rejected since the flood never enters them.
    pub fn seed(&mut self, grid: &Grid, coord: Coord) -> Result<bool> {
        let terrain = grid.cell_at(coord)?;
        if terrain.blocks_hazard() {
            return Err(EvacError::config(
                "hazard",
                format!("cannot flood wall cell {coord}"),
            ));
        }
        Ok(self.insert(grid, coord))
    }

    /// Advance the flood one tick
    ///
    /// Every cell flooded at the start of the call independently attempts each
    /// non-wall, non-flooded neighbour with probability `intensity`. A neighbour
    /// shared by several flooded cells gets one attempt per flooded cell.
    ///
    /// # Returns
    ///
    /// Newly flooded cells, in the order they flooded
    pub fn spread<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        intensity: f64,
        rng: &mut R,
    ) -> Vec<Coord> {
        let intensity = intensity.clamp(0.0, 1.0);
        let frontier_len = self.cells.len();
        let mut newly = Vec::new();
        let mut claimed: FxHashSet<Coord> = FxHashSet::default();

        // Only cells present at tick start spread; `self.mask` is untouched until the end
        for i in 0..frontier_len {
            let source = self.cells[i];
            for neighbor in grid.neighbors_of(source) {
                if grid.terrain(neighbor).blocks_hazard()
                    || self.mask[grid.index(neighbor)]
                    || claimed.contains(&neighbor)
                {
                    continue;
                }
                if rng.random_bool(intensity) {
                    claimed.insert(neighbor);
                    newly.push(neighbor);
                }
            }
        }

        for &coord in &newly {
            self.insert(grid, coord);
        }
        newly
    }

    fn insert(&mut self, grid: &Grid, coord: Coord) -> bool {
        let idx = grid.index(coord);
        if self.mask[idx] {
            return false;
        }
        self.mask[idx] = true;
        self.cells.push(coord);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Terrain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_full_intensity_floods_all_neighbors() {
        let grid = Grid::new(7, 7);
        let mut field = HazardField::new(&grid);
        field.seed(&grid, Coord::new(3, 3)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let newly = field.spread(&grid, 1.0, &mut rng);
        assert_eq!(newly.len(), 8);
        assert_eq!(field.len(), 9);
        for n in grid.neighbors_of(Coord::new(3, 3)) {
            assert!(field.is_flooded(n));
        }
        // Second ring is untouched: newly flooded cells do not spread within the tick
        assert!(!field.is_flooded(Coord::new(1, 1)));
    }

    #[test]
    fn test_zero_intensity_never_spreads() {
        let grid = Grid::new(5, 5);
        let mut field = HazardField::new(&grid);
        field.seed(&grid, Coord::new(2, 2)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            assert!(field.spread(&grid, 0.0, &mut rng).is_empty());
        }
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_walls_block_spread() {
        let mut grid = Grid::new(3, 3);
        for col in 0..3 {
            grid = grid.with_terrain(Coord::new(1, col), Terrain::Wall).unwrap();
        }
        let grid = grid.with_terrain(Coord::new(0, 0), Terrain::Furniture).unwrap();
        let mut field = HazardField::new(&grid);
        field.seed(&grid, Coord::new(0, 1)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5 {
            field.spread(&grid, 1.0, &mut rng);
        }
        // Furniture floods, walls and everything behind them stay dry
        assert!(field.is_flooded(Coord::new(0, 0)));
        assert!(field.is_flooded(Coord::new(0, 2)));
        for col in 0..3 {
            assert!(!field.is_flooded(Coord::new(1, col)));
            assert!(!field.is_flooded(Coord::new(2, col)));
        }
    }

    #[test]
    fn test_seed_rejects_walls_and_out_of_bounds() {
        let grid = Grid::new(2, 2).with_terrain(Coord::new(0, 0), Terrain::Wall).unwrap();
        let mut field = HazardField::new(&grid);
        assert!(field.seed(&grid, Coord::new(0, 0)).is_err());
        assert!(field.seed(&grid, Coord::new(5, 0)).is_err());
        assert!(field.seed(&grid, Coord::new(1, 1)).unwrap());
        assert!(!field.seed(&grid, Coord::new(1, 1)).unwrap());
    }

    #[test]
    fn test_spread_is_monotonic() {
        let grid = Grid::new(12, 12);
        let mut field = HazardField::new(&grid);
        field.seed(&grid, Coord::new(6, 6)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut previous: Vec<Coord> = field.cells().to_vec();
        for _ in 0..10 {
            field.spread(&grid, 0.3, &mut rng);
            assert!(previous.iter().all(|c| field.is_flooded(*c)));
            assert!(field.len() >= previous.len());
            previous = field.cells().to_vec();
        }
    }
}
