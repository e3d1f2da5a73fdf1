//! Static building terrain and per-cell occupancy
//!
//! Terrain is fixed once the grid is built; only the occupancy layer changes, and
//! only through the scheduler's commit phase.

use crate::core_types::{Coord, HumanId};
use crate::error::{EvacError, Result};
use serde::{Deserialize, Serialize};

/// Moore neighbourhood offsets in ascending `(row, col)` order
static MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Terrain kind of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open floor
    #[default]
    Empty,
    /// Solid wall: blocks movement, sight and the flood
    Wall,
    /// Furniture: blocks movement, may block sight, floods
    Furniture,
    /// Door: passable, floods
    Door,
    /// Emergency exit: passable, reaching it means escape
    EmergencyExit,
}

impl Terrain {
    /// Whether a human can stand on or walk through this terrain
    #[inline]
    #[must_use]
    pub fn is_passable(self) -> bool {
        matches!(self, Self::Empty | Self::Door | Self::EmergencyExit)
    }

    /// Whether the flood can never enter this terrain
    #[inline]
    #[must_use]
    pub fn blocks_hazard(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Whether this terrain occludes cells behind it
    #[inline]
    #[must_use]
    pub fn blocks_sight(self, furniture_blocks_sight: bool) -> bool {
        match self {
            Self::Wall => true,
            Self::Furniture => furniture_blocks_sight,
            Self::Empty | Self::Door | Self::EmergencyExit => false,
        }
    }

    /// Floorplan symbol for this terrain
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Empty => '_',
            Self::Wall => 'W',
            Self::Furniture => 'F',
            Self::Door => 'D',
            Self::EmergencyExit => 'E',
        }
    }
}

/// Building grid: immutable terrain plus the standing-human occupancy layer
///
/// Cells are stored row-major (`row * cols + col`).
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    terrain: Vec<Terrain>,
    occupants: Vec<Option<HumanId>>,
}

impl Grid {
    /// Create an all-empty grid
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            terrain: vec![Terrain::Empty; rows * cols],
            occupants: vec![None; rows * cols],
        }
    }

    /// Create a grid from row-major terrain
    pub fn from_terrain(rows: usize, cols: usize, terrain: Vec<Terrain>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(EvacError::floorplan(0, "grid must have at least one row and column"));
        }
        if terrain.len() != rows * cols {
            return Err(EvacError::floorplan(
                0,
                format!("expected {} cells, got {}", rows * cols, terrain.len()),
            ));
        }
        Ok(Self {
            rows,
            cols,
            occupants: vec![None; terrain.len()],
            terrain,
        })
    }

    /// Builder-style terrain assignment, for constructing grids in code
    pub fn with_terrain(mut self, coord: Coord, terrain: Terrain) -> Result<Self> {
        let idx = self.checked_index(coord)?;
        self.terrain[idx] = terrain;
        Ok(self)
    }

    /// Grid height in cells
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid width in cells
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.terrain.len()
    }

    /// Whether the grid has no cells (never true for a constructed grid)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty()
    }

    /// Whether the coordinate lies inside the grid
    #[inline]
    #[must_use]
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Terrain at a coordinate, rejecting out-of-bounds access
    pub fn cell_at(&self, coord: Coord) -> Result<Terrain> {
        Ok(self.terrain[self.checked_index(coord)?])
    }

    /// Whether a human may enter the cell, rejecting out-of-bounds access
    pub fn is_passable(&self, coord: Coord) -> Result<bool> {
        self.cell_at(coord).map(Terrain::is_passable)
    }

    /// In-bounds Moore neighbours in ascending order, rejecting out-of-bounds origins
    pub fn neighbors(&self, coord: Coord) -> Result<Vec<Coord>> {
        self.checked_index(coord)?;
        Ok(self.neighbors_of(coord).collect())
    }

    /// Row-major index for a coordinate
    #[inline]
    #[must_use]
    pub fn index(&self, coord: Coord) -> usize {
        assert!(
            self.contains(coord),
            "coordinate {coord} outside {}x{} grid",
            self.rows,
            self.cols
        );
        coord.row * self.cols + coord.col
    }

    /// Coordinate for a row-major index
    #[inline]
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Coord {
        Coord::new(index / self.cols, index % self.cols)
    }

    /// Terrain at an already validated coordinate
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds; simulation logic only produces
    /// in-bounds coordinates, so this indicates a logic defect.
    #[inline]
    #[must_use]
    pub fn terrain(&self, coord: Coord) -> Terrain {
        self.terrain[self.index(coord)]
    }

    /// In-bounds Moore neighbours of a cell, ascending `(row, col)` order
    pub fn neighbors_of(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        MOORE_OFFSETS
            .iter()
            .filter_map(move |&(dr, dc)| coord.offset(dr, dc))
            .filter(move |c| self.contains(*c))
    }

    /// Every coordinate in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.len()).map(|i| self.coord_of(i))
    }

    /// All emergency exit cells in row-major order
    #[must_use]
    pub fn exits(&self) -> Vec<Coord> {
        self.coords()
            .filter(|c| self.terrain(*c) == Terrain::EmergencyExit)
            .collect()
    }

    /// The human standing on a cell, if any
    #[inline]
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<HumanId> {
        self.occupants[self.index(coord)]
    }

    /// Put a human on a free, passable cell
    pub(crate) fn place(&mut self, id: HumanId, coord: Coord) {
        let idx = self.index(coord);
        debug_assert!(self.terrain[idx].is_passable(), "{id} placed on {:?}", self.terrain[idx]);
        debug_assert!(self.occupants[idx].is_none(), "{id} placed on occupied {coord}");
        self.occupants[idx] = Some(id);
    }

    /// Clear a cell if the given human stands there
    pub(crate) fn vacate(&mut self, id: HumanId, coord: Coord) {
        let idx = self.index(coord);
        if self.occupants[idx] == Some(id) {
            self.occupants[idx] = None;
        }
    }

    fn checked_index(&self, coord: Coord) -> Result<usize> {
        if self.contains(coord) {
            Ok(coord.row * self.cols + coord.col)
        } else {
            Err(EvacError::OutOfBounds {
                coord,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passability_by_terrain() {
        assert!(Terrain::Empty.is_passable());
        assert!(Terrain::Door.is_passable());
        assert!(Terrain::EmergencyExit.is_passable());
        assert!(!Terrain::Wall.is_passable());
        assert!(!Terrain::Furniture.is_passable());
    }

    #[test]
    fn test_only_walls_block_hazard() {
        assert!(Terrain::Wall.blocks_hazard());
        assert!(!Terrain::Furniture.blocks_hazard());
        assert!(!Terrain::Door.blocks_hazard());
    }

    #[test]
    fn test_corner_has_three_neighbors() {
        let grid = Grid::new(5, 5);
        let n = grid.neighbors(Coord::new(0, 0)).unwrap();
        assert_eq!(n, vec![Coord::new(0, 1), Coord::new(1, 0), Coord::new(1, 1)]);
    }

    #[test]
    fn test_interior_has_eight_sorted_neighbors() {
        let grid = Grid::new(5, 5);
        let n = grid.neighbors(Coord::new(2, 2)).unwrap();
        assert_eq!(n.len(), 8);
        assert!(n.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let grid = Grid::new(3, 4);
        assert!(matches!(
            grid.cell_at(Coord::new(3, 0)),
            Err(EvacError::OutOfBounds { rows: 3, cols: 4, .. })
        ));
        assert!(grid.neighbors(Coord::new(0, 4)).is_err());
        assert!(grid.is_passable(Coord::new(9, 9)).is_err());
    }

    #[test]
    fn test_with_terrain_and_exits() {
        let grid = Grid::new(3, 3)
            .with_terrain(Coord::new(0, 1), Terrain::Wall)
            .unwrap()
            .with_terrain(Coord::new(2, 2), Terrain::EmergencyExit)
            .unwrap();
        assert_eq!(grid.cell_at(Coord::new(0, 1)).unwrap(), Terrain::Wall);
        assert!(!grid.is_passable(Coord::new(0, 1)).unwrap());
        assert_eq!(grid.exits(), vec![Coord::new(2, 2)]);
    }

    #[test]
    fn test_occupancy_place_and_vacate() {
        let mut grid = Grid::new(2, 2);
        let c = Coord::new(1, 1);
        grid.place(HumanId(7), c);
        assert_eq!(grid.occupant(c), Some(HumanId(7)));
        grid.vacate(HumanId(3), c);
        assert_eq!(grid.occupant(c), Some(HumanId(7)));
        grid.vacate(HumanId(7), c);
        assert_eq!(grid.occupant(c), None);
    }

    #[test]
    fn test_from_terrain_rejects_wrong_size() {
        assert!(Grid::from_terrain(2, 2, vec![Terrain::Empty; 3]).is_err());
        assert!(Grid::from_terrain(0, 2, Vec::new()).is_err());
    }
}
