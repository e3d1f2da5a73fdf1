//! Integer grid coordinates
//!
//! Coordinates order by `(row, col)`, which is the tie-break order used wherever
//! the simulation has to pick between equally good cells.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0 at the top)
    pub row: usize,
    /// Column index (0 at the left)
    pub col: usize,
}

impl Coord {
    /// Create a coordinate
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Chebyshev (king-move) distance, the metric of the Moore neighbourhood
    #[must_use]
    pub fn chebyshev(self, other: Coord) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Offset by a signed delta, `None` if either component underflows
    #[must_use]
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Coord> {
        Some(Coord {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }

    /// Whether the two coordinates are the same cell or Moore neighbours
    #[inline]
    #[must_use]
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.chebyshev(other) <= 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}
