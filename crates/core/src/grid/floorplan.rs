//! Plain-text floorplan loader
//!
//! One grid row per line. Cells are either whitespace separated tokens
//! (`W W _ E`) or contiguous characters (`WW_E`).
//!
//! | Symbol     | Meaning                          |
//! |------------|----------------------------------|
//! | `W`        | Wall                             |
//! | `F`        | Furniture                        |
//! | `D`        | Door                             |
//! | `E`        | Emergency exit                   |
//! | `S`        | Empty floor with a spawn marker  |
//! | `_` or `.` | Empty floor                      |
//!
//! Blank lines are skipped.

use super::terrain::{Grid, Terrain};
use crate::core_types::Coord;
use crate::error::{EvacError, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// A parsed floorplan: the terrain grid plus fixed spawn markers
#[derive(Debug, Clone)]
pub struct Floorplan {
    /// Terrain grid with an empty occupancy layer
    pub grid: Grid,
    /// Fixed spawn cells in row-major order
    pub spawn_points: Vec<Coord>,
}

impl Floorplan {
    /// Read and parse a floorplan file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let plan: Self = text.parse()?;
        debug!(
            "Loaded floorplan {}: {}x{} cells, {} spawn markers",
            path.display(),
            plan.grid.rows(),
            plan.grid.cols(),
            plan.spawn_points.len()
        );
        Ok(plan)
    }

    /// Wrap a grid built in code; spawn markers are empty
    #[must_use]
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            spawn_points: Vec::new(),
        }
    }
}

impl FromStr for Floorplan {
    type Err = EvacError;

    fn from_str(text: &str) -> Result<Self> {
        let mut terrain = Vec::new();
        let mut spawn_points = Vec::new();
        let mut cols = None;
        let mut rows = 0;

        for (line_idx, line) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let symbols: Vec<char> = if trimmed.contains(char::is_whitespace) {
                trimmed
                    .split_whitespace()
                    .map(|token| {
                        let mut chars = token.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => Ok(c),
                            _ => Err(EvacError::floorplan(
                                line_no,
                                format!("cell token '{token}' must be a single symbol"),
                            )),
                        }
                    })
                    .collect::<Result<_>>()?
            } else {
                trimmed.chars().collect()
            };

            match cols {
                None => cols = Some(symbols.len()),
                Some(expected) if expected != symbols.len() => {
                    return Err(EvacError::floorplan(
                        line_no,
                        format!("row has {} cells, expected {expected}", symbols.len()),
                    ));
                }
                Some(_) => {}
            }

            for (col, symbol) in symbols.into_iter().enumerate() {
                let cell = match symbol.to_ascii_uppercase() {
                    'W' => Terrain::Wall,
                    'F' => Terrain::Furniture,
                    'D' => Terrain::Door,
                    'E' => Terrain::EmergencyExit,
                    'S' => {
                        spawn_points.push(Coord::new(rows, col));
                        Terrain::Empty
                    }
                    '_' | '.' => Terrain::Empty,
                    other => {
                        return Err(EvacError::floorplan(
                            line_no,
                            format!("unknown symbol '{other}' in column {}", col + 1),
                        ));
                    }
                };
                terrain.push(cell);
            }
            rows += 1;
        }

        let cols = cols.ok_or_else(|| EvacError::floorplan(0, "floorplan is empty"))?;
        let grid = Grid::from_terrain(rows, cols, terrain)?;
        Ok(Self { grid, spawn_points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_format() {
        let plan: Floorplan = "W W W W\nW S _ E\nW F D W\n".parse().unwrap();
        assert_eq!(plan.grid.rows(), 3);
        assert_eq!(plan.grid.cols(), 4);
        assert_eq!(plan.grid.terrain(Coord::new(1, 3)), Terrain::EmergencyExit);
        assert_eq!(plan.grid.terrain(Coord::new(2, 1)), Terrain::Furniture);
        assert_eq!(plan.grid.terrain(Coord::new(2, 2)), Terrain::Door);
        assert_eq!(plan.spawn_points, vec![Coord::new(1, 1)]);
    }

    #[test]
    fn test_parse_compact_format_skips_blank_lines() {
        let plan: Floorplan = "WWW\n\nS.E\nWWW\n".parse().unwrap();
        assert_eq!(plan.grid.rows(), 3);
        assert_eq!(plan.grid.exits(), vec![Coord::new(1, 2)]);
        assert_eq!(plan.grid.terrain(Coord::new(1, 1)), Terrain::Empty);
    }

    #[test]
    fn test_ragged_rows_report_line() {
        let err = "WWW\nW_\n".parse::<Floorplan>().unwrap_err();
        assert!(matches!(err, EvacError::Floorplan { line: 2, .. }));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = "W?W\n".parse::<Floorplan>().unwrap_err();
        assert!(matches!(err, EvacError::Floorplan { line: 1, .. }));
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!("\n  \n".parse::<Floorplan>().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Floorplan::load("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, EvacError::Io(_)));
    }
}
