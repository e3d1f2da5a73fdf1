//! Sight model
//!
//! A cell is visible when it lies within the viewer's Chebyshev sight radius and
//! the Bresenham line between viewer and cell crosses no occluding cell. The
//! target itself may be occluding (a wall is seen, what lies behind it is not).
//! Everything here is a pure function of terrain, positions and the flood, so the
//! scheduler computes percepts for all humans in parallel.

use crate::agent::Mobility;
use crate::core_types::{Coord, HumanId};
use crate::grid::{Grid, Terrain};
use crate::hazard::HazardField;
use crate::simulation::snapshot::{HumanView, WorldSnapshot};

/// What one human observes at the start of a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Percept {
    /// The observer
    pub observer: Option<HumanId>,
    /// Visible cells, ascending
    pub cells: Vec<Coord>,
    /// Other active humans standing on or carried through visible cells, ascending
    pub agents: Vec<HumanId>,
    /// Visible flooded cells, ascending
    pub flooded: Vec<Coord>,
    /// Visible emergency exits, ascending
    pub exits: Vec<Coord>,
    /// A body or an incapacitated human is in view
    pub sees_casualty: bool,
}

impl Percept {
    /// Whether anything in view can trigger panic
    #[must_use]
    pub fn sees_threat(&self) -> bool {
        self.sees_casualty || !self.flooded.is_empty()
    }

    /// Whether a given human is in view
    #[must_use]
    pub fn sees(&self, id: HumanId) -> bool {
        self.agents.binary_search(&id).is_ok()
    }

    /// The visible flooded cell closest to `from`, lowest coordinate on ties
    #[must_use]
    pub fn nearest_flooded(&self, from: Coord) -> Option<Coord> {
        self.flooded
            .iter()
            .copied()
            .min_by_key(|c| (from.chebyshev(*c), *c))
    }
}

/// Cells strictly between `from` and `to` on the Bresenham line
fn line_between(from: Coord, to: Coord) -> Vec<Coord> {
    let (mut r, mut c) = (from.row as isize, from.col as isize);
    let (r1, c1) = (to.row as isize, to.col as isize);
    let dr = (r1 - r).abs();
    let dc = (c1 - c).abs();
    let sr = if r < r1 { 1 } else { -1 };
    let sc = if c < c1 { 1 } else { -1 };
    let mut err = dc - dr;
    let mut cells = Vec::with_capacity(dr.max(dc) as usize);

    while (r, c) != (r1, c1) {
        let e2 = 2 * err;
        if e2 > -dr {
            err -= dr;
            c += sc;
        }
        if e2 < dc {
            err += dc;
            r += sr;
        }
        if (r, c) != (r1, c1) {
            cells.push(Coord::new(r as usize, c as usize));
        }
    }
    cells
}

/// Whether `to` is visible from `from`, ignoring range
#[must_use]
pub fn has_line_of_sight(
    grid: &Grid,
    from: Coord,
    to: Coord,
    furniture_blocks_sight: bool,
) -> bool {
    line_between(from, to)
        .into_iter()
        .all(|c| !grid.terrain(c).blocks_sight(furniture_blocks_sight))
}

/// All cells visible from `origin` within `radius`, ascending
#[must_use]
pub fn visible_cells(
    grid: &Grid,
    origin: Coord,
    radius: usize,
    furniture_blocks_sight: bool,
) -> Vec<Coord> {
    let row_end = (origin.row + radius).min(grid.rows() - 1);
    let col_end = (origin.col + radius).min(grid.cols() - 1);
    let mut cells = Vec::new();
    for row in origin.row.saturating_sub(radius)..=row_end {
        for col in origin.col.saturating_sub(radius)..=col_end {
            let target = Coord::new(row, col);
            if has_line_of_sight(grid, origin, target, furniture_blocks_sight) {
                cells.push(target);
            }
        }
    }
    cells
}

/// Active humans (other than the observer) within the given visible cells, ascending
#[must_use]
pub fn visible_agents(
    snapshot: &WorldSnapshot,
    visible: &[Coord],
    observer: HumanId,
) -> Vec<HumanId> {
    let mut agents: Vec<HumanId> = visible
        .iter()
        .flat_map(|c| snapshot.humans_at(*c))
        .filter(|id| *id != observer)
        .collect();
    agents.sort_unstable();
    agents
}

/// Build the full percept of one human from the tick snapshot
#[must_use]
pub fn perceive(
    grid: &Grid,
    hazard: &HazardField,
    snapshot: &WorldSnapshot,
    viewer: &HumanView,
    furniture_blocks_sight: bool,
) -> Percept {
    let cells = visible_cells(grid, viewer.position, viewer.sight_radius, furniture_blocks_sight);
    let agents = visible_agents(snapshot, &cells, viewer.id);
    let flooded: Vec<Coord> = cells.iter().copied().filter(|c| hazard.is_flooded(*c)).collect();
    let exits: Vec<Coord> = cells
        .iter()
        .copied()
        .filter(|c| grid.terrain(*c) == Terrain::EmergencyExit)
        .collect();
    let sees_casualty = cells.iter().any(|c| snapshot.has_body(*c))
        || agents
            .iter()
            .filter(|id| Some(**id) != viewer.carrying)
            .filter_map(|id| snapshot.view(*id))
            .any(|other| other.mobility == Mobility::Incapacitated);

    Percept {
        observer: Some(viewer.id),
        cells,
        agents,
        flooded,
        exits,
        sees_casualty,
    }
}
