//! The owned simulation state
//!
//! `World` holds the grid, the flood, the population, the carry table and the
//! bodies. Only the scheduler (and the staging helpers `spawn`/`flood`) mutate it.

use crate::agent::{DeadHuman, DeathCause, Human, SpawnSpec, Status};
use crate::collaboration::CarryTable;
use crate::core_types::{Coord, HumanId};
use crate::error::{EvacError, Result};
use crate::grid::Grid;
use crate::hazard::HazardField;
use pathfinding::prelude::bfs_reach;
use rand::Rng;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Humans affected when cells flood
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloodEffects {
    /// Humans who drowned
    pub deaths: Vec<HumanId>,
    /// Carried humans set down after their carrier drowned
    pub drops: Vec<HumanId>,
}

impl FloodEffects {
    pub(crate) fn merge(&mut self, other: FloodEffects) {
        self.deaths.extend(other.deaths);
        self.drops.extend(other.drops);
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    grid: Grid,
    hazard: HazardField,
    humans: Vec<Human>,
    carries: CarryTable,
    dead: Vec<DeadHuman>,
    tick: u64,
}

impl World {
    /// Empty world over a grid
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let hazard = HazardField::new(&grid);
        Self {
            grid,
            hazard,
            humans: Vec::new(),
            carries: CarryTable::default(),
            dead: Vec::new(),
            tick: 0,
        }
    }

    /// Building grid with occupancy
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Flooded cells
    #[must_use]
    pub fn hazard(&self) -> &HazardField {
        &self.hazard
    }

    /// Every human ever spawned, indexed by id
    #[must_use]
    pub fn humans(&self) -> &[Human] {
        &self.humans
    }

    /// Look up a human
    #[must_use]
    pub fn human(&self, id: HumanId) -> Option<&Human> {
        self.humans.get(id.index())
    }

    /// Humans still in the building
    pub fn active_humans(&self) -> impl Iterator<Item = &Human> + '_ {
        self.humans.iter().filter(|h| h.is_active())
    }

    /// Number of humans still in the building
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_humans().count()
    }

    /// Carry relations
    #[must_use]
    pub fn carries(&self) -> &CarryTable {
        &self.carries
    }

    /// Bodies, in order of death
    #[must_use]
    pub fn dead(&self) -> &[DeadHuman] {
        &self.dead
    }

    /// Ticks completed
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Place a new human
    ///
    /// The cell must be in bounds, passable, dry and free.
    pub fn spawn(&mut self, spec: SpawnSpec) -> Result<HumanId> {
        let terrain = self.grid.cell_at(spec.position)?;
        if !terrain.is_passable() {
            return Err(EvacError::config(
                "spawn",
                format!("cell {} is {terrain:?} and cannot hold a human", spec.position),
            ));
        }
        if self.grid.occupant(spec.position).is_some() {
            return Err(EvacError::config("spawn", format!("cell {} is occupied", spec.position)));
        }
        if self.hazard.is_flooded(spec.position) {
            return Err(EvacError::config("spawn", format!("cell {} is flooded", spec.position)));
        }
        if spec.sight_radius == 0 {
            return Err(EvacError::config("sight_radius", "must be at least 1"));
        }

        let id = HumanId(self.humans.len() as u32);
        let mut human = Human::new(id, spec.position, spec.sight_radius, spec.collaborates);
        human.set_mobility(spec.mobility);
        human.learn_exits(spec.knowledge);
        self.grid.place(id, spec.position);
        self.humans.push(human);
        Ok(id)
    }

    /// Flood a cell out of band, applying the same deaths and drops as spread
    pub fn flood(&mut self, coord: Coord) -> Result<FloodEffects> {
        if self.hazard.seed(&self.grid, coord)? {
            Ok(self.apply_flooding(&[coord]))
        } else {
            Ok(FloodEffects::default())
        }
    }

    /// Drown whoever stands on newly flooded cells
    pub(crate) fn apply_flooding(&mut self, cells: &[Coord]) -> FloodEffects {
        let mut effects = FloodEffects::default();
        for &cell in cells {
            if let Some(id) = self.grid.occupant(cell) {
                effects.merge(self.kill(id, DeathCause::Drowned, &FxHashSet::default()));
            }
        }
        effects
    }

    /// Nearest dry, passable, free cell reachable from `origin`
    ///
    /// Search is breadth first through passable terrain with neighbours in
    /// ascending order; `reserved` cells (claimed but not yet committed moves)
    /// are skipped.
    #[must_use]
    pub fn drop_cell(&self, origin: Coord, reserved: &FxHashSet<Coord>) -> Option<Coord> {
        let grid = &self.grid;
        bfs_reach(origin, |&cell| {
            grid.neighbors_of(cell)
                .filter(|&n| grid.terrain(n).is_passable())
                .collect::<Vec<_>>()
        })
        .find(|&cell| {
            grid.terrain(cell).is_passable()
                && !self.hazard.is_flooded(cell)
                && grid.occupant(cell).is_none()
                && !reserved.contains(&cell)
        })
    }

    /// Spread the flood one tick and drown whoever is caught
    pub(crate) fn spread_hazard<R: Rng + ?Sized>(
        &mut self,
        intensity: f64,
        rng: &mut R,
    ) -> (Vec<Coord>, FloodEffects) {
        let newly = self.hazard.spread(&self.grid, intensity, rng);
        let effects = self.apply_flooding(&newly);
        (newly, effects)
    }

    pub(crate) fn human_mut(&mut self, id: HumanId) -> &mut Human {
        &mut self.humans[id.index()]
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Mark a human dead and set down anyone it carried
    pub(crate) fn kill(
        &mut self,
        id: HumanId,
        cause: DeathCause,
        reserved: &FxHashSet<Coord>,
    ) -> FloodEffects {
        let mut effects = FloodEffects::default();
        if !self.humans[id.index()].is_active() {
            return effects;
        }
        let position = self.humans[id.index()].position();
        self.humans[id.index()].set_status(Status::Dead(cause));
        self.grid.vacate(id, position);
        self.dead.push(DeadHuman {
            id,
            position,
            cause,
            tick: self.tick,
        });
        trace!("{id} {cause} at {position}");
        effects.deaths.push(id);

        if let Some(carried) = self.carries.release(id) {
            if self.set_down(carried, position, reserved) {
                effects.drops.push(carried);
            } else {
                // Nowhere dry to go: the passenger stays in the flooded cell
                effects.merge(self.kill(carried, cause, reserved));
            }
        }
        effects
    }

    /// Release the passenger of a carrier that can no longer carry
    ///
    /// Returns the passenger and where it was set down, or `None` (with the carry
    /// left intact) if there is no free cell to put it on. A passenger still
    /// standing in its own cell is released in place.
    pub(crate) fn drop_passenger(
        &mut self,
        carrier: HumanId,
        reserved: &FxHashSet<Coord>,
    ) -> Option<(HumanId, Coord)> {
        let carried = self.carries.carried_by(carrier)?;
        let own = self.humans[carried.index()].position();
        if self.grid.occupant(own) == Some(carried) {
            // Picked up this tick and not yet moved: it stays where it lay
            self.carries.release(carrier);
            trace!("{carrier} let go of {carried} before lifting it");
            return Some((carried, own));
        }
        let origin = self.humans[carrier.index()].position();
        let cell = self.drop_cell(origin, reserved)?;
        self.carries.release(carrier);
        self.grid.vacate(carried, self.humans[carried.index()].position());
        self.grid.place(carried, cell);
        self.humans[carried.index()].relocate(cell);
        trace!("{carrier} set down {carried} at {cell}");
        Some((carried, cell))
    }

    fn set_down(&mut self, carried: HumanId, origin: Coord, reserved: &FxHashSet<Coord>) -> bool {
        let own = self.humans[carried.index()].position();
        if self.grid.occupant(own) == Some(carried) && !self.hazard.is_flooded(own) {
            return true;
        }
        self.grid.vacate(carried, own);
        match self.drop_cell(origin, reserved) {
            Some(cell) => {
                self.grid.place(carried, cell);
                self.humans[carried.index()].relocate(cell);
                trace!("{carried} dropped at {cell}");
                true
            }
            None => {
                self.humans[carried.index()].relocate(origin);
                false
            }
        }
    }

    /// Mark a human (and its passenger) escaped, returning everyone who left
    pub(crate) fn escape(&mut self, id: HumanId) -> Vec<HumanId> {
        if !self.humans[id.index()].is_active() {
            return Vec::new();
        }
        let position = self.humans[id.index()].position();
        self.humans[id.index()].set_status(Status::Escaped);
        self.grid.vacate(id, position);
        trace!("{id} escaped at {position}");

        let mut escaped = vec![id];
        if let Some(carried) = self.carries.release(id) {
            let own = self.humans[carried.index()].position();
            self.grid.vacate(carried, own);
            let passenger = &mut self.humans[carried.index()];
            passenger.relocate(position);
            passenger.set_status(Status::Escaped);
            escaped.push(carried);
        }
        escaped
    }

    pub(crate) fn begin_carry(&mut self, carrier: HumanId, carried: HumanId) -> bool {
        self.carries.begin(carrier, carried)
    }

    /// Move a standing human to a free cell
    pub(crate) fn move_standing(&mut self, id: HumanId, to: Coord) {
        let from = self.humans[id.index()].position();
        self.grid.vacate(id, from);
        self.grid.place(id, to);
        self.humans[id.index()].relocate(to);
    }

    /// Put every passenger on its carrier's cell; passengers are not grid occupants
    pub(crate) fn settle_passengers(&mut self) {
        for (carrier, carried) in self.carries.pairs() {
            let to = self.humans[carrier.index()].position();
            let from = self.humans[carried.index()].position();
            self.grid.vacate(carried, from);
            self.humans[carried.index()].relocate(to);
        }
    }
}
