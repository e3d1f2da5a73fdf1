//! Frozen view of the population taken at the start of each tick
//!
//! Perception, collaboration and movement decisions all read from this snapshot,
//! so agent activation order only affects move-conflict resolution.

use crate::agent::Mobility;
use crate::core_types::{Coord, HumanId};
use crate::simulation::World;
use rustc_hash::{FxHashMap, FxHashSet};

/// Immutable copy of one active human's decision-relevant state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanView {
    /// Identifier
    pub id: HumanId,
    /// Cell at tick start
    pub position: Coord,
    /// Mobility at tick start
    pub mobility: Mobility,
    /// Sight radius in cells
    pub sight_radius: usize,
    /// Takes part in collaboration
    pub collaborates: bool,
    /// Known exits at tick start, ascending
    pub knowledge: Vec<Coord>,
    /// Human this one is carrying
    pub carrying: Option<HumanId>,
    /// Human carrying this one
    pub carried_by: Option<HumanId>,
}

impl HumanView {
    /// Able to move under its own power and free to pick someone up
    #[must_use]
    pub fn can_carry(&self) -> bool {
        self.mobility != Mobility::Incapacitated
            && self.carrying.is_none()
            && self.carried_by.is_none()
    }
}

/// Population state at tick start
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// Active humans in ascending id order
    pub humans: Vec<HumanView>,
    index: FxHashMap<HumanId, usize>,
    by_cell: FxHashMap<Coord, Vec<HumanId>>,
    standing: FxHashSet<Coord>,
    bodies: FxHashSet<Coord>,
}

impl WorldSnapshot {
    /// Capture the active population, carry relations and bodies of a world
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let mut snapshot = Self::default();
        for human in world.humans().iter().filter(|h| h.is_active()) {
            let id = human.id();
            let carried_by = world.carries().carrier_of(id);
            snapshot.index.insert(id, snapshot.humans.len());
            snapshot.by_cell.entry(human.position()).or_default().push(id);
            if carried_by.is_none() {
                snapshot.standing.insert(human.position());
            }
            snapshot.humans.push(HumanView {
                id,
                position: human.position(),
                mobility: human.mobility(),
                sight_radius: human.sight_radius(),
                collaborates: human.collaborates(),
                knowledge: human.knowledge_sorted(),
                carrying: world.carries().carried_by(id),
                carried_by,
            });
        }
        snapshot.bodies = world.dead().iter().map(|d| d.position).collect();
        snapshot
    }

    /// View of one human, `None` if it was not active at tick start
    #[must_use]
    pub fn view(&self, id: HumanId) -> Option<&HumanView> {
        self.index.get(&id).map(|&i| &self.humans[i])
    }

    /// Position of a human in `humans`
    #[must_use]
    pub fn slot(&self, id: HumanId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Active humans on a cell (a carrier and its passenger share one)
    pub fn humans_at(&self, coord: Coord) -> impl Iterator<Item = HumanId> + '_ {
        self.by_cell.get(&coord).into_iter().flatten().copied()
    }

    /// Cells with a standing human at tick start
    #[must_use]
    pub fn standing_cells(&self) -> &FxHashSet<Coord> {
        &self.standing
    }

    /// Whether a body lies on the cell
    #[must_use]
    pub fn has_body(&self, coord: Coord) -> bool {
        self.bodies.contains(&coord)
    }
}
