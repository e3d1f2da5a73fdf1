//! Human agent state
//!
//! A human is either active (with a mobility mode) or in one of two terminal
//! states. Carrying relationships are not stored here; see
//! [`crate::collaboration::CarryTable`].

use crate::core_types::{Coord, HumanId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioural mode of an active human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mobility {
    /// Calm, goal-directed
    #[default]
    Normal,
    /// Panicking: moves, but favours fleeing the flood
    Panic,
    /// Cannot move under its own power
    Incapacitated,
}

/// Why a human died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// The flood reached the human's cell
    Drowned,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drowned => f.write_str("drowned"),
        }
    }
}

/// Lifecycle state of a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Still in the building
    #[default]
    Active,
    /// Left through an emergency exit (terminal)
    Escaped,
    /// Died in the building (terminal)
    Dead(DeathCause),
}

impl Status {
    /// Whether no further change can happen
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A human agent
#[derive(Debug, Clone)]
pub struct Human {
    id: HumanId,
    position: Coord,
    mobility: Mobility,
    status: Status,
    sight_radius: usize,
    collaborates: bool,
    /// Emergency exits discovered by sight or learned from others
    knowledge: FxHashSet<Coord>,
    /// Flooded cells this human has seen (the flood never recedes)
    known_hazard: FxHashSet<Coord>,
    /// Cells this human has stood on, for exploration
    visited: FxHashSet<Coord>,
}

impl Human {
    /// Create an active, Normal human with empty knowledge
    #[must_use]
    pub fn new(id: HumanId, position: Coord, sight_radius: usize, collaborates: bool) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(position);
        Self {
            id,
            position,
            mobility: Mobility::Normal,
            status: Status::Active,
            sight_radius,
            collaborates,
            knowledge: FxHashSet::default(),
            known_hazard: FxHashSet::default(),
            visited,
        }
    }

    /// Identifier
    #[must_use]
    pub fn id(&self) -> HumanId {
        self.id
    }

    /// Current (or final) cell
    #[must_use]
    pub fn position(&self) -> Coord {
        self.position
    }

    /// Current mobility mode
    #[must_use]
    pub fn mobility(&self) -> Mobility {
        self.mobility
    }

    /// Lifecycle state
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the human is still in the building
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Sight radius in cells
    #[must_use]
    pub fn sight_radius(&self) -> usize {
        self.sight_radius
    }

    /// Whether this human takes part in collaboration
    #[must_use]
    pub fn collaborates(&self) -> bool {
        self.collaborates
    }

    /// Known emergency exits
    #[must_use]
    pub fn knowledge(&self) -> &FxHashSet<Coord> {
        &self.knowledge
    }

    /// Known emergency exits in ascending order
    #[must_use]
    pub fn knowledge_sorted(&self) -> Vec<Coord> {
        let mut exits: Vec<Coord> = self.knowledge.iter().copied().collect();
        exits.sort_unstable();
        exits
    }

    /// Flooded cells this human has seen
    #[must_use]
    pub fn known_hazard(&self) -> &FxHashSet<Coord> {
        &self.known_hazard
    }

    /// Cells this human has stood on
    #[must_use]
    pub fn visited(&self) -> &FxHashSet<Coord> {
        &self.visited
    }

    /// Add exits to the knowledge set, returning how many were new
    pub fn learn_exits<I: IntoIterator<Item = Coord>>(&mut self, exits: I) -> usize {
        let before = self.knowledge.len();
        self.knowledge.extend(exits);
        self.knowledge.len() - before
    }

    pub(crate) fn remember_hazard<I: IntoIterator<Item = Coord>>(&mut self, cells: I) {
        self.known_hazard.extend(cells);
    }

    /// Set mobility on an active human; terminal humans are frozen
    pub(crate) fn set_mobility(&mut self, mobility: Mobility) {
        if self.is_active() {
            self.mobility = mobility;
        }
    }

    pub(crate) fn relocate(&mut self, to: Coord) {
        if self.is_active() {
            self.position = to;
            self.visited.insert(to);
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        if self.is_active() {
            self.status = status;
        }
    }
}

/// Terminal record of a death, kept for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadHuman {
    /// Who died
    pub id: HumanId,
    /// Where
    pub position: Coord,
    /// How
    pub cause: DeathCause,
    /// On which tick (0 for deaths staged before the first tick)
    pub tick: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_human_is_active_and_normal() {
        let h = Human::new(HumanId(0), Coord::new(2, 3), 4, true);
        assert!(h.is_active());
        assert_eq!(h.mobility(), Mobility::Normal);
        assert!(h.visited().contains(&Coord::new(2, 3)));
        assert!(h.knowledge().is_empty());
    }

    #[test]
    fn test_learn_exits_counts_new_entries() {
        let mut h = Human::new(HumanId(1), Coord::new(0, 0), 3, false);
        assert_eq!(h.learn_exits([Coord::new(5, 5), Coord::new(1, 9)]), 2);
        assert_eq!(h.learn_exits([Coord::new(5, 5)]), 0);
        assert_eq!(h.knowledge_sorted(), vec![Coord::new(1, 9), Coord::new(5, 5)]);
    }

    #[test]
    fn test_terminal_state_is_frozen() {
        let mut h = Human::new(HumanId(2), Coord::new(1, 1), 3, false);
        h.set_status(Status::Dead(DeathCause::Drowned));
        h.relocate(Coord::new(1, 2));
        h.set_mobility(Mobility::Panic);
        h.set_status(Status::Escaped);
        assert_eq!(h.position(), Coord::new(1, 1));
        assert_eq!(h.mobility(), Mobility::Normal);
        assert_eq!(h.status(), Status::Dead(DeathCause::Drowned));
        assert!(h.status().is_terminal());
    }

    #[test]
    fn test_death_cause_label() {
        assert_eq!(DeathCause::Drowned.to_string(), "drowned");
    }
}
