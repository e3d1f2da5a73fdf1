//! Human agents: state, decision rules and movement primitives

pub mod behavior;
pub mod human;
pub mod navigation;

pub use behavior::{choose_move, roll_transition, MoveContext, MoveIntent, Transition};
pub use human::{DeadHuman, DeathCause, Human, Mobility, Status};

use crate::core_types::Coord;

/// Sight radius used by [`SpawnSpec::at`] unless overridden
pub const DEFAULT_SIGHT_RADIUS: usize = 3;

/// Description of a human to place in a world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    /// Starting cell
    pub position: Coord,
    /// Sight radius in cells
    pub sight_radius: usize,
    /// Takes part in collaboration
    pub collaborates: bool,
    /// Starting mobility
    pub mobility: Mobility,
    /// Exits known from the start
    pub knowledge: Vec<Coord>,
}

impl SpawnSpec {
    /// A calm, non-collaborating human with no knowledge at `position`
    #[must_use]
    pub fn at(position: Coord) -> Self {
        Self {
            position,
            sight_radius: DEFAULT_SIGHT_RADIUS,
            collaborates: false,
            mobility: Mobility::Normal,
            knowledge: Vec::new(),
        }
    }

    /// Mark as collaborating
    pub fn collaborating(mut self) -> Self {
        self.collaborates = true;
        self
    }

    /// Set sight radius
    pub fn sight(mut self, radius: usize) -> Self {
        self.sight_radius = radius;
        self
    }

    /// Set starting mobility
    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }

    /// Add exits known from the start
    pub fn knowing<I: IntoIterator<Item = Coord>>(mut self, exits: I) -> Self {
        self.knowledge.extend(exits);
        self
    }
}
