//! Per-tick decisions of an active human: stochastic state transitions and the
//! choice of one movement step

use super::human::Mobility;
use super::navigation::{explore_step, step_away, step_toward};
use crate::config::BehaviorParams;
use crate::core_types::Coord;
use crate::grid::Grid;
use crate::perception::Percept;
use rand::Rng;
use rustc_hash::FxHashSet;

/// Outcome of the stochastic transition roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State unchanged this tick
    Stay,
    /// Normal → Panic
    Panicked,
    /// Panic → Incapacitated
    Incapacitated,
}

/// Roll panic induction or incapacitation for an active, standing human
///
/// A Normal human who sees the flood or a casualty panics with
/// `panic_probability`, unless a collaborator calmed them this tick. A Panic human
/// becomes Incapacitated with `incapacitation_probability`. Incapacitation is
/// permanent. No random number is drawn when no transition is possible.
pub fn roll_transition<R: Rng + ?Sized>(
    mobility: Mobility,
    sees_threat: bool,
    calmed: bool,
    params: &BehaviorParams,
    rng: &mut R,
) -> Transition {
    match mobility {
        Mobility::Normal if sees_threat && !calmed => {
            if rng.random_bool(params.panic_probability) {
                Transition::Panicked
            } else {
                Transition::Stay
            }
        }
        Mobility::Panic => {
            if rng.random_bool(params.incapacitation_probability) {
                Transition::Incapacitated
            } else {
                Transition::Stay
            }
        }
        Mobility::Normal | Mobility::Incapacitated => Transition::Stay,
    }
}

/// Why a step was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIntent {
    /// Shortest known path to an exit
    TowardExit,
    /// Random walk in search of an exit
    Explore,
    /// Away from the nearest visible flooded cell
    Flee,
}

/// Everything a human consults when picking a step
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    /// Building terrain
    pub grid: &'a Grid,
    /// Current cell
    pub position: Coord,
    /// Mobility after this tick's transition
    pub mobility: Mobility,
    /// Known exits
    pub knowledge: &'a FxHashSet<Coord>,
    /// Flooded cells this human knows about
    pub known_hazard: &'a FxHashSet<Coord>,
    /// Cells already stood on
    pub visited: &'a FxHashSet<Coord>,
    /// This tick's percept
    pub percept: &'a Percept,
    /// Cells with a standing human at tick start
    pub occupied: &'a FxHashSet<Coord>,
}

impl MoveContext<'_> {
    fn traversable(&self, cell: Coord) -> bool {
        self.grid.terrain(cell).is_passable() && !self.known_hazard.contains(&cell)
    }

    fn open(&self, cell: Coord) -> bool {
        self.traversable(cell) && !self.occupied.contains(&cell)
    }

    fn goal_step<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Coord, MoveIntent)> {
        if !self.knowledge.is_empty() {
            let goals: FxHashSet<Coord> = self
                .knowledge
                .iter()
                .copied()
                .filter(|c| !self.known_hazard.contains(c))
                .collect();
            let step = step_toward(
                self.grid,
                self.position,
                &goals,
                |c| self.traversable(c),
                |c| self.open(c),
            );
            if let Some(step) = step {
                return Some((step, MoveIntent::TowardExit));
            }
        }
        explore_step(self.grid, self.position, self.visited, |c| self.open(c), rng)
            .map(|step| (step, MoveIntent::Explore))
    }

    fn flee_step(&self, threat: Coord) -> Option<(Coord, MoveIntent)> {
        step_away(self.grid, self.position, threat, |c| self.open(c)).map(|s| (s, MoveIntent::Flee))
    }
}

/// Pick at most one step for a Normal or Panic human
///
/// With a flooded cell in view, the goal move (toward a known exit, else
/// exploration) carries weight 1.0 and the flee move carries `flee_weight`,
/// multiplied by `panic_flee_multiplier` while panicking. One uniform draw picks
/// the preferred move; if it yields no step the other is tried. With no flood in
/// view the goal move is taken directly.
pub fn choose_move<R: Rng + ?Sized>(
    ctx: &MoveContext<'_>,
    params: &BehaviorParams,
    rng: &mut R,
) -> Option<(Coord, MoveIntent)> {
    if ctx.mobility == Mobility::Incapacitated {
        return None;
    }

    let Some(threat) = ctx.percept.nearest_flooded(ctx.position) else {
        return ctx.goal_step(rng);
    };

    let mut flee_weight = params.flee_weight;
    if ctx.mobility == Mobility::Panic {
        flee_weight *= params.panic_flee_multiplier;
    }
    let prefer_flee = flee_weight > 0.0 && rng.random::<f64>() * (1.0 + flee_weight) < flee_weight;

    if prefer_flee {
        ctx.flee_step(threat).or_else(|| ctx.goal_step(rng))
    } else {
        ctx.goal_step(rng).or_else(|| ctx.flee_step(threat))
    }
}
