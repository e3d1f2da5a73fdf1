//! Single-step movement primitives
//!
//! Each function proposes at most one Moore step. Callers supply an `open`
//! predicate describing which cells the human may step onto this tick (passable,
//! not known to be flooded, not occupied at tick start).

use crate::core_types::Coord;
use crate::grid::Grid;
use pathfinding::prelude::bfs;
use rand::seq::IndexedRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

/// First step of a shortest path to the nearest reachable goal
///
/// The path may run through `traversable` cells; its first step must also be
/// `open`. Neighbours are expanded in ascending coordinate order, so among
/// equally short paths the one with the lowest first step wins.
pub fn step_toward<T, O>(
    grid: &Grid,
    from: Coord,
    goals: &FxHashSet<Coord>,
    traversable: T,
    open: O,
) -> Option<Coord>
where
    T: Fn(Coord) -> bool,
    O: Fn(Coord) -> bool,
{
    if goals.is_empty() || goals.contains(&from) {
        return None;
    }
    let path = bfs(
        &from,
        |&cell| {
            grid.neighbors_of(cell)
                .filter(|&n| if cell == from { open(n) } else { traversable(n) })
                .collect::<Vec<_>>()
        },
        |cell| goals.contains(cell),
    )?;
    path.get(1).copied()
}

/// Step that maximises distance from `threat`
///
/// Moves only if the best open neighbour is at least as far from the threat as
/// the current cell; lowest coordinate wins ties.
pub fn step_away<O>(grid: &Grid, from: Coord, threat: Coord, open: O) -> Option<Coord>
where
    O: Fn(Coord) -> bool,
{
    let here = from.chebyshev(threat);
    grid.neighbors_of(from)
        .filter(|&n| open(n))
        .map(|n| (n.chebyshev(threat), n))
        .filter(|(d, _)| *d >= here)
        .max_by(|(da, ca), (db, cb)| da.cmp(db).then(cb.cmp(ca)))
        .map(|(_, n)| n)
}

/// Biased random walk: an unvisited open neighbour if there is one, otherwise
/// any open neighbour, chosen uniformly
pub fn explore_step<O, R>(
    grid: &Grid,
    from: Coord,
    visited: &FxHashSet<Coord>,
    open: O,
    rng: &mut R,
) -> Option<Coord>
where
    O: Fn(Coord) -> bool,
    R: Rng + ?Sized,
{
    let candidates: Vec<Coord> = grid.neighbors_of(from).filter(|&n| open(n)).collect();
    let fresh: Vec<Coord> = candidates
        .iter()
        .copied()
        .filter(|c| !visited.contains(c))
        .collect();
    if fresh.is_empty() {
        candidates.choose(rng).copied()
    } else {
        fresh.choose(rng).copied()
    }
}
