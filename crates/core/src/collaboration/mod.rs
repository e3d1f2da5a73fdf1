//! Collaboration between mutually visible, collaborating humans
//!
//! Three interactions, all computed from the tick-start snapshot and returned as
//! one [`CollaborationOutcome`] that the scheduler applies atomically:
//!
//! - **Verbal**: exit knowledge is unioned into both parties. The exchange
//!   counts whenever either side knows an exit, even if nothing is new.
//! - **Physical**: an able human adjacent to an incapacitated one picks them up.
//! - **Morale**: a panicking human with a calm partner may calm down.
//!
//! Pairs are visited in ascending id order and every random draw happens in that
//! order, so the outcome does not depend on the activation permutation. Knowledge
//! does not chain within a tick: A's exits reach C through B only on the next tick.

pub mod carry;

pub use carry::CarryTable;

use crate::agent::Mobility;
use crate::config::BehaviorParams;
use crate::core_types::{Coord, HumanId};
use crate::perception::Percept;
use crate::simulation::snapshot::WorldSnapshot;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::trace;

/// Effects of one tick of collaboration, not yet applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaborationOutcome {
    /// Exits each human learns, ascending by id then coordinate
    pub knowledge_gains: Vec<(HumanId, Vec<Coord>)>,
    /// New `(carrier, carried)` pairs
    pub carries: Vec<(HumanId, HumanId)>,
    /// Panicking humans calmed back to Normal this tick, ascending
    pub calmed: Vec<HumanId>,
    /// Pair exchanges where at least one party knew an exit
    pub verbal: u64,
    /// Carries started
    pub physical: u64,
    /// Successful calm-downs
    pub morale: u64,
}

impl CollaborationOutcome {
    /// Whether the human was calmed this tick (suppresses panic induction)
    #[must_use]
    pub fn is_calmed(&self, id: HumanId) -> bool {
        self.calmed.binary_search(&id).is_ok()
    }
}

/// Snapshot slots `(i, j)`, `i < j`, of collaborating humans that see each other
#[must_use]
pub fn collaboration_pairs(snapshot: &WorldSnapshot, percepts: &[Percept]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in snapshot.humans.iter().enumerate() {
        if !a.collaborates {
            continue;
        }
        for other in &percepts[i].agents {
            let Some(j) = snapshot.slot(*other) else {
                continue;
            };
            if j <= i || !snapshot.humans[j].collaborates {
                continue;
            }
            if percepts[j].sees(a.id) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Resolve all collaboration for one tick
///
/// `percepts[i]` belongs to `snapshot.humans[i]`. Exits a human sees this tick
/// count as part of what it can share.
pub fn resolve<R: Rng + ?Sized>(
    snapshot: &WorldSnapshot,
    percepts: &[Percept],
    params: &BehaviorParams,
    rng: &mut R,
) -> CollaborationOutcome {
    let mut outcome = CollaborationOutcome::default();
    let pairs = collaboration_pairs(snapshot, percepts);
    if pairs.is_empty() {
        return outcome;
    }

    let known: Vec<BTreeSet<Coord>> = snapshot
        .humans
        .iter()
        .zip(percepts)
        .map(|(h, p)| h.knowledge.iter().chain(&p.exits).copied().collect())
        .collect();

    // Verbal
    let mut gains: FxHashMap<usize, FxHashSet<Coord>> = FxHashMap::default();
    for &(i, j) in &pairs {
        if known[i].is_empty() && known[j].is_empty() {
            continue;
        }
        let to_j: Vec<Coord> = known[i].difference(&known[j]).copied().collect();
        let to_i: Vec<Coord> = known[j].difference(&known[i]).copied().collect();
        outcome.verbal += 1;
        gains.entry(i).or_default().extend(to_i);
        gains.entry(j).or_default().extend(to_j);
    }
    let mut knowledge_gains: Vec<(HumanId, Vec<Coord>)> = gains
        .into_iter()
        .filter(|(_, exits)| !exits.is_empty())
        .map(|(slot, exits)| {
            let mut exits: Vec<Coord> = exits.into_iter().collect();
            exits.sort_unstable();
            (snapshot.humans[slot].id, exits)
        })
        .collect();
    knowledge_gains.sort_unstable();
    outcome.knowledge_gains = knowledge_gains;

    // Physical: greedy matching in ascending (helper, target) order
    let mut candidates: Vec<(HumanId, HumanId)> = Vec::new();
    for &(i, j) in &pairs {
        let (a, b) = (&snapshot.humans[i], &snapshot.humans[j]);
        if !a.position.is_adjacent(b.position) {
            continue;
        }
        for (helper, target) in [(a, b), (b, a)] {
            if helper.can_carry()
                && target.mobility == Mobility::Incapacitated
                && target.carried_by.is_none()
            {
                candidates.push((helper.id, target.id));
            }
        }
    }
    candidates.sort_unstable();
    let mut taken: FxHashSet<HumanId> = FxHashSet::default();
    for (helper, target) in candidates {
        if taken.contains(&helper) || taken.contains(&target) {
            continue;
        }
        taken.insert(helper);
        taken.insert(target);
        trace!("{helper} picks up {target}");
        outcome.carries.push((helper, target));
        outcome.physical += 1;
    }

    // Morale: one draw per panicking human with at least one calm partner
    let mut reassured: BTreeSet<usize> = BTreeSet::new();
    for &(i, j) in &pairs {
        let (a, b) = (&snapshot.humans[i], &snapshot.humans[j]);
        if a.mobility == Mobility::Panic && b.mobility == Mobility::Normal {
            reassured.insert(i);
        }
        if b.mobility == Mobility::Panic && a.mobility == Mobility::Normal {
            reassured.insert(j);
        }
    }
    for slot in reassured {
        if rng.random_bool(params.morale_probability) {
            let id = snapshot.humans[slot].id;
            trace!("{id} calmed by a collaborator");
            outcome.calmed.push(id);
            outcome.morale += 1;
        }
    }
    outcome.calmed.sort_unstable();

    outcome
}
