//! One simulation tick
//!
//! Phases, in order:
//!
//! 1. Flood spread from the tick-start field; anyone caught drowns.
//! 2. Snapshot of the population.
//! 3. Perception for every active human (parallel, read-only). Seen exits join
//!    knowledge, seen water is remembered.
//! 4. Collaboration resolved against the snapshot and applied at once.
//! 5. A fresh seeded activation permutation. Each human runs the precedence
//!    rules (exit, water, panic/incapacitation) and claims at most one target
//!    cell; first claim wins.
//! 6. Commit: moves, passengers follow their carriers, anyone standing on an
//!    exit leaves with whoever they carry.
//! 7. Metrics row.

use crate::agent::{choose_move, roll_transition, DeathCause, Mobility, MoveContext, Transition};
use crate::collaboration::{self, CollaborationOutcome};
use crate::config::BehaviorParams;
use crate::core_types::{Coord, HumanId};
use crate::grid::Terrain;
use crate::perception::{perceive, Percept};
use crate::simulation::metrics::{MetricsCollector, TickMetrics};
use crate::simulation::snapshot::WorldSnapshot;
use crate::simulation::World;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Everything that happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1 for the first step)
    pub tick: u64,
    /// Cells flooded by this tick's spread
    pub newly_flooded: Vec<Coord>,
    /// Humans who drowned, including passengers with nowhere dry to go
    pub deaths: Vec<HumanId>,
    /// Humans who left through an exit, carriers followed by their passengers
    pub escapes: Vec<HumanId>,
    /// `(carrier, carried)` pairs formed this tick
    pub carries_started: Vec<(HumanId, HumanId)>,
    /// Passengers set down because their carrier died or collapsed
    pub drops: Vec<HumanId>,
    /// Normal humans who panicked
    pub panicked: Vec<HumanId>,
    /// Panicking humans who collapsed
    pub incapacitated: Vec<HumanId>,
    /// Panicking humans calmed by a collaborator
    pub calmed: Vec<HumanId>,
    /// Humans whose target cell had already been claimed
    pub rejected_moves: Vec<HumanId>,
    /// Activation permutation used for conflict resolution
    pub activation_order: Vec<HumanId>,
}

/// Drives ticks over a [`World`]
#[derive(Debug, Clone)]
pub struct Scheduler {
    rng: StdRng,
    seed: u64,
    intensity: f64,
    behavior: BehaviorParams,
    metrics: MetricsCollector,
}

impl Scheduler {
    /// Scheduler with its own RNG stream seeded from `seed`
    #[must_use]
    pub fn new(seed: u64, intensity: f64, behavior: BehaviorParams, world: &World) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), seed, intensity, behavior, world)
    }

    /// Continue an existing RNG stream (the one used to set the world up)
    #[must_use]
    pub fn with_rng(
        rng: StdRng,
        seed: u64,
        intensity: f64,
        behavior: BehaviorParams,
        world: &World,
    ) -> Self {
        Self {
            rng,
            seed,
            intensity,
            behavior,
            metrics: MetricsCollector::new(world),
        }
    }

    /// Seed the run was started from
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Advance the world by one tick
    pub fn tick(&mut self, world: &mut World) -> TickReport {
        let tick = world.advance_tick();
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        // 1. Flood
        let (newly, effects) = world.spread_hazard(self.intensity, &mut self.rng);
        report.newly_flooded = newly;
        report.deaths.extend(effects.deaths);
        report.drops.extend(effects.drops);

        // 2-3. Snapshot and perception
        let snapshot = WorldSnapshot::capture(world);
        let percepts = self.perceive_all(world, &snapshot);
        for (view, percept) in snapshot.humans.iter().zip(&percepts) {
            let human = world.human_mut(view.id);
            human.learn_exits(percept.exits.iter().copied());
            human.remember_hazard(percept.flooded.iter().copied());
        }

        // 4. Collaboration
        let outcome = collaboration::resolve(&snapshot, &percepts, &self.behavior, &mut self.rng);
        self.apply_collaboration(world, &outcome, &mut report);

        // 5. Decisions
        let mut order: Vec<HumanId> = snapshot.humans.iter().map(|v| v.id).collect();
        order.shuffle(&mut self.rng);
        let moves = self.decide(world, &snapshot, &percepts, &outcome, &order, &mut report);

        // 6. Commit
        for (id, target) in moves {
            world.move_standing(id, target);
        }
        world.settle_passengers();
        let on_exit: Vec<HumanId> = world
            .active_humans()
            .filter(|h| world.carries().carrier_of(h.id()).is_none())
            .filter(|h| world.grid().terrain(h.position()) == Terrain::EmergencyExit)
            .map(|h| h.id())
            .collect();
        for id in on_exit {
            report.escapes.extend(world.escape(id));
        }

        // 7. Metrics
        let row = self.metrics.record(world);
        log_tick(&row, &report);

        report.activation_order = order;
        report
    }

    fn perceive_all(&self, world: &World, snapshot: &WorldSnapshot) -> Vec<Percept> {
        let grid = world.grid();
        let hazard = world.hazard();
        let furniture_blocks_sight = self.behavior.furniture_blocks_sight;
        snapshot
            .humans
            .par_iter()
            .map(|view| perceive(grid, hazard, snapshot, view, furniture_blocks_sight))
            .collect()
    }

    fn apply_collaboration(
        &mut self,
        world: &mut World,
        outcome: &CollaborationOutcome,
        report: &mut TickReport,
    ) {
        for (id, exits) in &outcome.knowledge_gains {
            world.human_mut(*id).learn_exits(exits.iter().copied());
        }
        for &(carrier, carried) in &outcome.carries {
            if world.begin_carry(carrier, carried) {
                trace!("{carrier} starts carrying {carried}");
                report.carries_started.push((carrier, carried));
            }
        }
        for &id in &outcome.calmed {
            world.human_mut(id).set_mobility(Mobility::Normal);
        }
        report.calmed.clone_from(&outcome.calmed);
        self.metrics.record_collaboration(outcome);
    }

    /// Run the precedence rules for every active human and collect claimed moves
    fn decide(
        &mut self,
        world: &mut World,
        snapshot: &WorldSnapshot,
        percepts: &[Percept],
        outcome: &CollaborationOutcome,
        order: &[HumanId],
        report: &mut TickReport,
    ) -> Vec<(HumanId, Coord)> {
        let mut claims: FxHashSet<Coord> = snapshot.standing_cells().clone();
        let mut moves = Vec::new();

        for &id in order {
            let Some(slot) = snapshot.slot(id) else {
                continue;
            };
            let Some(human) = world.human(id) else {
                continue;
            };
            // Dropped-and-drowned passengers, or riders with no will of their own
            if !human.is_active() || world.carries().carrier_of(id).is_some() {
                continue;
            }
            let position = human.position();
            let mut mobility = human.mobility();

            if world.grid().terrain(position) == Terrain::EmergencyExit {
                report.escapes.extend(world.escape(id));
                continue;
            }
            if world.hazard().is_flooded(position) {
                let effects = world.kill(id, DeathCause::Drowned, &claims);
                report.deaths.extend(effects.deaths);
                report.drops.extend(effects.drops);
                continue;
            }

            let percept = &percepts[slot];
            match roll_transition(
                mobility,
                percept.sees_threat(),
                outcome.is_calmed(id),
                &self.behavior,
                &mut self.rng,
            ) {
                Transition::Stay => {}
                Transition::Panicked => {
                    trace!("{id} panics at {position}");
                    world.human_mut(id).set_mobility(Mobility::Panic);
                    mobility = Mobility::Panic;
                    report.panicked.push(id);
                }
                Transition::Incapacitated => {
                    let free_hands = if world.carries().carried_by(id).is_some() {
                        match world.drop_passenger(id, &claims) {
                            Some((carried, cell)) => {
                                claims.insert(cell);
                                report.drops.push(carried);
                                true
                            }
                            // Collapse deferred: nowhere to set the passenger down
                            None => false,
                        }
                    } else {
                        true
                    };
                    if free_hands {
                        trace!("{id} incapacitated at {position}");
                        world.human_mut(id).set_mobility(Mobility::Incapacitated);
                        mobility = Mobility::Incapacitated;
                        report.incapacitated.push(id);
                    }
                }
            }
            if mobility == Mobility::Incapacitated {
                continue;
            }

            let Some(human) = world.human(id) else {
                continue;
            };
            let ctx = MoveContext {
                grid: world.grid(),
                position,
                mobility,
                knowledge: human.knowledge(),
                known_hazard: human.known_hazard(),
                visited: human.visited(),
                percept,
                occupied: snapshot.standing_cells(),
            };
            if let Some((target, intent)) = choose_move(&ctx, &self.behavior, &mut self.rng) {
                if claims.insert(target) {
                    trace!("{id} {position} -> {target} ({intent:?})");
                    moves.push((id, target));
                } else {
                    trace!("{id} lost the claim on {target}");
                    report.rejected_moves.push(id);
                }
            }
        }
        moves
    }
}

fn log_tick(row: &TickMetrics, report: &TickReport) {
    debug!(
        "Tick {}: {} alive, {} escaped, {} dead, {} flooded (+{}), {} carrying",
        row.tick,
        row.alive,
        row.escaped,
        row.dead,
        row.flooded_cells,
        report.newly_flooded.len(),
        row.carrying
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{SpawnSpec, Status};
    use crate::grid::Grid;

    fn calm() -> BehaviorParams {
        BehaviorParams {
            panic_probability: 0.0,
            incapacitation_probability: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_counter_and_metrics_row() {
        let mut world = World::new(Grid::new(3, 3));
        world.spawn(SpawnSpec::at(Coord::new(1, 1))).unwrap();
        let mut scheduler = Scheduler::new(1, 0.0, calm(), &world);
        let report = scheduler.tick(&mut world);
        assert_eq!(report.tick, 1);
        assert_eq!(world.tick(), 1);
        assert_eq!(scheduler.metrics().history().len(), 2);
        assert_eq!(report.activation_order, vec![HumanId(0)]);
    }

    #[test]
    fn test_human_spawned_on_exit_escapes_first_tick() {
        let grid = Grid::new(3, 3)
            .with_terrain(Coord::new(0, 0), Terrain::EmergencyExit)
            .unwrap();
        let mut world = World::new(grid);
        let id = world.spawn(SpawnSpec::at(Coord::new(0, 0))).unwrap();
        let mut scheduler = Scheduler::new(1, 0.0, calm(), &world);
        let report = scheduler.tick(&mut world);
        assert_eq!(report.escapes, vec![id]);
        assert_eq!(world.human(id).unwrap().status(), Status::Escaped);
    }

    #[test]
    fn test_seen_exit_is_learned() {
        let grid = Grid::new(1, 5)
            .with_terrain(Coord::new(0, 4), Terrain::EmergencyExit)
            .unwrap();
        let mut world = World::new(grid);
        let id = world.spawn(SpawnSpec::at(Coord::new(0, 0)).sight(4)).unwrap();
        let mut scheduler = Scheduler::new(1, 0.0, calm(), &world);
        scheduler.tick(&mut world);
        let human = world.human(id).unwrap();
        assert!(human.knowledge().contains(&Coord::new(0, 4)));
        assert_eq!(human.position(), Coord::new(0, 1));
    }

    #[test]
    fn test_carrier_collapsing_on_pickup_tick_leaves_passenger_in_place() {
        let mut world = World::new(Grid::new(4, 4));
        let carried = world
            .spawn(
                SpawnSpec::at(Coord::new(1, 1))
                    .collaborating()
                    .with_mobility(Mobility::Incapacitated),
            )
            .unwrap();
        let carrier = world
            .spawn(
                SpawnSpec::at(Coord::new(1, 2))
                    .collaborating()
                    .with_mobility(Mobility::Panic),
            )
            .unwrap();
        let params = BehaviorParams {
            incapacitation_probability: 1.0,
            morale_probability: 0.0,
            ..calm()
        };
        let mut scheduler = Scheduler::new(6, 0.0, params, &world);
        let report = scheduler.tick(&mut world);

        assert_eq!(report.carries_started, vec![(carrier, carried)]);
        assert_eq!(report.drops, vec![carried]);
        assert_eq!(report.incapacitated, vec![carrier]);
        assert!(world.carries().is_empty());
        assert_eq!(world.human(carried).unwrap().position(), Coord::new(1, 1));
        assert_eq!(world.grid().occupant(Coord::new(1, 1)), Some(carried));
        assert_eq!(world.grid().occupant(Coord::new(1, 2)), Some(carrier));
    }

    #[test]
    fn test_same_seed_same_run() {
        let build = || {
            let mut world = World::new(Grid::new(8, 8));
            for col in 0..4 {
                world.spawn(SpawnSpec::at(Coord::new(3, col * 2)).collaborating()).unwrap();
            }
            world.flood(Coord::new(7, 7)).unwrap();
            world
        };
        let (mut a, mut b) = (build(), build());
        let mut sa = Scheduler::new(42, 0.3, BehaviorParams::default(), &a);
        let mut sb = Scheduler::new(42, 0.3, BehaviorParams::default(), &b);
        for _ in 0..10 {
            assert_eq!(sa.tick(&mut a), sb.tick(&mut b));
        }
        assert_eq!(sa.metrics().history(), sb.metrics().history());
    }
}
