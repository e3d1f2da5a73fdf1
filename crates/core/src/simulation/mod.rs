//! Flood evacuation simulation
//!
//! `Simulation` couples a [`World`] with a [`Scheduler`] and the configuration
//! it was built from:
//! - spawn placement (random cells or floorplan markers)
//! - collaborator assignment and sight radius draws
//! - initial flood seeding
//! - stepping, run control and display output

pub mod metrics;
pub mod portrayal;
pub mod scheduler;
pub mod snapshot;
pub mod world;

pub use metrics::{MetricsCollector, TickMetrics};
pub use portrayal::{render_ascii, EntityKind, HumanVisual, Portrayal};
pub use scheduler::{Scheduler, TickReport};
pub use snapshot::{HumanView, WorldSnapshot};
pub use world::{FloodEffects, World};

use crate::agent::SpawnSpec;
use crate::config::{HazardSeeding, SimulationConfig};
use crate::core_types::Coord;
use crate::error::{EvacError, Result};
use crate::grid::{Floorplan, Terrain};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tracing::{info, warn};

/// A configured, running evacuation
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    config: SimulationConfig,
}

impl Simulation {
    /// Load the configured floorplan from disk and build the simulation
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let floorplan = Floorplan::load(&config.floor_plan_file)?;
        Self::new(config, floorplan)
    }

    /// Build from an already parsed floorplan
    ///
    /// Fails before any tick on invalid parameters, too few spawn cells or bad
    /// fixed hazard seeds.
    pub fn new(config: SimulationConfig, floorplan: Floorplan) -> Result<Self> {
        config.validate()?;
        let seed = resolve_seed(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let Floorplan { grid, spawn_points } = floorplan;

        info!(
            "Creating flood evacuation: {}x{} grid, {} humans, {:.0}% collaborating, \
             intensity {:.2}, seed {}",
            grid.rows(),
            grid.cols(),
            config.human_count,
            config.collaboration_percentage,
            config.fire_probability,
            seed
        );

        let mut world = World::new(grid);
        let positions = if config.random_spawn {
            random_spawn_cells(&world, config.human_count, &mut rng)?
        } else {
            marker_spawn_cells(&world, &spawn_points, config.human_count)?
        };

        let mut collaborating = vec![false; positions.len()];
        collaborating[..config.collaborator_count()].fill(true);
        collaborating.shuffle(&mut rng);

        let behavior = &config.behavior;
        for (position, collaborates) in positions.into_iter().zip(collaborating) {
            let sight = rng.random_range(behavior.min_sight_radius..=behavior.max_sight_radius);
            let mut spec = SpawnSpec::at(position).sight(sight);
            spec.collaborates = collaborates;
            world.spawn(spec)?;
        }

        seed_hazard(&mut world, &config.hazard, &mut rng)?;

        let scheduler = Scheduler::with_rng(
            rng,
            seed,
            config.fire_probability,
            config.behavior.clone(),
            &world,
        );
        Ok(Self {
            world,
            scheduler,
            config,
        })
    }

    /// Wrap a hand-built world; no spawning or seeding is done
    pub fn with_world(config: SimulationConfig, world: World) -> Result<Self> {
        config.validate()?;
        let seed = resolve_seed(&config);
        info!(
            "Wrapping prepared world: {} humans, {} flooded cells, seed {}",
            world.humans().len(),
            world.hazard().len(),
            seed
        );
        let scheduler = Scheduler::new(
            seed,
            config.fire_probability,
            config.behavior.clone(),
            &world,
        );
        Ok(Self {
            world,
            scheduler,
            config,
        })
    }

    /// Run one tick
    pub fn step(&mut self) -> TickReport {
        self.scheduler.tick(&mut self.world)
    }

    /// No active humans remain
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.world.active_count() == 0
    }

    /// Step until finished or `max_ticks` ticks have run; returns ticks executed
    pub fn run_until_finished(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_finished() {
            self.step();
            ticks += 1;
        }
        if self.is_finished() {
            info!(
                "Evacuation finished after {} ticks, survival rate {:.2}",
                self.world.tick(),
                self.metrics().survival_rate()
            );
        }
        ticks
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for staging (spawn, flood)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        self.scheduler.metrics()
    }

    /// Seed in use, for replaying the run
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.scheduler.seed()
    }

    /// Display list honouring `visualise_vision`
    #[must_use]
    pub fn portray(&self) -> Vec<Portrayal> {
        self.world.portray(
            self.config.visualise_vision,
            self.config.behavior.furniture_blocks_sight,
        )
    }
}

fn resolve_seed(config: &SimulationConfig) -> u64 {
    config.seed.unwrap_or_else(|| {
        let seed = rand::rng().random();
        info!("No seed configured, drew {seed}");
        seed
    })
}

/// Distinct random cells that are passable, dry, free and not an exit
fn random_spawn_cells(world: &World, count: usize, rng: &mut StdRng) -> Result<Vec<Coord>> {
    let grid = world.grid();
    let mut candidates: Vec<Coord> = grid
        .coords()
        .filter(|&c| {
            let terrain = grid.terrain(c);
            terrain.is_passable()
                && terrain != Terrain::EmergencyExit
                && grid.occupant(c).is_none()
                && !world.hazard().is_flooded(c)
        })
        .collect();
    if candidates.len() < count {
        return Err(EvacError::InsufficientSpawnPoints {
            requested: count,
            available: candidates.len(),
        });
    }
    let (chosen, _) = candidates.partial_shuffle(rng, count);
    Ok(chosen.to_vec())
}

/// The first `count` floorplan markers in row-major order
fn marker_spawn_cells(world: &World, markers: &[Coord], count: usize) -> Result<Vec<Coord>> {
    let mut markers: Vec<Coord> = markers
        .iter()
        .copied()
        .filter(|&c| world.grid().contains(c))
        .collect();
    markers.sort_unstable();
    markers.dedup();
    if markers.len() < count {
        return Err(EvacError::InsufficientSpawnPoints {
            requested: count,
            available: markers.len(),
        });
    }
    markers.truncate(count);
    Ok(markers)
}

fn seed_hazard(world: &mut World, seeding: &HazardSeeding, rng: &mut StdRng) -> Result<()> {
    match seeding {
        HazardSeeding::Fixed(cells) => {
            let unique: FxHashSet<Coord> = cells.iter().copied().collect();
            let mut cells: Vec<Coord> = unique.into_iter().collect();
            cells.sort_unstable();
            for cell in cells {
                world.flood(cell)?;
            }
        }
        HazardSeeding::Random { count } => {
            let grid = world.grid();
            let mut candidates: Vec<Coord> = grid
                .coords()
                .filter(|&c| {
                    let terrain = grid.terrain(c);
                    !terrain.blocks_hazard()
                        && terrain != Terrain::EmergencyExit
                        && grid.occupant(c).is_none()
                })
                .collect();
            if candidates.len() < *count {
                warn!(
                    "Only {} cells can hold an initial flood seed, {} requested",
                    candidates.len(),
                    count
                );
            }
            let take = (*count).min(candidates.len());
            let (chosen, _) = candidates.partial_shuffle(rng, take);
            let chosen = chosen.to_vec();
            for cell in chosen {
                world.flood(cell)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn config(humans: usize) -> SimulationConfig {
        SimulationConfig {
            human_count: humans,
            collaboration_percentage: 50.0,
            fire_probability: 0.0,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_random_spawn_places_everyone() {
        let sim = Simulation::new(config(6), Floorplan::from_grid(Grid::new(5, 5))).unwrap();
        let world = sim.world();
        assert_eq!(world.humans().len(), 6);
        assert_eq!(world.humans().iter().filter(|h| h.collaborates()).count(), 3);
        assert_eq!(world.hazard().len(), 1);
        for h in world.humans() {
            assert_eq!(world.grid().occupant(h.position()), Some(h.id()));
            assert!((2..=6).contains(&h.sight_radius()));
        }
    }

    #[test]
    fn test_too_many_humans_for_grid() {
        let err = Simulation::new(config(10), Floorplan::from_grid(Grid::new(3, 3))).unwrap_err();
        assert!(matches!(
            err,
            EvacError::InsufficientSpawnPoints {
                requested: 10,
                available: 9
            }
        ));
    }

    #[test]
    fn test_marker_spawn_uses_floorplan_order() {
        let plan: Floorplan = "S _ S\n_ _ _\nS _ E".parse().unwrap();
        let cfg = SimulationConfig {
            random_spawn: false,
            hazard: HazardSeeding::Fixed(vec![Coord::new(1, 1)]),
            ..config(2)
        };
        let sim = Simulation::new(cfg, plan).unwrap();
        let positions: Vec<Coord> = sim.world().humans().iter().map(|h| h.position()).collect();
        assert_eq!(positions, vec![Coord::new(0, 0), Coord::new(0, 2)]);
        assert!(sim.world().hazard().is_flooded(Coord::new(1, 1)));
    }

    #[test]
    fn test_fixed_seed_on_wall_is_rejected() {
        let plan: Floorplan = "W _\n_ E".parse().unwrap();
        let cfg = SimulationConfig {
            hazard: HazardSeeding::Fixed(vec![Coord::new(0, 0)]),
            ..config(1)
        };
        assert!(matches!(
            Simulation::new(cfg, plan),
            Err(EvacError::InvalidConfig { param: "hazard", .. })
        ));
    }

    #[test]
    fn test_run_stops_at_cap() {
        let mut sim = Simulation::new(config(2), Floorplan::from_grid(Grid::new(4, 4))).unwrap();
        // No exits: nobody can ever leave
        assert_eq!(sim.run_until_finished(5), 5);
        assert!(!sim.is_finished());
        assert_eq!(sim.world().tick(), 5);
        assert_eq!(sim.metrics().history().len(), 6);
    }
}
