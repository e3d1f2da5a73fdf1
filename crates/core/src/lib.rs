//! Flood Evacuation Simulation Core Library
//!
//! An agent-based model of people leaving a building while a flood spreads
//! through it. Each human perceives a bounded, occluded part of the floor,
//! panics or collapses stochastically, and looks for an emergency exit.
//! Collaborating humans share exit knowledge, carry incapacitated people and
//! calm each other down.
//!
//! ## Tick model
//!
//! - The flood spreads from a tick-start snapshot of itself
//! - Every human decides from one frozen snapshot of the population
//! - Moves are claimed in a seeded random order; first claim wins
//! - All writes happen in a single ordered commit phase
//!
//! ## Quick start
//!
//! ```no_run
//! use flood_evac_core::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     floor_plan_file: "floorplans/floorplan_default.txt".into(),
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let mut sim = Simulation::from_config(config)?;
//! sim.run_until_finished(500);
//! println!("survival rate {:.2}", sim.metrics().survival_rate());
//! # Ok::<(), flood_evac_core::EvacError>(())
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Environment
pub mod grid;
pub mod hazard;
pub mod perception;

// Agents and their interactions
pub mod agent;
pub mod collaboration;

// Orchestration
pub mod config;
pub mod simulation;

// Re-export core types
pub use core_types::{Coord, HumanId};
pub use error::{EvacError, Result};

// Re-export environment
pub use grid::{Floorplan, Grid, Terrain};
pub use hazard::HazardField;
pub use perception::Percept;

// Re-export agent types
pub use agent::{DeadHuman, DeathCause, Human, Mobility, SpawnSpec, Status};
pub use collaboration::{CarryTable, CollaborationOutcome};

// Re-export simulation surface
pub use config::{BehaviorParams, HazardSeeding, SimulationConfig};
pub use simulation::{
    render_ascii, EntityKind, HumanVisual, MetricsCollector, Portrayal, Simulation, TickMetrics,
    TickReport, World,
};
