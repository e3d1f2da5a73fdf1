//! Shared fixtures for integration tests

#![allow(dead_code)]

use flood_evac_core::{BehaviorParams, Coord, Grid, SimulationConfig, Terrain};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Behaviour with every stochastic transition switched off
pub fn steady_behavior() -> BehaviorParams {
    BehaviorParams {
        panic_probability: 0.0,
        incapacitation_probability: 0.0,
        morale_probability: 0.0,
        ..Default::default()
    }
}

/// Seeded config with no flood spread and no stochastic transitions
pub fn steady_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        fire_probability: 0.0,
        collaboration_percentage: 100.0,
        seed: Some(seed),
        behavior: steady_behavior(),
        ..Default::default()
    }
}

/// Open grid with the given cells set to a terrain kind
pub fn grid_with(rows: usize, cols: usize, cells: &[(Coord, Terrain)]) -> Grid {
    cells.iter().fold(Grid::new(rows, cols), |grid, &(coord, terrain)| {
        grid.with_terrain(coord, terrain).expect("fixture cell in bounds")
    })
}
