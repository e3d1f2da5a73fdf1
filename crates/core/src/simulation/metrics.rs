//! Per-tick population and collaboration statistics

use crate::agent::{DeathCause, Mobility, Status};
use crate::collaboration::CollaborationOutcome;
use crate::error::Result;
use crate::simulation::World;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One row of the metrics history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickMetrics {
    pub tick: u64,
    pub alive: usize,
    pub dead: usize,
    pub escaped: usize,
    pub normal: usize,
    pub panic: usize,
    pub incapacitated: usize,
    /// Active carry relations
    pub carrying: usize,
    /// Cumulative verbal exchanges
    pub verbal: u64,
    /// Cumulative carries started
    pub physical: u64,
    /// Cumulative calm-downs
    pub morale: u64,
    pub flooded_cells: usize,
}

impl TickMetrics {
    const CSV_HEADER: &'static str = "tick,alive,dead,escaped,normal,panic,incapacitated,\
                                      carrying,verbal,physical,morale,flooded_cells";
}

/// Accumulates collaboration counters and the per-tick history
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    history: Vec<TickMetrics>,
    verbal: u64,
    physical: u64,
    morale: u64,
    population: usize,
}

impl MetricsCollector {
    /// Start a history with the world's current state as the first row
    #[must_use]
    pub fn new(world: &World) -> Self {
        let mut collector = Self::default();
        collector.record(world);
        collector
    }

    /// Add one tick of collaboration to the cumulative counters
    pub fn record_collaboration(&mut self, outcome: &CollaborationOutcome) {
        self.verbal += outcome.verbal;
        self.physical += outcome.physical;
        self.morale += outcome.morale;
    }

    /// Row describing the world right now, not stored
    #[must_use]
    pub fn sample(&self, world: &World) -> TickMetrics {
        let mut row = TickMetrics {
            tick: world.tick(),
            carrying: world.carries().len(),
            verbal: self.verbal,
            physical: self.physical,
            morale: self.morale,
            flooded_cells: world.hazard().len(),
            ..Default::default()
        };
        for human in world.humans() {
            match human.status() {
                Status::Active => {
                    row.alive += 1;
                    match human.mobility() {
                        Mobility::Normal => row.normal += 1,
                        Mobility::Panic => row.panic += 1,
                        Mobility::Incapacitated => row.incapacitated += 1,
                    }
                }
                Status::Escaped => row.escaped += 1,
                Status::Dead(DeathCause::Drowned) => row.dead += 1,
            }
        }
        row
    }

    /// Sample the world and append the row
    pub fn record(&mut self, world: &World) -> TickMetrics {
        let row = self.sample(world);
        self.population = world.humans().len();
        self.history.push(row);
        row
    }

    /// Every recorded row, oldest first
    #[must_use]
    pub fn history(&self) -> &[TickMetrics] {
        &self.history
    }

    /// Most recent row
    #[must_use]
    pub fn latest(&self) -> Option<&TickMetrics> {
        self.history.last()
    }

    /// Cumulative (verbal, physical, morale) counts
    #[must_use]
    pub fn collaboration_totals(&self) -> (u64, u64, u64) {
        (self.verbal, self.physical, self.morale)
    }

    /// Escaped share of the whole population at the latest row
    #[must_use]
    pub fn survival_rate(&self) -> f64 {
        match self.latest() {
            Some(row) if self.population > 0 => row.escaped as f64 / self.population as f64,
            _ => 0.0,
        }
    }

    /// History as CSV with a header row
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from(TickMetrics::CSV_HEADER);
        out.push('\n');
        for r in &self.history {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                r.tick,
                r.alive,
                r.dead,
                r.escaped,
                r.normal,
                r.panic,
                r.incapacitated,
                r.carrying,
                r.verbal,
                r.physical,
                r.morale,
                r.flooded_cells
            );
        }
        out
    }

    /// Write the history as a pretty-printed JSON array
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.history)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SpawnSpec;
    use crate::core_types::Coord;
    use crate::grid::Grid;
    use approx::assert_relative_eq;

    fn world_with(n: usize) -> World {
        let mut world = World::new(Grid::new(4, 4));
        for i in 0..n {
            world.spawn(SpawnSpec::at(Coord::new(0, i))).unwrap();
        }
        world
    }

    #[test]
    fn test_initial_row_counts_population() {
        let world = world_with(3);
        let metrics = MetricsCollector::new(&world);
        let row = metrics.latest().copied().unwrap();
        assert_eq!(row.tick, 0);
        assert_eq!(row.alive, 3);
        assert_eq!(row.normal, 3);
        assert_eq!(row.dead + row.escaped, 0);
    }

    #[test]
    fn test_deaths_and_escapes_are_counted() {
        let mut world = world_with(4);
        world.flood(Coord::new(0, 0)).unwrap();
        world.escape(crate::core_types::HumanId(1));
        let mut metrics = MetricsCollector::new(&world);
        let row = metrics.record(&world);
        assert_eq!(row.dead, 1);
        assert_eq!(row.escaped, 1);
        assert_eq!(row.alive, 2);
        assert_eq!(row.flooded_cells, 1);
        assert_relative_eq!(metrics.survival_rate(), 0.25);
    }

    #[test]
    fn test_collaboration_counters_accumulate() {
        let world = world_with(1);
        let mut metrics = MetricsCollector::new(&world);
        let outcome = CollaborationOutcome {
            verbal: 2,
            physical: 1,
            morale: 3,
            ..Default::default()
        };
        metrics.record_collaboration(&outcome);
        metrics.record_collaboration(&outcome);
        assert_eq!(metrics.collaboration_totals(), (4, 2, 6));
        assert_eq!(metrics.record(&world).morale, 6);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let world = world_with(2);
        let mut metrics = MetricsCollector::new(&world);
        metrics.record(&world);
        let csv = metrics.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("tick,alive"));
        assert_eq!(lines[1], "0,2,0,0,2,0,0,0,0,0,0,0");
    }

    #[test]
    fn test_empty_collector_survival_is_zero() {
        assert_relative_eq!(MetricsCollector::default().survival_rate(), 0.0);
    }
}
