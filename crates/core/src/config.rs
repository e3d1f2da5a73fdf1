//! Simulation configuration surface
//!
//! The seven named parameters a driver sets before a run, plus the behavioural
//! constants of the human model. Probabilities whose real-world values are unknown
//! (panic, incapacitation, morale) are exposed here rather than hard-coded.

use crate::core_types::Coord;
use crate::error::{EvacError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Initial hazard placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardSeeding {
    /// Flood `count` random dry, non-wall, non-exit, unoccupied cells
    Random {
        /// Number of seed cells
        count: usize,
    },
    /// Flood exactly these cells
    Fixed(Vec<Coord>),
}

impl Default for HazardSeeding {
    fn default() -> Self {
        Self::Random { count: 1 }
    }
}

/// Behavioural constants of the human decision model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorParams {
    /// Per-tick chance that a Normal human who sees the flood or a casualty panics
    pub panic_probability: f64,
    /// Per-tick chance that a Panic human becomes Incapacitated
    pub incapacitation_probability: f64,
    /// Per-tick chance that a calm collaborator talks a panicking one back to Normal
    pub morale_probability: f64,
    /// Weight of "move away from the flood" against weight 1.0 of the goal move
    pub flee_weight: f64,
    /// Multiplier applied to `flee_weight` while panicking
    pub panic_flee_multiplier: f64,
    /// Smallest sight radius drawn at spawn (cells, Chebyshev)
    pub min_sight_radius: usize,
    /// Largest sight radius drawn at spawn (cells, Chebyshev)
    pub max_sight_radius: usize,
    /// Whether furniture occludes line of sight (walls always do)
    pub furniture_blocks_sight: bool,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            panic_probability: 0.2,
            incapacitation_probability: 0.05,
            morale_probability: 0.5,
            flee_weight: 0.5,
            panic_flee_multiplier: 2.0,
            min_sight_radius: 2,
            max_sight_radius: 6,
            furniture_blocks_sight: true,
        }
    }
}

/// Everything needed to construct a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Floorplan file consumed by [`crate::Simulation::from_config`]
    pub floor_plan_file: PathBuf,
    /// Number of humans to spawn
    pub human_count: usize,
    /// Share of humans that take part in collaboration, 0-100
    pub collaboration_percentage: f64,
    /// Flood spread intensity per tick, 0.0-1.0
    pub fire_probability: f64,
    /// Spawn at random free cells instead of floorplan markers
    pub random_spawn: bool,
    /// Emit sight markers in the portrayal (display only)
    pub visualise_vision: bool,
    /// Ask the driver to persist metrics history (display only)
    pub save_plots: bool,
    /// RNG seed; drawn and logged when absent
    pub seed: Option<u64>,
    /// Initial flood placement
    pub hazard: HazardSeeding,
    /// Human behaviour constants
    pub behavior: BehaviorParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            floor_plan_file: PathBuf::from("floorplans/floorplan_default.txt"),
            human_count: 10,
            collaboration_percentage: 50.0,
            fire_probability: 0.1,
            random_spawn: true,
            visualise_vision: false,
            save_plots: true,
            seed: None,
            hazard: HazardSeeding::default(),
            behavior: BehaviorParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Check every parameter range
    ///
    /// Grid-dependent checks (fixed hazard seeds in bounds, enough spawn cells)
    /// happen when the world is built.
    pub fn validate(&self) -> Result<()> {
        if self.human_count == 0 {
            return Err(EvacError::config("human_count", "must be positive, got 0"));
        }
        if !(0.0..=100.0).contains(&self.collaboration_percentage) {
            return Err(EvacError::config(
                "collaboration_percentage",
                format!("must be within [0, 100], got {}", self.collaboration_percentage),
            ));
        }
        check_probability("fire_probability", self.fire_probability)?;

        let b = &self.behavior;
        check_probability("panic_probability", b.panic_probability)?;
        check_probability("incapacitation_probability", b.incapacitation_probability)?;
        check_probability("morale_probability", b.morale_probability)?;
        check_weight("flee_weight", b.flee_weight)?;
        check_weight("panic_flee_multiplier", b.panic_flee_multiplier)?;
        if b.min_sight_radius == 0 {
            return Err(EvacError::config("min_sight_radius", "must be at least 1"));
        }
        if b.min_sight_radius > b.max_sight_radius {
            return Err(EvacError::config(
                "max_sight_radius",
                format!(
                    "must be >= min_sight_radius ({}), got {}",
                    b.min_sight_radius, b.max_sight_radius
                ),
            ));
        }
        if let HazardSeeding::Fixed(cells) = &self.hazard {
            if cells.is_empty() {
                return Err(EvacError::config("hazard", "fixed seeding needs at least one cell"));
            }
        }
        Ok(())
    }

    /// Number of collaborating humans: `round(human_count * percentage / 100)`
    #[must_use]
    pub fn collaborator_count(&self) -> usize {
        let share = self.human_count as f64 * self.collaboration_percentage / 100.0;
        (share.round() as usize).min(self.human_count)
    }
}

fn check_probability(param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EvacError::config(param, format!("must be within [0, 1], got {value}")))
    }
}

fn check_weight(param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EvacError::config(param, format!("must be finite and non-negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_humans() {
        let config = SimulationConfig {
            human_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvacError::InvalidConfig { param: "human_count", .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        let config = SimulationConfig {
            collaboration_percentage: 120.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            fire_probability: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            fire_probability: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.behavior.min_sight_radius = 5;
        config.behavior.max_sight_radius = 3;
        assert!(matches!(
            config.validate(),
            Err(EvacError::InvalidConfig { param: "max_sight_radius", .. })
        ));
    }

    #[test]
    fn test_collaborator_count_rounds() {
        let config = SimulationConfig {
            human_count: 7,
            collaboration_percentage: 50.0,
            ..Default::default()
        };
        assert_eq!(config.collaborator_count(), 4);

        let config = SimulationConfig {
            human_count: 10,
            collaboration_percentage: 0.0,
            ..Default::default()
        };
        assert_eq!(config.collaborator_count(), 0);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let json = r#"{
            "human_count": 3,
            "fire_probability": 0.25,
            "hazard": {"Random": {"count": 2}}
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.human_count, 3);
        assert_eq!(config.hazard, HazardSeeding::Random { count: 2 });
        assert_eq!(config.behavior, BehaviorParams::default());
    }
}
