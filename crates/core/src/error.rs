//! Error types for simulation construction and grid access
//!
//! Configuration and floorplan problems surface from constructors before any tick
//! runs. Stochastic transitions never fail, and an agent that cannot reach an exit
//! is a valid outcome rather than an error.

use crate::core_types::Coord;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EvacError>;

/// Everything that can go wrong while building or querying a simulation
#[derive(Debug, Error)]
pub enum EvacError {
    /// A configuration parameter is outside its allowed range
    #[error("invalid configuration parameter '{param}': {message}")]
    InvalidConfig {
        /// Name of the offending parameter (e.g. `"fire_probability"`)
        param: &'static str,
        /// Human readable constraint description
        message: String,
    },

    /// A coordinate lies outside the grid extents
    #[error("coordinate {coord} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        /// The rejected coordinate
        coord: Coord,
        /// Grid height in cells
        rows: usize,
        /// Grid width in cells
        cols: usize,
    },

    /// The floorplan text could not be parsed
    #[error("malformed floorplan at line {line}: {message}")]
    Floorplan {
        /// 1-based line number in the floorplan source (0 when not line specific)
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Not enough free cells (or spawn markers) to place every human
    #[error("cannot place {requested} humans, only {available} spawn cells available")]
    InsufficientSpawnPoints {
        /// Humans requested by `human_count`
        requested: usize,
        /// Cells that could host a human
        available: usize,
    },

    /// Reading a floorplan or writing metrics failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Metrics export failed to serialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EvacError {
    /// Build an [`EvacError::InvalidConfig`] from a parameter name and message
    pub(crate) fn config(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            param,
            message: message.into(),
        }
    }

    /// Build an [`EvacError::Floorplan`] from a line number and message
    pub(crate) fn floorplan(line: usize, message: impl Into<String>) -> Self {
        Self::Floorplan {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = EvacError::config("human_count", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration parameter 'human_count': must be positive, got 0"
        );

        let err = EvacError::OutOfBounds {
            coord: Coord::new(12, 3),
            rows: 10,
            cols: 10,
        };
        assert_eq!(err.to_string(), "coordinate (12, 3) is outside the 10x10 grid");
    }
}
