//! Building grid: terrain, occupancy and floorplan loading

pub mod floorplan;
pub mod terrain;

// Re-export main types
pub use floorplan::Floorplan;
pub use terrain::{Grid, Terrain};
