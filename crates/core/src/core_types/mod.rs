//! Core types shared by every simulation module

pub mod coord;
pub mod ids;

pub use coord::Coord;
pub use ids::HumanId;
