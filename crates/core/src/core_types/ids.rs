//! Stable identifiers for simulation entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a human agent, assigned sequentially at spawn
///
/// Also the index of the human in the world's population table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HumanId(pub u32);

impl HumanId {
    /// Index into the population table
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "human#{}", self.0)
    }
}
