//! Carrier → carried relation
//!
//! Kept as an id table owned by the world rather than references between humans.
//! A human appears at most once on either side, and never on both.

use crate::core_types::HumanId;
use rustc_hash::FxHashMap;

/// Who is carrying whom
#[derive(Debug, Clone, Default)]
pub struct CarryTable {
    carrying: FxHashMap<HumanId, HumanId>,
    carried_by: FxHashMap<HumanId, HumanId>,
}

impl CarryTable {
    /// Record a new carry; refused if either human is already part of one
    pub fn begin(&mut self, carrier: HumanId, carried: HumanId) -> bool {
        if carrier == carried || self.is_involved(carrier) || self.is_involved(carried) {
            return false;
        }
        self.carrying.insert(carrier, carried);
        self.carried_by.insert(carried, carrier);
        true
    }

    /// End the carry started by `carrier`, returning who was carried
    pub fn release(&mut self, carrier: HumanId) -> Option<HumanId> {
        let carried = self.carrying.remove(&carrier)?;
        self.carried_by.remove(&carried);
        Some(carried)
    }

    /// Human carried by `carrier`
    #[must_use]
    pub fn carried_by(&self, carrier: HumanId) -> Option<HumanId> {
        self.carrying.get(&carrier).copied()
    }

    /// Human carrying `carried`
    #[must_use]
    pub fn carrier_of(&self, carried: HumanId) -> Option<HumanId> {
        self.carried_by.get(&carried).copied()
    }

    /// Whether the human carries or is carried
    #[must_use]
    pub fn is_involved(&self, id: HumanId) -> bool {
        self.carrying.contains_key(&id) || self.carried_by.contains_key(&id)
    }

    /// Number of active carries
    #[must_use]
    pub fn len(&self) -> usize {
        self.carrying.len()
    }

    /// Whether nobody is being carried
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carrying.is_empty()
    }

    /// `(carrier, carried)` pairs in ascending carrier order
    #[must_use]
    pub fn pairs(&self) -> Vec<(HumanId, HumanId)> {
        let mut pairs: Vec<_> = self.carrying.iter().map(|(a, b)| (*a, *b)).collect();
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_release() {
        let mut table = CarryTable::default();
        assert!(table.begin(HumanId(1), HumanId(2)));
        assert_eq!(table.carried_by(HumanId(1)), Some(HumanId(2)));
        assert_eq!(table.carrier_of(HumanId(2)), Some(HumanId(1)));
        assert_eq!(table.release(HumanId(1)), Some(HumanId(2)));
        assert!(table.is_empty());
        assert_eq!(table.release(HumanId(1)), None);
    }

    #[test]
    fn test_exclusivity() {
        let mut table = CarryTable::default();
        assert!(table.begin(HumanId(1), HumanId(2)));
        // Second carrier for the same human
        assert!(!table.begin(HumanId(3), HumanId(2)));
        // Carried human cannot carry
        assert!(!table.begin(HumanId(2), HumanId(4)));
        // Carrier cannot take a second passenger or be picked up
        assert!(!table.begin(HumanId(1), HumanId(4)));
        assert!(!table.begin(HumanId(5), HumanId(1)));
        assert!(!table.begin(HumanId(6), HumanId(6)));
        assert_eq!(table.pairs(), vec![(HumanId(1), HumanId(2))]);
    }
}
