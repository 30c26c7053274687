//! Counted ammunition carried by a unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ammunition families. Each ballistic or missile weapon draws from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmmoType {
    /// Machine gun rounds.
    MachineGun,
    /// AC/2 shells.
    Autocannon2,
    /// AC/5 shells.
    Autocannon5,
    /// AC/10 shells.
    Autocannon10,
    /// AC/20 shells.
    Autocannon20,
    /// Gauss slugs.
    Gauss,
    /// Long-range missiles.
    Lrm,
    /// Short-range missiles.
    Srm,
    /// Streak short-range missiles.
    StreakSrm,
    /// Medium-range missiles.
    Mrm,
}

/// Rounds of one ammo type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoBin {
    /// Rounds remaining.
    pub count: u32,
    /// Rounds when full.
    pub max: u32,
}

impl AmmoBin {
    /// Full bin of `max` rounds.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { count: max, max }
    }
}

/// Per-type ammunition counters.
///
/// Consumption fails closed: a request that cannot be met in full takes
/// nothing and reports failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoStock {
    bins: BTreeMap<AmmoType, AmmoBin>,
}

impl AmmoStock {
    /// Empty stock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rounds` to a type, growing its capacity by the same amount.
    pub fn add_rounds(&mut self, ammo_type: AmmoType, rounds: u32) {
        let bin = self.bins.entry(ammo_type).or_default();
        bin.count = bin.count.saturating_add(rounds);
        bin.max = bin.max.saturating_add(rounds);
    }

    /// Rounds remaining for a type (0 when none carried).
    #[must_use]
    pub fn count(&self, ammo_type: AmmoType) -> u32 {
        self.bins.get(&ammo_type).map_or(0, |b| b.count)
    }

    /// Capacity for a type (0 when none carried).
    #[must_use]
    pub fn max(&self, ammo_type: AmmoType) -> u32 {
        self.bins.get(&ammo_type).map_or(0, |b| b.max)
    }

    /// True when at least `rounds` of the type remain.
    #[must_use]
    pub fn has(&self, ammo_type: AmmoType, rounds: u32) -> bool {
        self.count(ammo_type) >= rounds
    }

    /// Take `rounds` of a type. Returns `false` and takes nothing if short.
    pub fn consume(&mut self, ammo_type: AmmoType, rounds: u32) -> bool {
        match self.bins.get_mut(&ammo_type) {
            Some(bin) if bin.count >= rounds => {
                bin.count -= rounds;
                true
            }
            _ => false,
        }
    }

    /// Restore every bin to capacity.
    pub fn refill(&mut self) {
        for bin in self.bins.values_mut() {
            bin.count = bin.max;
        }
    }

    /// Iterate bins in ammo type order.
    pub fn iter(&self) -> impl Iterator<Item = (AmmoType, AmmoBin)> + '_ {
        self.bins.iter().map(|(t, b)| (*t, *b))
    }

    /// True when no ammo type is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let mut stock = AmmoStock::new();
        stock.add_rounds(AmmoType::Lrm, 120);
        stock.add_rounds(AmmoType::Lrm, 120);
        assert_eq!(stock.count(AmmoType::Lrm), 240);
        assert_eq!(stock.max(AmmoType::Lrm), 240);
        assert_eq!(stock.count(AmmoType::Srm), 0);
    }

    #[test]
    fn test_consume_fails_closed() {
        let mut stock = AmmoStock::new();
        stock.add_rounds(AmmoType::Autocannon20, 5);

        assert!(stock.consume(AmmoType::Autocannon20, 3));
        assert_eq!(stock.count(AmmoType::Autocannon20), 2);

        assert!(!stock.consume(AmmoType::Autocannon20, 3));
        assert_eq!(stock.count(AmmoType::Autocannon20), 2);

        assert!(!stock.consume(AmmoType::Gauss, 1));
    }

    #[test]
    fn test_refill() {
        let mut stock = AmmoStock::new();
        stock.add_rounds(AmmoType::MachineGun, 200);
        assert!(stock.consume(AmmoType::MachineGun, 150));
        stock.refill();
        assert_eq!(stock.count(AmmoType::MachineGun), 200);
    }
}
