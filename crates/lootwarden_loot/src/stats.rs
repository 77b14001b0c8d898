//! Drop statistics by simulation.
//!
//! Used by the simulator binary and benches to check configured rates.

use std::collections::BTreeMap;

use lootwarden_shared::ItemCatalog;
use rand::Rng;

use crate::table::LootTable;

/// Aggregated results of repeated rolls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LootStatistics {
    /// Number of triggers simulated.
    pub total_rolls: u64,
    /// Triggers that produced at least one item.
    pub rolls_with_drops: u64,
    /// Per item: (times dropped, total amount).
    pub item_counts: BTreeMap<String, (u64, u64)>,
}

impl LootStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of triggers that dropped something.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn drop_rate_percent(&self) -> f64 {
        if self.total_rolls == 0 {
            0.0
        } else {
            (self.rolls_with_drops as f64 / self.total_rolls as f64) * 100.0
        }
    }

    /// Observed drop rate of one item, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn item_rate_percent(&self, item_id: &str) -> f64 {
        match self.item_counts.get(item_id) {
            Some((hits, _)) if self.total_rolls > 0 => (*hits as f64 / self.total_rolls as f64) * 100.0,
            _ => 0.0,
        }
    }
}

/// Rolls `key` `iterations` times and aggregates the results.
pub fn run_statistics<R: Rng + ?Sized>(
    table: &LootTable,
    key: &str,
    level: u32,
    catalog: &dyn ItemCatalog,
    iterations: u64,
    rng: &mut R,
) -> LootStatistics {
    let mut stats = LootStatistics::new();
    for _ in 0..iterations {
        let drops = table.get_drops_with_rng(key, level, catalog, rng);
        stats.total_rolls += 1;
        if !drops.is_empty() {
            stats.rolls_with_drops += 1;
        }
        for stack in drops {
            let entry = stats.item_counts.entry(stack.item_id).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += u64::from(stack.amount);
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::{final_chance, ChanceModel};
    use crate::table::DropEntry;
    use lootwarden_shared::MemoryCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_observed_rate_matches_final_chance() {
        let catalog = MemoryCatalog::new(["ruby"]);
        let mut table = LootTable::new(ChanceModel::Tiered);
        table.insert("diamond_ore", vec![DropEntry::new("ruby", 20.0, 1, 1, &catalog).unwrap()]);

        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let stats = run_statistics(&table, "diamond_ore", 3, &catalog, 100_000, &mut rng);
        let expected = final_chance(20.0, 3);
        assert!((stats.item_rate_percent("ruby") - expected).abs() < 1.0);
        assert_eq!(stats.total_rolls, 100_000);
    }
}
