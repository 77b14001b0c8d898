//! # Structure Loot Resolution
//!
//! Chest loot is configured under short keys (`village`, `ancient_city`) but
//! the host reports namespaced loot-table ids
//! (`minecraft:chests/village/village_weaponsmith`). Resolution is a cascade
//! that stops at the first hit:
//!
//! 1. The raw id, lowercased, is a configured key.
//! 2. The trailing path segment is a configured key.
//! 3. The segment (or failing that, an earlier path segment) belongs to a
//!    catalogued structure whose id overlaps a configured key.
//! 4. The segment and a configured key contain one another.
//!
//! When steps 3 and 4 find several overlapping keys, the closest one wins: an
//! exact match first, then the key nearest in length. Remaining ties go to the
//! key loaded first, and a config section loads in key order.

use std::collections::HashMap;

use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::{ItemCatalog, ItemStack, StructureType};
use rand::Rng;

use crate::chance::ChanceModel;
use crate::table::{roll_entries, validate_entries, DropEntry, DropSection, LoadReport};

#[derive(Clone, Debug)]
struct StructureEntry {
    key: String,
    normalized: String,
    drops: Vec<DropEntry>,
}

/// Resolves host loot-table ids to configured chest loot.
#[derive(Clone, Debug, Default)]
pub struct StructureLootResolver {
    entries: Vec<StructureEntry>,
    by_key: HashMap<String, usize>,
    model: ChanceModel,
}

impl StructureLootResolver {
    /// Loads the `chest-loot` section.
    pub fn from_section(
        raw: &DropSection,
        catalog: &dyn ItemCatalog,
        model: ChanceModel,
    ) -> (Self, LoadReport) {
        let mut resolver = Self {
            model,
            ..Self::default()
        };
        let mut report = LoadReport::default();
        for (key, raw_entries) in raw {
            let drops = validate_entries("chest-loot", key, raw_entries, catalog, &mut report);
            if drops.is_empty() || normalize_id(key).is_empty() {
                continue;
            }
            resolver.insert(key, drops);
        }
        tracing::info!(
            structures = resolver.entries.len(),
            accepted = report.accepted,
            rejected = report.rejected,
            "Chest loot loaded"
        );
        (resolver, report)
    }

    /// Adds a configured key. Later keys never shadow earlier ones.
    pub fn insert(&mut self, key: &str, drops: Vec<DropEntry>) {
        let lowered = key.trim().to_lowercase();
        if let Some(&index) = self.by_key.get(&lowered) {
            self.entries[index].drops.extend(drops);
            return;
        }
        self.by_key.insert(lowered, self.entries.len());
        self.entries.push(StructureEntry {
            key: key.to_string(),
            normalized: normalize_id(key),
            drops,
        });
    }

    /// Number of configured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no chest loot is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured key a raw loot-table id resolves to.
    #[must_use]
    pub fn resolve_key(&self, raw: &str) -> Option<&str> {
        self.resolve_index(raw).map(|index| self.entries[index].key.as_str())
    }

    /// Drop entries a raw loot-table id resolves to.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<&[DropEntry]> {
        self.resolve_index(raw)
            .map(|index| self.entries[index].drops.as_slice())
    }

    /// Rolls chest loot for a raw id with the thread RNG.
    #[must_use]
    pub fn get_drops(&self, raw: &str, level: u32, catalog: &dyn ItemCatalog) -> Vec<ItemStack> {
        self.get_drops_with_rng(raw, level, catalog, &mut rand::thread_rng())
    }

    /// Rolls chest loot for a raw id.
    pub fn get_drops_with_rng<R: Rng + ?Sized>(
        &self,
        raw: &str,
        level: u32,
        catalog: &dyn ItemCatalog,
        rng: &mut R,
    ) -> Vec<ItemStack> {
        self.resolve(raw)
            .map(|drops| roll_entries(drops, level, self.model, catalog, rng))
            .unwrap_or_default()
    }

    fn resolve_index(&self, raw: &str) -> Option<usize> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(&index) = self.by_key.get(&raw.to_lowercase()) {
            return Some(index);
        }

        let path = raw.rsplit_once(':').map_or(raw, |(_, path)| path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.last().copied()?;
        if let Some(&index) = self.by_key.get(&last.to_lowercase()) {
            return Some(index);
        }

        let structure = StructureType::from_loot_segment(last).or_else(|| {
            segments
                .iter()
                .rev()
                .skip(1)
                .find_map(|segment| StructureType::from_loot_segment(segment))
        });
        if let Some(structure) = structure {
            if let Some(index) = self.closest(structure.id) {
                return Some(index);
            }
        }

        self.closest(&normalize_id(last))
    }

    fn closest(&self, target: &str) -> Option<usize> {
        if target.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                !entry.normalized.is_empty()
                    && (entry.normalized.contains(target) || target.contains(&entry.normalized))
            })
            .min_by_key(|(_, entry)| entry.normalized.len().abs_diff(target.len()))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::MemoryCatalog;

    fn resolver(keys: &[&str]) -> StructureLootResolver {
        let catalog = MemoryCatalog::new(["ruby"]);
        let mut resolver = StructureLootResolver::default();
        for key in keys {
            let entry = DropEntry::new("ruby", 50.0, 1, 1, &catalog).unwrap();
            resolver.insert(key, vec![entry]);
        }
        resolver
    }

    #[test]
    fn test_direct_match() {
        let resolver = resolver(&["minecraft:chests/simple_dungeon", "village"]);
        assert_eq!(
            resolver.resolve_key("MINECRAFT:CHESTS/SIMPLE_DUNGEON"),
            Some("minecraft:chests/simple_dungeon")
        );
    }

    #[test]
    fn test_trailing_segment_match() {
        let resolver = resolver(&["desert_pyramid"]);
        assert_eq!(resolver.resolve_key("minecraft:chests/desert_pyramid"), Some("desert_pyramid"));
    }

    #[test]
    fn test_village_profession_maps_to_village() {
        let resolver = resolver(&["village"]);
        assert_eq!(resolver.resolve_key("minecraft:village/plains/weaponsmith"), Some("village"));
        assert_eq!(
            resolver.resolve_key("minecraft:chests/village/village_toolsmith"),
            Some("village")
        );
    }

    #[test]
    fn test_catalogued_alias_match() {
        let resolver = resolver(&["ancient_city"]);
        assert_eq!(
            resolver.resolve_key("minecraft:chests/ancient_city_ice_box"),
            Some("ancient_city")
        );
    }

    #[test]
    fn test_substring_fallback() {
        let resolver = resolver(&["tower"]);
        assert_eq!(resolver.resolve_key("custom:loot/wizard_tower_top"), Some("tower"));
    }

    #[test]
    fn test_closest_key_wins() {
        for keys in [["shipwreck", "shipwreck_treasure"], ["shipwreck_treasure", "shipwreck"]] {
            let resolver = resolver(&keys);
            assert_eq!(resolver.resolve_key("minecraft:chests/shipwreck_map"), Some("shipwreck"));
        }
        let resolver = resolver(&["tower", "wizard_tower_top"]);
        assert_eq!(resolver.resolve_key("custom:loot/wizard_tower"), Some("wizard_tower_top"));
    }

    #[test]
    fn test_exact_structure_beats_longer_key_from_toml() {
        let text = r#"
            [[village]]
            oraxen-item = "ruby"
            chance = 10.0

            [[abandoned_village]]
            oraxen-item = "ruby"
            chance = 10.0
        "#;
        let section: DropSection = toml::from_str(text).unwrap();
        let catalog = MemoryCatalog::new(["ruby"]);
        let (resolver, report) = StructureLootResolver::from_section(&section, &catalog, ChanceModel::Tiered);

        assert_eq!(report.accepted, 2);
        assert_eq!(
            resolver.resolve_key("minecraft:chests/village/village_weaponsmith"),
            Some("village")
        );
        assert_eq!(
            resolver.resolve_key("minecraft:chests/abandoned_village"),
            Some("abandoned_village")
        );
    }

    #[test]
    fn test_no_match() {
        let resolver = resolver(&["village"]);
        assert_eq!(resolver.resolve_key("minecraft:chests/end_city_treasure"), None);
        assert_eq!(resolver.resolve_key(""), None);
    }
}
