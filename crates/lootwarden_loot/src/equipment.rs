//! Spawn equipment for mobs.
//!
//! Each configured item is rolled once when a mob of the matching type
//! spawns. At most one item lands in each slot: the first successful entry
//! for a slot wins.

use std::collections::{BTreeMap, HashMap};

use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::{ItemCatalog, ItemStack, MobType};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chance::roll_success;
use crate::error::{LootError, LootResult};
use crate::table::LoadReport;

/// Equipment slot on a living entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentSlot {
    /// Helmet.
    Head,
    /// Chestplate.
    Chest,
    /// Leggings.
    Legs,
    /// Boots.
    Feet,
    /// Main hand.
    MainHand,
    /// Off hand.
    OffHand,
}

/// An equipment entry as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawEquipmentEntry {
    /// Custom item id.
    #[serde(default, alias = "item")]
    pub oraxen_item: Option<String>,
    /// Target slot.
    pub slot: EquipmentSlot,
    /// Chance (percent) the mob spawns wearing the item.
    pub chance: f64,
    /// Chance (percent) the item drops when the mob dies.
    #[serde(default)]
    pub drop_chance: f64,
}

/// A validated equipment entry.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentEntry {
    /// Custom item id.
    pub item_id: String,
    /// Target slot.
    pub slot: EquipmentSlot,
    /// Spawn chance in percent.
    pub chance: f64,
    /// Death drop chance in percent.
    pub drop_chance: f64,
}

impl EquipmentEntry {
    /// Validates a raw entry.
    pub fn from_raw(raw: &RawEquipmentEntry, catalog: &dyn ItemCatalog) -> LootResult<Self> {
        let item_id = raw.oraxen_item.clone().ok_or(LootError::MissingItem)?;
        if !catalog.exists(&item_id) {
            return Err(LootError::UnknownItem(item_id));
        }
        if !(raw.chance > 0.0 && raw.chance <= 100.0) {
            return Err(LootError::ChanceOutOfRange {
                item_id,
                chance: raw.chance,
            });
        }
        if !(0.0..=100.0).contains(&raw.drop_chance) {
            return Err(LootError::ChanceOutOfRange {
                item_id,
                chance: raw.drop_chance,
            });
        }
        Ok(Self {
            item_id,
            slot: raw.slot,
            chance: raw.chance,
            drop_chance: raw.drop_chance,
        })
    }
}

/// An item to place on a freshly spawned mob.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentAssignment {
    /// Target slot.
    pub slot: EquipmentSlot,
    /// The item.
    pub stack: ItemStack,
    /// Death drop chance as a fraction in `[0, 1]`.
    pub drop_chance: f32,
}

/// Equipment entries keyed by mob type.
#[derive(Clone, Debug, Default)]
pub struct EquipmentTable {
    entries: HashMap<String, Vec<EquipmentEntry>>,
}

impl EquipmentTable {
    /// Loads the `mob-equipment` section.
    pub fn from_section(
        raw: &BTreeMap<String, Vec<RawEquipmentEntry>>,
        catalog: &dyn ItemCatalog,
    ) -> (Self, LoadReport) {
        let mut table = Self::default();
        let mut report = LoadReport::default();
        for (mob, raw_entries) in raw {
            if MobType::find(mob).is_none() {
                report.rejected += raw_entries.len().max(1);
                tracing::warn!(mob = %mob, "Skipping equipment for unknown mob type");
                continue;
            }
            for raw_entry in raw_entries {
                match EquipmentEntry::from_raw(raw_entry, catalog) {
                    Ok(entry) => {
                        report.accepted += 1;
                        table.entries.entry(normalize_id(mob)).or_default().push(entry);
                    }
                    Err(error) => {
                        report.rejected += 1;
                        tracing::warn!(mob = %mob, %error, "Skipping invalid equipment entry");
                    }
                }
            }
        }
        (table, report)
    }

    /// Returns true if the mob type has equipment configured.
    #[must_use]
    pub fn has_equipment(&self, mob: &str) -> bool {
        self.entries.contains_key(&normalize_id(mob))
    }

    /// Rolls spawn equipment with the thread RNG.
    #[must_use]
    pub fn roll(&self, mob: &str, catalog: &dyn ItemCatalog) -> Vec<EquipmentAssignment> {
        self.roll_with_rng(mob, catalog, &mut rand::thread_rng())
    }

    /// Rolls spawn equipment.
    pub fn roll_with_rng<R: Rng + ?Sized>(
        &self,
        mob: &str,
        catalog: &dyn ItemCatalog,
        rng: &mut R,
    ) -> Vec<EquipmentAssignment> {
        let Some(entries) = self.entries.get(&normalize_id(mob)) else {
            return Vec::new();
        };
        let mut assignments: Vec<EquipmentAssignment> = Vec::new();
        for entry in entries {
            if assignments.iter().any(|a| a.slot == entry.slot) {
                continue;
            }
            if !roll_success(entry.chance, rng) {
                continue;
            }
            if let Some(stack) = catalog.build_stack(&entry.item_id, 1) {
                #[allow(clippy::cast_possible_truncation)]
                let drop_chance = (entry.drop_chance / 100.0) as f32;
                assignments.push(EquipmentAssignment {
                    slot: entry.slot,
                    stack,
                    drop_chance,
                });
            }
        }
        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::MemoryCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_first_entry_per_slot_wins() {
        let text = r#"
            [[zombie]]
            oraxen-item = "ruby_helmet"
            slot = "head"
            chance = 100.0
            drop-chance = 50.0

            [[zombie]]
            oraxen-item = "onyx_helmet"
            slot = "head"
            chance = 100.0

            [[zombie]]
            oraxen-item = "ruby_sword"
            slot = "main-hand"
            chance = 100.0
        "#;
        let raw: BTreeMap<String, Vec<RawEquipmentEntry>> = toml::from_str(text).unwrap();
        let catalog = MemoryCatalog::new(["ruby_helmet", "onyx_helmet", "ruby_sword"]);
        let (table, report) = EquipmentTable::from_section(&raw, &catalog);
        assert_eq!(report.accepted, 3);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let assignments = table.roll_with_rng("ZOMBIE", &catalog, &mut rng);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].stack.item_id, "ruby_helmet");
        assert!((assignments[0].drop_chance - 0.5).abs() < f32::EPSILON);
        assert_eq!(assignments[1].slot, EquipmentSlot::MainHand);
    }

    #[test]
    fn test_unknown_mob_and_item_rejected() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "dragonfly".to_string(),
            vec![RawEquipmentEntry {
                oraxen_item: Some("ruby_helmet".into()),
                slot: EquipmentSlot::Head,
                chance: 10.0,
                drop_chance: 0.0,
            }],
        );
        raw.insert(
            "skeleton".to_string(),
            vec![RawEquipmentEntry {
                oraxen_item: Some("missing".into()),
                slot: EquipmentSlot::Head,
                chance: 10.0,
                drop_chance: 0.0,
            }],
        );
        let catalog = MemoryCatalog::new(["ruby_helmet"]);
        let (table, report) = EquipmentTable::from_section(&raw, &catalog);
        assert_eq!(report.rejected, 2);
        assert!(!table.has_equipment("skeleton"));
    }
}
