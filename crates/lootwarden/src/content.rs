//! Validated content built from a [`PluginConfig`].
//!
//! Built off to the side on enable and reload, then published whole through a
//! [`lootwarden_loot::Registry`].

use lootwarden_loot::{EquipmentTable, KeyKind, LoadReport, LootTable, StructureLootResolver};
use lootwarden_mobs::raid::{load_raids, RaidMap};
use lootwarden_mobs::EliteRegistry;
use lootwarden_quest::QuestPool;
use lootwarden_shared::ItemCatalog;

use crate::config::PluginConfig;

/// Per-section load counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentReport {
    /// `block-drops`.
    pub block_drops: LoadReport,
    /// `mob-drops`.
    pub mob_drops: LoadReport,
    /// `chest-loot`.
    pub chest_loot: LoadReport,
    /// `elite-mobs`.
    pub elite_mobs: LoadReport,
    /// `mob-equipment`.
    pub mob_equipment: LoadReport,
    /// `quests`.
    pub quests: LoadReport,
    /// `raids`.
    pub raids: LoadReport,
}

impl ContentReport {
    /// Sum over all sections.
    #[must_use]
    pub fn total(&self) -> LoadReport {
        let mut total = LoadReport::default();
        for section in [
            self.block_drops,
            self.mob_drops,
            self.chest_loot,
            self.elite_mobs,
            self.mob_equipment,
            self.quests,
            self.raids,
        ] {
            total.merge(section);
        }
        total
    }
}

/// Every validated table the listener and timers read.
#[derive(Clone, Debug, Default)]
pub struct LootContent {
    /// Drops per block material.
    pub block_drops: LootTable,
    /// Drops per mob type.
    pub mob_drops: LootTable,
    /// Chest loot.
    pub chest_loot: StructureLootResolver,
    /// Elite definitions and their drops.
    pub elites: EliteRegistry,
    /// Spawn equipment.
    pub equipment: EquipmentTable,
    /// Candidate quests.
    pub quest_pool: QuestPool,
    /// Raid definitions.
    pub raids: RaidMap,
    /// What was accepted and skipped.
    pub report: ContentReport,
}

impl LootContent {
    /// Validates every section of `config`. Invalid entries are skipped.
    #[must_use]
    pub fn build(config: &PluginConfig, catalog: &dyn ItemCatalog) -> Self {
        let model = config.settings.chance_model;
        let (block_drops, block_report) =
            LootTable::from_section("block-drops", &config.block_drops, KeyKind::Block, catalog, model);
        let (mob_drops, mob_report) =
            LootTable::from_section("mob-drops", &config.mob_drops, KeyKind::Mob, catalog, model);
        let (chest_loot, chest_report) = StructureLootResolver::from_section(&config.chest_loot, catalog, model);
        let (elites, elite_report) = EliteRegistry::from_section(&config.elite_mobs, catalog, model);
        let (equipment, equipment_report) = EquipmentTable::from_section(&config.mob_equipment, catalog);
        let (quest_pool, quests_rejected) = QuestPool::from_raw(&config.quests, catalog);
        let (raids, raid_report) = load_raids(&config.raids, catalog);

        let report = ContentReport {
            block_drops: block_report,
            mob_drops: mob_report,
            chest_loot: chest_report,
            elite_mobs: elite_report,
            mob_equipment: equipment_report,
            quests: LoadReport {
                accepted: quest_pool.len(),
                rejected: quests_rejected,
            },
            raids: raid_report,
        };
        let total = report.total();
        tracing::info!(
            accepted = total.accepted,
            rejected = total.rejected,
            model = ?model,
            "Loot content built"
        );
        Self {
            block_drops,
            mob_drops,
            chest_loot,
            elites,
            equipment,
            quest_pool,
            raids,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::MemoryCatalog;
    use std::path::Path;

    #[test]
    fn test_invalid_entries_skipped_per_section() {
        let text = r#"
            [[block-drops.diamond_ore]]
            oraxen-item = "ruby"
            chance = 5.0

            [[block-drops.diamond_ore]]
            oraxen-item = "ghost_item"
            chance = 5.0

            [[block-drops."bad!key"]]
            oraxen-item = "ruby"
            chance = 5.0

            [[mob-drops.zombie]]
            oraxen-item = "ruby"
            chance = 150.0

            [[quests]]
            required-item = "ruby"
            reward-item = "missing"
        "#;
        let config = PluginConfig::parse(text, Path::new("t.toml")).unwrap();
        let content = LootContent::build(&config, &MemoryCatalog::new(["ruby"]));

        assert!(content.block_drops.has_drops("diamond_ore"));
        assert_eq!(content.block_drops.entries("diamond_ore").map(<[_]>::len), Some(1));
        assert!(content.mob_drops.is_empty());
        assert!(content.quest_pool.is_empty());
        assert_eq!(content.report.quests, LoadReport { accepted: 0, rejected: 1 });
        assert_eq!(content.report.mob_drops.rejected, 1);
        assert!(content.report.total().rejected >= 4);
    }

    #[test]
    fn test_example_config_loads_cleanly() {
        let text = include_str!("../../../config/lootwarden.toml");
        let config = PluginConfig::parse(text, Path::new("config/lootwarden.toml")).unwrap();
        let catalog = MemoryCatalog::new([
            "ruby",
            "void_shard",
            "ember_core",
            "rotten_gem",
            "withered_bone",
            "echo_relic",
            "plague_heart",
            "iron_crown",
            "bone_bow",
            "crypt_key",
        ]);
        let content = LootContent::build(&config, &catalog);

        assert_eq!(content.report.total().rejected, 0);
        assert_eq!(content.block_drops.len(), 3);
        assert_eq!(content.chest_loot.resolve_key("minecraft:chests/village/village_weaponsmith"), Some("village"));
        assert_eq!(content.quest_pool.len(), 2);
        assert!(content.raids.contains_key("crypt"));
    }
}
