//! # Elite Mobs
//!
//! Elites are rare variants of ordinary mobs. When a mob spawns, the
//! definitions for its type are tried in elite-id order, each with its own
//! spawn chance; the first success turns the mob into that elite. Elites carry
//! scaled attributes, abilities and a private drop table keyed by elite id.

use std::collections::{BTreeMap, HashSet};

use lootwarden_loot::table::validate_entries;
use lootwarden_loot::{ChanceModel, LoadReport, LootTable, RawDropEntry};
use lootwarden_loot::chance::roll_success;
use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::{BiomeType, ItemCatalog, ItemStack, MobType};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ability::AbilitySpec;
use crate::error::{MobsError, MobsResult};

const fn default_multiplier() -> f64 {
    1.0
}

const fn default_spawn_chance() -> f64 {
    5.0
}

/// An `[elite-mobs.<id>]` table as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawEliteMob {
    /// Base mob type.
    pub mob_type: String,
    /// Name shown above the mob.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Chance (percent) that a spawning mob of this type becomes this elite.
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f64,
    /// Max health multiplier.
    #[serde(default = "default_multiplier")]
    pub health_multiplier: f64,
    /// Attack damage multiplier.
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f64,
    /// Biomes the elite may spawn in. Empty means anywhere.
    #[serde(default)]
    pub biomes: Vec<String>,
    /// Attached abilities.
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
    /// Private drop table.
    #[serde(default)]
    pub drops: Vec<RawDropEntry>,
}

/// A validated elite definition.
#[derive(Clone, Debug, PartialEq)]
pub struct EliteDefinition {
    /// Config id.
    pub id: String,
    /// Base mob type id.
    pub mob_type: &'static str,
    /// Name shown above the mob.
    pub display_name: String,
    /// Spawn chance in percent.
    pub spawn_chance: f64,
    /// Max health multiplier.
    pub health_multiplier: f64,
    /// Attack damage multiplier.
    pub damage_multiplier: f64,
    /// Allowed biomes, `None` for anywhere.
    pub biomes: Option<HashSet<&'static str>>,
    /// Attached abilities.
    pub abilities: Vec<AbilitySpec>,
}

impl EliteDefinition {
    /// Validates a raw definition. Drops are validated separately.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown mob types or biomes, or out-of-range
    /// numbers.
    pub fn from_raw(id: &str, raw: &RawEliteMob) -> MobsResult<Self> {
        let mob = MobType::find(&raw.mob_type).ok_or_else(|| MobsError::UnknownMob(raw.mob_type.clone()))?;
        if !(raw.spawn_chance > 0.0 && raw.spawn_chance <= 100.0) {
            return Err(MobsError::InvalidChance(raw.spawn_chance));
        }
        for (field, value) in [
            ("health-multiplier", raw.health_multiplier),
            ("damage-multiplier", raw.damage_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MobsError::NonPositive { field, value });
            }
        }
        let biomes = if raw.biomes.is_empty() {
            None
        } else {
            let mut set = HashSet::new();
            for biome in &raw.biomes {
                let found = BiomeType::find(biome).ok_or_else(|| MobsError::UnknownBiome(biome.clone()))?;
                set.insert(found.id);
            }
            Some(set)
        };
        Ok(Self {
            id: normalize_id(id),
            mob_type: mob.id,
            display_name: raw.display_name.clone().unwrap_or_else(|| mob.display_name.to_string()),
            spawn_chance: raw.spawn_chance,
            health_multiplier: raw.health_multiplier,
            damage_multiplier: raw.damage_multiplier,
            biomes,
            abilities: raw.abilities.clone(),
        })
    }

    /// Returns true if the elite may spawn in `biome`.
    #[must_use]
    pub fn allows_biome(&self, biome: Option<&str>) -> bool {
        match (&self.biomes, biome) {
            (None, _) => true,
            (Some(set), Some(biome)) => set.contains(normalize_id(biome).as_str()),
            (Some(_), None) => false,
        }
    }
}

/// All elite definitions plus their drop tables.
#[derive(Clone, Debug, Default)]
pub struct EliteRegistry {
    definitions: Vec<EliteDefinition>,
    drops: LootTable,
}

impl EliteRegistry {
    /// Loads the `elite-mobs` section.
    pub fn from_section(
        raw: &BTreeMap<String, RawEliteMob>,
        catalog: &dyn ItemCatalog,
        model: ChanceModel,
    ) -> (Self, LoadReport) {
        let mut registry = Self {
            definitions: Vec::new(),
            drops: LootTable::new(model),
        };
        let mut report = LoadReport::default();
        for (id, raw_elite) in raw {
            match EliteDefinition::from_raw(id, raw_elite) {
                Ok(definition) => {
                    let drops = validate_entries("elite-mobs", id, &raw_elite.drops, catalog, &mut report);
                    registry.drops.insert(&definition.id, drops);
                    report.accepted += 1;
                    registry.definitions.push(definition);
                }
                Err(error) => {
                    report.rejected += 1;
                    tracing::warn!(elite = %id, %error, "Skipping invalid elite mob");
                }
            }
        }
        tracing::info!(elites = registry.definitions.len(), "Elite mobs loaded");
        (registry, report)
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EliteDefinition> {
        let id = normalize_id(id);
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no elite is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Rolls whether a spawning mob becomes an elite, with the thread RNG.
    #[must_use]
    pub fn roll_elite(&self, mob_type: &str, biome: Option<&str>) -> Option<&EliteDefinition> {
        self.roll_elite_with_rng(mob_type, biome, &mut rand::thread_rng())
    }

    /// Rolls whether a spawning mob becomes an elite.
    pub fn roll_elite_with_rng<R: Rng + ?Sized>(
        &self,
        mob_type: &str,
        biome: Option<&str>,
        rng: &mut R,
    ) -> Option<&EliteDefinition> {
        let mob_type = normalize_id(mob_type);
        self.definitions
            .iter()
            .filter(|d| d.mob_type == mob_type && d.allows_biome(biome))
            .find(|d| roll_success(d.spawn_chance, rng))
    }

    /// Rolls an elite's private drops with the thread RNG.
    #[must_use]
    pub fn elite_drops(&self, id: &str, level: u32, catalog: &dyn ItemCatalog) -> Vec<ItemStack> {
        self.drops.get_drops(id, level, catalog)
    }

    /// Rolls an elite's private drops.
    pub fn elite_drops_with_rng<R: Rng + ?Sized>(
        &self,
        id: &str,
        level: u32,
        catalog: &dyn ItemCatalog,
        rng: &mut R,
    ) -> Vec<ItemStack> {
        self.drops.get_drops_with_rng(id, level, catalog, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::MemoryCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn load(text: &str) -> (EliteRegistry, LoadReport) {
        let raw: BTreeMap<String, RawEliteMob> = toml::from_str(text).unwrap();
        let catalog = MemoryCatalog::new(["warlord_blade", "bone_shard"]);
        EliteRegistry::from_section(&raw, &catalog, ChanceModel::Tiered)
    }

    const CONFIG: &str = r#"
        [zombie_warlord]
        mob-type = "zombie"
        display-name = "Zombie Warlord"
        spawn-chance = 100.0
        health-multiplier = 3.0
        biomes = ["plains", "forest"]
        abilities = [{ type = "heal", amount = 4.0 }]

        [[zombie_warlord.drops]]
        oraxen-item = "warlord_blade"
        chance = 100.0

        [bone_lord]
        mob-type = "skeleton"
        spawn-chance = 100.0

        [broken]
        mob-type = "dragonfly"
    "#;

    #[test]
    fn test_invalid_elites_skipped() {
        let (registry, report) = load(CONFIG);
        assert_eq!(registry.len(), 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(registry.get("bone_lord").map(|d| d.display_name.as_str()), Some("Skeleton"));
    }

    #[test]
    fn test_biome_restriction() {
        let (registry, _) = load(CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(registry.roll_elite_with_rng("zombie", Some("minecraft:plains"), &mut rng).is_some());
        assert!(registry.roll_elite_with_rng("zombie", Some("desert"), &mut rng).is_none());
        assert!(registry.roll_elite_with_rng("zombie", None, &mut rng).is_none());
        assert!(registry.roll_elite_with_rng("skeleton", None, &mut rng).is_some());
        assert!(registry.roll_elite_with_rng("creeper", None, &mut rng).is_none());
    }

    #[test]
    fn test_private_drops() {
        let (registry, _) = load(CONFIG);
        let catalog = MemoryCatalog::new(["warlord_blade"]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let drops = registry.elite_drops_with_rng("zombie_warlord", 0, &catalog, &mut rng);
        assert_eq!(drops, vec![ItemStack::new("warlord_blade", 1)]);
        assert!(registry.elite_drops_with_rng("bone_lord", 0, &catalog, &mut rng).is_empty());
    }
}
