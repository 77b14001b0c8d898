//! Raid configuration: the `[raids.<id>]` tables.
//!
//! Everything here is validated once at load and immutable afterwards; a
//! running raid keeps the `Arc<RaidConfig>` it started with across reloads.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use lootwarden_loot::LoadReport;
use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::constants::{
    DEFAULT_PREPARATION_SECONDS, DEFAULT_RAID_RADIUS, DEFAULT_WAVE_DELAY_SECONDS,
};
use lootwarden_shared::{BiomeType, ItemCatalog, MobType};
use serde::{Deserialize, Serialize};

use crate::ability::AbilitySpec;
use crate::error::{MobsError, MobsResult};

const fn default_preparation() -> u32 {
    DEFAULT_PREPARATION_SECONDS
}

const fn default_wave_delay() -> u32 {
    DEFAULT_WAVE_DELAY_SECONDS
}

const fn default_radius() -> f64 {
    DEFAULT_RAID_RADIUS
}

const fn default_multiplier() -> f64 {
    1.0
}

const fn default_count() -> u32 {
    1
}

const fn default_health() -> f64 {
    20.0
}

const fn default_damage() -> f64 {
    3.0
}

/// A `[raids.<id>]` table as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawRaid {
    /// Name shown to players.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Allowed biome ids, or `"*"` for any.
    #[serde(default)]
    pub allowed_biomes: Vec<String>,
    /// Countdown before the first wave.
    #[serde(default = "default_preparation")]
    pub preparation_seconds: u32,
    /// Pause between a cleared wave and the next one.
    #[serde(default = "default_wave_delay")]
    pub wave_delay_seconds: u32,
    /// Scales mob health and damage.
    #[serde(default = "default_multiplier")]
    pub difficulty_multiplier: f64,
    /// Distance from the start point the player may roam.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Waves in order.
    #[serde(default)]
    pub waves: Vec<RawWave>,
    /// Completion reward.
    #[serde(default)]
    pub rewards: RawReward,
}

/// One wave as written in the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawWave {
    /// Spawn groups.
    #[serde(default)]
    pub mobs: Vec<RawMobSpawn>,
}

/// One spawn group as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawMobSpawn {
    /// Mob type.
    pub mob_type: String,
    /// How many to spawn.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Base max health.
    #[serde(default = "default_health")]
    pub health: f64,
    /// Base attack damage.
    #[serde(default = "default_damage")]
    pub damage: f64,
    /// Whether the mob gets its configured spawn equipment.
    #[serde(default)]
    pub equipment: bool,
    /// Attached abilities.
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
}

/// Reward section as written in the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawReward {
    /// Money deposited on completion.
    #[serde(default)]
    pub money: f64,
    /// Items given on completion.
    #[serde(default)]
    pub items: Vec<RawRewardItem>,
}

/// A reward item as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawRewardItem {
    /// Custom item id.
    #[serde(alias = "item")]
    pub oraxen_item: String,
    /// Stack size.
    #[serde(default = "default_count")]
    pub amount: u32,
}

/// Where a raid may be started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BiomeFilter {
    /// Anywhere.
    Any,
    /// Only in these biome ids.
    Only(HashSet<&'static str>),
}

impl BiomeFilter {
    /// Returns true if `biome` passes the filter.
    #[must_use]
    pub fn allows(&self, biome: Option<&str>) -> bool {
        match (self, biome) {
            (Self::Any, _) => true,
            (Self::Only(set), Some(biome)) => set.contains(normalize_id(biome).as_str()),
            (Self::Only(_), None) => false,
        }
    }
}

/// A validated spawn group.
#[derive(Clone, Debug, PartialEq)]
pub struct MobSpawnSpec {
    /// Mob type id.
    pub mob_type: &'static str,
    /// How many to spawn.
    pub count: u32,
    /// Base max health.
    pub health: f64,
    /// Base attack damage.
    pub damage: f64,
    /// Whether the mob gets its configured spawn equipment.
    pub equipment: bool,
    /// Attached abilities.
    pub abilities: Vec<AbilitySpec>,
}

/// A validated wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveConfig {
    /// Spawn groups.
    pub mobs: Vec<MobSpawnSpec>,
}

impl WaveConfig {
    /// Total mobs in the wave.
    #[must_use]
    pub fn mob_count(&self) -> u32 {
        self.mobs.iter().map(|m| m.count).sum()
    }
}

/// A validated completion reward.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardSpec {
    /// Money deposited on completion.
    pub money: f64,
    /// `(item id, amount)` pairs.
    pub items: Vec<(String, u32)>,
}

/// A validated raid.
#[derive(Clone, Debug, PartialEq)]
pub struct RaidConfig {
    /// Config id.
    pub id: String,
    /// Name shown to players.
    pub display_name: String,
    /// Where the raid may start.
    pub allowed_biomes: BiomeFilter,
    /// Countdown before the first wave.
    pub preparation_seconds: u32,
    /// Pause between waves.
    pub wave_delay_seconds: u32,
    /// Scales mob health and damage.
    pub difficulty_multiplier: f64,
    /// Distance from the anchor the player may roam.
    pub radius: f64,
    /// Waves in order.
    pub waves: Vec<WaveConfig>,
    /// Completion reward.
    pub rewards: RewardSpec,
}

fn positive(field: &'static str, value: f64) -> MobsResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MobsError::NonPositive { field, value })
    }
}

impl RaidConfig {
    /// Validates a raw raid.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: unknown mob, biome or item, empty
    /// waves, or a non-positive number.
    pub fn from_raw(id: &str, raw: &RawRaid, catalog: &dyn ItemCatalog) -> MobsResult<Self> {
        let allowed_biomes = if raw.allowed_biomes.is_empty() || raw.allowed_biomes.iter().any(|b| b.trim() == "*") {
            BiomeFilter::Any
        } else {
            let mut set = HashSet::new();
            for biome in &raw.allowed_biomes {
                let found = BiomeType::find(biome).ok_or_else(|| MobsError::UnknownBiome(biome.clone()))?;
                set.insert(found.id);
            }
            BiomeFilter::Only(set)
        };

        if raw.waves.is_empty() {
            return Err(MobsError::EmptyWave);
        }
        let mut waves = Vec::with_capacity(raw.waves.len());
        for raw_wave in &raw.waves {
            let mut mobs = Vec::with_capacity(raw_wave.mobs.len());
            for spawn in &raw_wave.mobs {
                let mob = MobType::find(&spawn.mob_type).ok_or_else(|| MobsError::UnknownMob(spawn.mob_type.clone()))?;
                mobs.push(MobSpawnSpec {
                    mob_type: mob.id,
                    count: spawn.count,
                    health: positive("health", spawn.health)?,
                    damage: positive("damage", spawn.damage)?,
                    equipment: spawn.equipment,
                    abilities: spawn.abilities.clone(),
                });
            }
            let wave = WaveConfig { mobs };
            if wave.mob_count() == 0 {
                return Err(MobsError::EmptyWave);
            }
            waves.push(wave);
        }

        if !raw.rewards.money.is_finite() || raw.rewards.money < 0.0 {
            return Err(MobsError::NonPositive {
                field: "rewards.money",
                value: raw.rewards.money,
            });
        }
        let mut items = Vec::with_capacity(raw.rewards.items.len());
        for item in &raw.rewards.items {
            if !catalog.exists(&item.oraxen_item) {
                return Err(MobsError::UnknownItem(item.oraxen_item.clone()));
            }
            items.push((item.oraxen_item.clone(), item.amount));
        }

        Ok(Self {
            id: normalize_id(id),
            display_name: raw.display_name.clone().unwrap_or_else(|| id.to_string()),
            allowed_biomes,
            preparation_seconds: raw.preparation_seconds,
            wave_delay_seconds: raw.wave_delay_seconds,
            difficulty_multiplier: positive("difficulty-multiplier", raw.difficulty_multiplier)?,
            radius: positive("radius", raw.radius)?,
            waves,
            rewards: RewardSpec {
                money: raw.rewards.money,
                items,
            },
        })
    }

    /// Number of waves.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }
}

/// Validates the `raids` section, skipping invalid raids.
pub fn load_raids(
    raw: &BTreeMap<String, RawRaid>,
    catalog: &dyn ItemCatalog,
) -> (HashMap<String, Arc<RaidConfig>>, LoadReport) {
    let mut raids = HashMap::new();
    let mut report = LoadReport::default();
    for (id, raw_raid) in raw {
        match RaidConfig::from_raw(id, raw_raid, catalog) {
            Ok(config) => {
                report.accepted += 1;
                raids.insert(config.id.clone(), Arc::new(config));
            }
            Err(error) => {
                report.rejected += 1;
                tracing::warn!(raid = %id, %error, "Skipping invalid raid");
            }
        }
    }
    tracing::info!(raids = raids.len(), rejected = report.rejected, "Raids loaded");
    (raids, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::MemoryCatalog;

    const CONFIG: &str = r#"
        [crypt]
        display-name = "The Crypt"
        allowed-biomes = ["plains", "forest"]
        difficulty-multiplier = 1.5

        [[crypt.waves]]
        mobs = [{ mob-type = "zombie", count = 3 }, { mob-type = "skeleton", count = 2, health = 30.0 }]

        [[crypt.waves]]
        mobs = [{ mob-type = "wither_skeleton", equipment = true }]

        [crypt.rewards]
        money = 500.0
        items = [{ oraxen-item = "crypt_key", amount = 1 }]

        [anywhere]
        allowed-biomes = ["*"]
        waves = [{ mobs = [{ mob-type = "zombie" }] }]

        [no_waves]
        allowed-biomes = ["*"]

        [bad_biome]
        allowed-biomes = ["moon"]
        waves = [{ mobs = [{ mob-type = "zombie" }] }]
    "#;

    fn load() -> (HashMap<String, Arc<RaidConfig>>, LoadReport) {
        let raw: BTreeMap<String, RawRaid> = toml::from_str(CONFIG).unwrap();
        load_raids(&raw, &MemoryCatalog::new(["crypt_key"]))
    }

    #[test]
    fn test_load_validates_raids() {
        let (raids, report) = load();
        assert_eq!(report, LoadReport { accepted: 2, rejected: 2 });
        let crypt = &raids["crypt"];
        assert_eq!(crypt.wave_count(), 2);
        assert_eq!(crypt.waves[0].mob_count(), 5);
        assert_eq!(crypt.preparation_seconds, DEFAULT_PREPARATION_SECONDS);
        assert_eq!(crypt.rewards.items, vec![("crypt_key".to_string(), 1)]);
    }

    #[test]
    fn test_biome_filter() {
        let (raids, _) = load();
        assert!(raids["crypt"].allowed_biomes.allows(Some("PLAINS")));
        assert!(!raids["crypt"].allowed_biomes.allows(Some("desert")));
        assert!(raids["anywhere"].allowed_biomes.allows(Some("desert")));
        assert!(raids["anywhere"].allowed_biomes.allows(None));
    }
}
