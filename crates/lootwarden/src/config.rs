//! # Plugin Configuration
//!
//! One TOML file holds the settings and every content section:
//!
//! ```toml
//! [settings]
//! data-dir = "plugins/lootwarden"
//! chance-model = "tiered"
//!
//! [[block-drops.diamond_ore]]
//! oraxen-item = "ruby"
//! chance = 5.0
//! ```
//!
//! Settings are validated as a whole. Content entries are validated one by one
//! when [`crate::content::LootContent`] is built; a bad entry is skipped, a bad
//! setting fails the load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lootwarden_loot::{ChanceModel, DropSection, RawEquipmentEntry};
use lootwarden_mobs::{RawEliteMob, RawRaid};
use lootwarden_quest::RawQuest;
use lootwarden_shared::constants::{
    CHEST_SAVE_BATCH, MAX_PROCESSED_CHESTS, QUEST_CHECK_INTERVAL, RAID_TICK_INTERVAL,
};
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// File name of the quest snapshot inside the data directory.
pub const QUEST_STATE_FILE: &str = "quest_state.toml";

/// File name of the processed-chest snapshot inside the data directory.
pub const PROCESSED_CHESTS_FILE: &str = "processed_chests.toml";

fn default_data_dir() -> PathBuf {
    PathBuf::from("plugins/lootwarden")
}

const fn default_chest_capacity() -> usize {
    MAX_PROCESSED_CHESTS
}

const fn default_chest_batch() -> usize {
    CHEST_SAVE_BATCH
}

const fn default_quest_check() -> u64 {
    QUEST_CHECK_INTERVAL.as_secs()
}

#[allow(clippy::cast_possible_truncation)]
const fn default_raid_tick() -> u64 {
    RAID_TICK_INTERVAL.as_millis() as u64
}

const fn default_chest_save() -> u64 {
    300
}

const fn default_event_capacity() -> usize {
    1024
}

/// The `[settings]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Directory for persisted state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// How modifier levels influence drop chances.
    #[serde(default)]
    pub chance_model: ChanceModel,
    /// Processed chests remembered before the oldest is forgotten.
    #[serde(default = "default_chest_capacity")]
    pub processed_chest_capacity: usize,
    /// Insertions between processed-chest saves.
    #[serde(default = "default_chest_batch")]
    pub chest_save_batch: usize,
    /// Seconds between periodic processed-chest saves.
    #[serde(default = "default_chest_save")]
    pub chest_save_interval_seconds: u64,
    /// Seconds between quest auto-cycle checks.
    #[serde(default = "default_quest_check")]
    pub quest_check_interval_seconds: u64,
    /// Milliseconds between raid ticks.
    #[serde(default = "default_raid_tick")]
    pub raid_tick_millis: u64,
    /// Capacity of the host event queue.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chance_model: ChanceModel::default(),
            processed_chest_capacity: default_chest_capacity(),
            chest_save_batch: default_chest_batch(),
            chest_save_interval_seconds: default_chest_save(),
            quest_check_interval_seconds: default_quest_check(),
            raid_tick_millis: default_raid_tick(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Settings {
    /// Checks every setting.
    ///
    /// # Errors
    ///
    /// Returns the first setting that is zero where a positive value is needed.
    pub fn validate(&self) -> PluginResult<()> {
        let positive = [
            ("processed-chest-capacity", self.processed_chest_capacity as u64),
            ("chest-save-batch", self.chest_save_batch as u64),
            ("chest-save-interval-seconds", self.chest_save_interval_seconds),
            ("quest-check-interval-seconds", self.quest_check_interval_seconds),
            ("raid-tick-millis", self.raid_tick_millis),
            ("event-capacity", self.event_capacity as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(PluginError::InvalidSetting {
                    name,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    /// Quest auto-cycle check period.
    #[must_use]
    pub const fn quest_check_interval(&self) -> Duration {
        Duration::from_secs(self.quest_check_interval_seconds)
    }

    /// Raid tick period.
    #[must_use]
    pub const fn raid_tick_interval(&self) -> Duration {
        Duration::from_millis(self.raid_tick_millis)
    }

    /// Periodic processed-chest save period.
    #[must_use]
    pub const fn chest_save_interval(&self) -> Duration {
        Duration::from_secs(self.chest_save_interval_seconds)
    }

    /// Path of the quest snapshot.
    #[must_use]
    pub fn quest_state_path(&self) -> PathBuf {
        self.data_dir.join(QUEST_STATE_FILE)
    }

    /// Path of the processed-chest snapshot.
    #[must_use]
    pub fn processed_chests_path(&self) -> PathBuf {
        self.data_dir.join(PROCESSED_CHESTS_FILE)
    }
}

/// The whole config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    /// Plugin settings.
    #[serde(default)]
    pub settings: Settings,
    /// Drops per block material.
    #[serde(default)]
    pub block_drops: DropSection,
    /// Drops per mob type.
    #[serde(default)]
    pub mob_drops: DropSection,
    /// Chest loot per structure or loot-table key.
    #[serde(default)]
    pub chest_loot: DropSection,
    /// Elite definitions by id.
    #[serde(default)]
    pub elite_mobs: BTreeMap<String, RawEliteMob>,
    /// Spawn equipment per mob type.
    #[serde(default)]
    pub mob_equipment: BTreeMap<String, Vec<RawEquipmentEntry>>,
    /// Candidate quests.
    #[serde(default)]
    pub quests: Vec<RawQuest>,
    /// Raid definitions by id.
    #[serde(default)]
    pub raids: BTreeMap<String, RawRaid>,
}

impl PluginConfig {
    /// Parses and validates a config document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or invalid settings. `origin` only
    /// labels the error.
    pub fn parse(text: &str, origin: &Path) -> PluginResult<Self> {
        let config: Self = toml::from_str(text).map_err(|source| PluginError::ParseConfig {
            path: origin.to_path_buf(),
            source,
        })?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> PluginResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PluginError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PluginConfig::parse("", Path::new("empty.toml")).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.block_drops.is_empty());
        assert_eq!(config.settings.raid_tick_interval(), RAID_TICK_INTERVAL);
        assert_eq!(config.settings.quest_check_interval(), QUEST_CHECK_INTERVAL);
    }

    #[test]
    fn test_sections_parse() {
        let text = r#"
            [settings]
            data-dir = "data"
            chance-model = "hybrid"

            [[block-drops.diamond_ore]]
            oraxen-item = "ruby"
            chance = 5.0
            max-amount = 2

            [[quests]]
            required-item = "ruby"
            reward-item = "crown"
            money-reward = 50.0
        "#;
        let config = PluginConfig::parse(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.settings.chance_model, ChanceModel::Hybrid);
        assert_eq!(config.settings.quest_state_path(), PathBuf::from("data").join(QUEST_STATE_FILE));
        assert_eq!(config.block_drops["diamond_ore"][0].max_amount, 2);
        assert_eq!(config.quests.len(), 1);
    }

    #[test]
    fn test_zero_setting_rejected() {
        let error = PluginConfig::parse("[settings]\nraid-tick-millis = 0\n", Path::new("t.toml")).unwrap_err();
        assert!(matches!(error, PluginError::InvalidSetting { name: "raid-tick-millis", .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let error = PluginConfig::parse("[settings\n", Path::new("t.toml")).unwrap_err();
        assert!(matches!(error, PluginError::ParseConfig { .. }));
    }
}
