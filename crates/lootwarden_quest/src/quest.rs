//! Quest records and the validated quest pool.

use lootwarden_shared::ItemCatalog;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{QuestError, QuestResult};

/// A `[[quests]]` entry as written in the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawQuest {
    /// Item the player hands in.
    #[serde(default)]
    pub required_item: Option<String>,
    /// Item the player receives.
    #[serde(default)]
    pub reward_item: Option<String>,
    /// Money deposited on completion.
    #[serde(default)]
    pub money_reward: f64,
}

/// A validated quest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QuestRecord {
    /// Item the player hands in.
    pub required_item: String,
    /// Item the player receives.
    pub reward_item: String,
    /// Money deposited on completion, `>= 0`.
    pub money_reward: f64,
}

impl QuestRecord {
    /// Validates a raw entry against the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if an item is missing or unknown, or the reward is
    /// negative.
    pub fn from_raw(raw: &RawQuest, catalog: &dyn ItemCatalog) -> QuestResult<Self> {
        let required_item = raw
            .required_item
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(QuestError::MissingField("required-item"))?;
        let reward_item = raw
            .reward_item
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(QuestError::MissingField("reward-item"))?;
        if !raw.money_reward.is_finite() || raw.money_reward < 0.0 {
            return Err(QuestError::InvalidReward(raw.money_reward));
        }
        let record = Self {
            required_item,
            reward_item,
            money_reward: raw.money_reward,
        };
        record.check_items(catalog)?;
        Ok(record)
    }

    /// Checks that both items still resolve in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first item that does not resolve.
    pub fn check_items(&self, catalog: &dyn ItemCatalog) -> QuestResult<()> {
        for item in [&self.required_item, &self.reward_item] {
            if !catalog.exists(item) {
                return Err(QuestError::UnknownItem(item.clone()));
            }
        }
        Ok(())
    }
}

/// The candidate quests, all validated at load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuestPool {
    quests: Vec<QuestRecord>,
}

impl QuestPool {
    /// Creates a pool from already validated records.
    #[must_use]
    pub fn new(quests: Vec<QuestRecord>) -> Self {
        Self { quests }
    }

    /// Validates the `[[quests]]` section, skipping invalid entries.
    ///
    /// Returns the pool and the number of rejected entries.
    pub fn from_raw(raw: &[RawQuest], catalog: &dyn ItemCatalog) -> (Self, usize) {
        let mut rejected = 0;
        let quests = raw
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match QuestRecord::from_raw(entry, catalog) {
                Ok(record) => Some(record),
                Err(error) => {
                    rejected += 1;
                    tracing::warn!(index, %error, "Skipping invalid quest");
                    None
                }
            })
            .collect::<Vec<_>>();
        tracing::info!(quests = quests.len(), rejected, "Quest pool loaded");
        (Self { quests }, rejected)
    }

    /// Picks a quest uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&QuestRecord> {
        self.quests.choose(rng)
    }

    /// Number of quests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Returns true if the pool has no quests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Iterates the quests.
    pub fn iter(&self) -> impl Iterator<Item = &QuestRecord> {
        self.quests.iter()
    }
}
