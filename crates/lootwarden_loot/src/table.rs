//! # Loot Tables
//!
//! A loot table maps a trigger key (block material, mob type, structure key)
//! to an ordered list of drop entries. Every entry is rolled independently, so
//! one trigger can yield zero, one or several items.
//!
//! Entries are validated when a config section loads. Invalid entries are
//! logged and skipped; the rest of the section still loads.

use std::collections::{BTreeMap, HashMap};

use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::{ItemCatalog, ItemStack};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chance::{amount_with_bonus, ChanceModel};
use crate::error::{LootError, LootResult};

/// A drop entry exactly as written in the config file.
///
/// Amounts are signed so that a negative value is reported as an invalid
/// entry instead of failing the whole file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDropEntry {
    /// Custom item id.
    #[serde(default, alias = "item")]
    pub oraxen_item: Option<String>,
    /// Base chance in percent.
    pub chance: f64,
    /// Minimum amount.
    #[serde(default = "default_amount")]
    pub min_amount: i64,
    /// Maximum amount.
    #[serde(default = "default_amount")]
    pub max_amount: i64,
}

const fn default_amount() -> i64 {
    1
}

/// A config section: trigger key -> raw entries, sorted by key.
pub type DropSection = BTreeMap<String, Vec<RawDropEntry>>;

/// A validated drop entry.
#[derive(Clone, Debug, PartialEq)]
pub struct DropEntry {
    /// Custom item id.
    pub item_id: String,
    /// Base chance in percent, in `(0, 100]`.
    pub chance: f64,
    /// Minimum amount.
    pub min_amount: u32,
    /// Maximum amount, `>= min_amount`.
    pub max_amount: u32,
}

impl DropEntry {
    /// Validates an entry against the catalog.
    pub fn new(
        item_id: impl Into<String>,
        chance: f64,
        min_amount: i64,
        max_amount: i64,
        catalog: &dyn ItemCatalog,
    ) -> LootResult<Self> {
        let item_id = item_id.into();
        if item_id.trim().is_empty() {
            return Err(LootError::MissingItem);
        }
        if !catalog.exists(&item_id) {
            return Err(LootError::UnknownItem(item_id));
        }
        if !(chance > 0.0 && chance <= 100.0) {
            return Err(LootError::ChanceOutOfRange { item_id, chance });
        }
        let amounts = (u32::try_from(min_amount), u32::try_from(max_amount));
        match amounts {
            (Ok(min), Ok(max)) if min <= max => Ok(Self {
                item_id,
                chance,
                min_amount: min,
                max_amount: max,
            }),
            _ => Err(LootError::InvalidAmounts {
                item_id,
                min: min_amount,
                max: max_amount,
            }),
        }
    }

    /// Validates a raw config entry.
    pub fn from_raw(raw: &RawDropEntry, catalog: &dyn ItemCatalog) -> LootResult<Self> {
        let item_id = raw.oraxen_item.clone().ok_or(LootError::MissingItem)?;
        Self::new(item_id, raw.chance, raw.min_amount, raw.max_amount, catalog)
    }
}

/// Outcome of loading one config section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries that passed validation.
    pub accepted: usize,
    /// Entries (or whole keys) that were skipped.
    pub rejected: usize,
}

impl LoadReport {
    /// Adds another report to this one.
    pub fn merge(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }
}

/// Which trigger keys a section accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Block materials (`diamond_ore`).
    Block,
    /// Catalogued mob types.
    Mob,
    /// Anything non-empty (structures, elite ids).
    Any,
}

impl KeyKind {
    fn label(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Mob => "mob",
            Self::Any => "key",
        }
    }

    fn accepts(self, key: &str) -> bool {
        match self {
            Self::Block => lootwarden_shared::catalog::is_material_name(key),
            Self::Mob => lootwarden_shared::MobType::find(key).is_some(),
            Self::Any => !key.trim().is_empty(),
        }
    }
}

/// Validates every entry of a raw list, logging and skipping failures.
pub fn validate_entries(
    section: &str,
    key: &str,
    raw: &[RawDropEntry],
    catalog: &dyn ItemCatalog,
    report: &mut LoadReport,
) -> Vec<DropEntry> {
    raw.iter()
        .filter_map(|entry| match DropEntry::from_raw(entry, catalog) {
            Ok(valid) => {
                report.accepted += 1;
                Some(valid)
            }
            Err(error) => {
                report.rejected += 1;
                tracing::warn!(section, key, %error, "Skipping invalid drop entry");
                None
            }
        })
        .collect()
}

/// Rolls each entry independently and builds the successful stacks.
///
/// Entries whose rolled amount is 0, or that the catalog cannot build, yield
/// nothing.
pub fn roll_entries<R: Rng + ?Sized>(
    entries: &[DropEntry],
    level: u32,
    model: ChanceModel,
    catalog: &dyn ItemCatalog,
    rng: &mut R,
) -> Vec<ItemStack> {
    let mut drops = Vec::new();
    for entry in entries {
        if !model.roll(entry.chance, level, rng) {
            continue;
        }
        let amount = amount_with_bonus(entry.min_amount, entry.max_amount, level, rng);
        if amount == 0 {
            continue;
        }
        match catalog.build_stack(&entry.item_id, amount) {
            Some(stack) => drops.push(stack),
            None => tracing::warn!(item = %entry.item_id, "Catalog failed to build dropped item"),
        }
    }
    drops
}

/// Drop entries keyed by normalized trigger key.
#[derive(Clone, Debug, Default)]
pub struct LootTable {
    entries: HashMap<String, Vec<DropEntry>>,
    model: ChanceModel,
}

impl LootTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(model: ChanceModel) -> Self {
        Self {
            entries: HashMap::new(),
            model,
        }
    }

    /// Loads a config section.
    ///
    /// Keys that `kind` rejects are skipped along with their entries.
    pub fn from_section(
        section: &str,
        raw: &DropSection,
        kind: KeyKind,
        catalog: &dyn ItemCatalog,
        model: ChanceModel,
    ) -> (Self, LoadReport) {
        let mut table = Self::new(model);
        let mut report = LoadReport::default();
        for (key, raw_entries) in raw {
            if !kind.accepts(key) {
                report.rejected += raw_entries.len().max(1);
                let error = LootError::UnknownTrigger {
                    kind: kind.label(),
                    key: key.clone(),
                };
                tracing::warn!(section, %error, "Skipping unknown trigger");
                continue;
            }
            let entries = validate_entries(section, key, raw_entries, catalog, &mut report);
            if !entries.is_empty() {
                table.entries.entry(normalize_id(key)).or_default().extend(entries);
            }
        }
        tracing::info!(
            section,
            keys = table.entries.len(),
            accepted = report.accepted,
            rejected = report.rejected,
            "Loot section loaded"
        );
        (table, report)
    }

    /// Adds validated entries for a key.
    pub fn insert(&mut self, key: &str, entries: Vec<DropEntry>) {
        self.entries.entry(normalize_id(key)).or_default().extend(entries);
    }

    /// Entries configured for a key.
    #[must_use]
    pub fn entries(&self, key: &str) -> Option<&[DropEntry]> {
        self.entries.get(&normalize_id(key)).map(Vec::as_slice)
    }

    /// Returns true if the key has drops configured.
    #[must_use]
    pub fn has_drops(&self, key: &str) -> bool {
        self.entries(key).is_some()
    }

    /// Number of configured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The chance model this table rolls with.
    #[must_use]
    pub fn model(&self) -> ChanceModel {
        self.model
    }

    /// Rolls the drops for a key with the thread RNG.
    #[must_use]
    pub fn get_drops(&self, key: &str, level: u32, catalog: &dyn ItemCatalog) -> Vec<ItemStack> {
        self.get_drops_with_rng(key, level, catalog, &mut rand::thread_rng())
    }

    /// Rolls the drops for a key.
    pub fn get_drops_with_rng<R: Rng + ?Sized>(
        &self,
        key: &str,
        level: u32,
        catalog: &dyn ItemCatalog,
        rng: &mut R,
    ) -> Vec<ItemStack> {
        self.entries(key)
            .map(|entries| roll_entries(entries, level, self.model, catalog, rng))
            .unwrap_or_default()
    }
}
