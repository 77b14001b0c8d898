//! # Lootwarden Loot
//!
//! Probability-weighted drop resolution for block breaks, mob kills and
//! structure chests.
//!
//! ## Design Principles
//!
//! 1. **Validated at load** - bad entries are logged and skipped, never rolled
//! 2. **Independent rolls** - every entry of a table rolls on its own
//! 3. **Soft cap** - modifier bonuses never push a chance past 95%
//! 4. **Atomic reload** - tables are published as whole snapshots
//!
//! ## Example
//!
//! ```rust,ignore
//! use lootwarden_loot::{ChanceModel, KeyKind, LootTable};
//!
//! let (table, report) =
//!     LootTable::from_section("block-drops", &section, KeyKind::Block, &catalog, ChanceModel::Tiered);
//! let drops = table.get_drops("diamond_ore", fortune_level, &catalog);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod chance;
pub mod chest;
pub mod enchant;
pub mod equipment;
pub mod error;
pub mod registry;
pub mod stats;
pub mod structure;
pub mod table;

pub use chance::{final_chance, ChanceModel, DropRarity};
pub use chest::{ChestSnapshot, ChestStore, ProcessedChestSet};
pub use enchant::{EnchantmentKind, EnchantmentProvider, EnchantmentResolver, ToolItem};
pub use equipment::{EquipmentAssignment, EquipmentSlot, EquipmentTable, RawEquipmentEntry};
pub use error::{LootError, LootResult, ProviderError};
pub use registry::Registry;
pub use stats::{run_statistics, LootStatistics};
pub use structure::StructureLootResolver;
pub use table::{DropEntry, DropSection, KeyKind, LoadReport, LootTable, RawDropEntry};
