//! # Lootwarden Shared
//!
//! Common types used by the loot, quest and mob crates.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER reference host-engine types. The host adapter maps
//! engine-native materials, entity types and biomes onto the string ids of
//! [`catalog`] at the boundary.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod constants;
pub mod economy;
pub mod ids;
pub mod items;
pub mod persist;
pub mod time;

pub use catalog::{BiomeCategory, BiomeType, MobCategory, MobType, StructureType};
pub use economy::{DepositResponse, EconomyProvider, MoneyOutcome};
pub use ids::{ChestLocation, EntityId, PlayerId, Position};
pub use items::{ItemCatalog, ItemStack, MemoryCatalog};
pub use persist::{PersistError, PersistResult, SnapshotWriter, SnapshotWriterConfig};
pub use time::{Clock, ManualClock, SystemClock};
