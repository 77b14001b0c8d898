//! # Loot Error Types
//!
//! Configuration problems are the only errors this crate produces. They are
//! raised while a section loads, logged, and the offending entry is skipped.

use thiserror::Error;

/// Errors that can occur while loading loot configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LootError {
    /// The entry names no item.
    #[error("drop entry without an item id")]
    MissingItem,

    /// The item is not defined in the item catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Chance outside `(0, 100]`.
    #[error("chance {chance} for item {item_id} is outside (0, 100]")]
    ChanceOutOfRange {
        /// The item of the entry.
        item_id: String,
        /// The configured chance.
        chance: f64,
    },

    /// Negative amount or `min > max`.
    #[error("invalid amounts for item {item_id}: min {min}, max {max}")]
    InvalidAmounts {
        /// The item of the entry.
        item_id: String,
        /// Configured minimum.
        min: i64,
        /// Configured maximum.
        max: i64,
    },

    /// The trigger key is not a known engine type name.
    #[error("unknown {kind} name: {key}")]
    UnknownTrigger {
        /// What kind of key was expected (block, mob, ...).
        kind: &'static str,
        /// The configured key.
        key: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for loot operations.
pub type LootResult<T> = Result<T, LootError>;

/// Failure reported by an optional third-party enchantment provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("enchantment provider error: {0}")]
pub struct ProviderError(pub String);
