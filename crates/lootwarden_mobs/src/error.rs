//! # Mob Error Types

use thiserror::Error;

/// Errors that can occur while loading elite and raid configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MobsError {
    /// Mob type not in the catalog.
    #[error("unknown mob type: {0}")]
    UnknownMob(String),

    /// Biome not in the catalog.
    #[error("unknown biome: {0}")]
    UnknownBiome(String),

    /// Item not in the item catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Chance outside `(0, 100]`.
    #[error("chance {0} is outside (0, 100]")]
    InvalidChance(f64),

    /// Multiplier or attribute that is not a positive finite number.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// A raid without waves, or a wave without mobs.
    #[error("raid has an empty wave list or an empty wave")]
    EmptyWave,
}

/// Result type for mob configuration.
pub type MobsResult<T> = Result<T, MobsError>;

/// Why a raid could not start. No state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaidStartError {
    /// No raid with this id is configured.
    #[error("unknown raid: {0}")]
    UnknownRaid(String),

    /// The player already has a raid running.
    #[error("player already has an active raid")]
    AlreadyActive,

    /// The player's biome is not allowed for this raid.
    #[error("raid not allowed in biome {0}")]
    BiomeNotAllowed(String),

    /// The player is not online.
    #[error("player is offline")]
    PlayerOffline,
}
