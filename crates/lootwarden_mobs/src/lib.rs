//! # Lootwarden Mobs
//!
//! Everything that changes how mobs behave:
//!
//! - [`ability`]: cooldown-driven abilities attached to entities
//! - [`elite`]: rare mob variants with scaled attributes and private drops
//! - [`raid`]: per-player wave raids
//!
//! The host engine is reached only through [`ability::AbilityHost`] and
//! [`raid::RaidHost`].

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ability;
pub mod elite;
pub mod error;
pub mod raid;

pub use ability::{Ability, AbilityHost, AbilityKind, AbilitySpec, AbilityTracker, AbilityTrigger};
pub use elite::{EliteDefinition, EliteRegistry, RawEliteMob};
pub use error::{MobsError, MobsResult, RaidStartError};
pub use raid::{
    CancelReason, RaidConfig, RaidEvent, RaidHost, RaidInstance, RaidManager, RaidPhase, RawRaid, SandboxWorld,
    SpawnRequest,
};
