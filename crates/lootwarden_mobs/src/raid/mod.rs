//! Wave raids: configuration, the per-player state machine and the manager.

pub mod config;
pub mod instance;
pub mod manager;
pub mod sandbox;

pub use config::{load_raids, BiomeFilter, MobSpawnSpec, RaidConfig, RawRaid, RewardSpec, WaveConfig};
pub use instance::{CancelReason, RaidContext, RaidEvent, RaidHost, RaidInstance, RaidPhase, SpawnRequest};
pub use manager::{RaidManager, RaidMap};
pub use sandbox::SandboxWorld;
