//! # Lootwarden
//!
//! Plugin facade over the engine crates. A host adapter builds a
//! [`PluginContext`], calls [`Lootwarden::enable`] with the config path and
//! then forwards world events:
//!
//! ```text
//! host adapter ──GameEvent──> EventSender ──> LootListener ──> Vec<HostAction>
//!                                                   │
//!              ┌──────────────┬─────────────────────┼──────────────┐
//!              v              v                     v              v
//!         LootTable   StructureLootResolver    QuestState     RaidManager
//! ```
//!
//! Timers ([`scheduler::RepeatingTask`]) drive the quest auto-cycle, raid
//! ticks and periodic processed-chest saves.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod events;
pub mod listener;
pub mod plugin;
pub mod scheduler;

pub use config::{PluginConfig, Settings};
pub use content::{ContentReport, LootContent};
pub use context::PluginContext;
pub use error::{PluginError, PluginResult};
pub use events::{EventBus, EventReceiver, EventSender, GameEvent, HostAction, SpawnCause};
pub use listener::LootListener;
pub use plugin::Lootwarden;
pub use scheduler::RepeatingTask;
