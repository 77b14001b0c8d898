//! # Lootwarden Quest
//!
//! A single server-wide quest: hand in one custom item, receive another plus
//! money. Completion is gated by a cooldown, and the quest auto-cycles when it
//! goes unfinished for too long.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lootwarden_quest::{QuestPool, QuestState};
//!
//! let (pool, _rejected) = QuestPool::from_raw(&config.quests, catalog.as_ref());
//! let quests = QuestState::new(pool, catalog, clock).with_store(store);
//! quests.validate_current();
//! let receipt = quests.complete_quest_for_player(player, economy)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod quest;
pub mod state;
pub mod store;

pub use error::{QuestError, QuestResult};
pub use quest::{QuestPool, QuestRecord, RawQuest};
pub use state::{CompletionReceipt, QuestNotifier, QuestState, SilentNotifier};
pub use store::{QuestSnapshot, QuestStore};
