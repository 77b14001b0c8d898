//! # Quest Error Types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during quest operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuestError {
    /// A pool entry is missing a field.
    #[error("quest is missing {0}")]
    MissingField(&'static str),

    /// A pool entry references an item the catalog does not define.
    #[error("quest references unknown item: {0}")]
    UnknownItem(String),

    /// Negative or non-finite money reward.
    #[error("invalid money reward: {0}")]
    InvalidReward(f64),

    /// There is no current quest.
    #[error("no active quest")]
    NoActiveQuest,

    /// The quest is on cooldown.
    #[error("quest available again in {remaining:?}")]
    NotAvailable {
        /// Time left on the cooldown.
        remaining: Duration,
    },
}

/// Result type for quest operations.
pub type QuestResult<T> = Result<T, QuestError>;
