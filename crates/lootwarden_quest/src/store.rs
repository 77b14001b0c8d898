//! Quest persistence.

use std::path::PathBuf;
use std::sync::Arc;

use lootwarden_shared::persist::load_snapshot;
use lootwarden_shared::{PersistResult, PlayerId, SnapshotWriter};
use serde::{Deserialize, Serialize};

use crate::quest::QuestRecord;

/// Durable part of the quest state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QuestSnapshot {
    /// When the current quest was selected (Unix ms).
    pub start_time: u64,
    /// When the quest can next be completed (Unix ms).
    pub next_available_at: u64,
    /// Last player to complete the quest.
    #[serde(default)]
    pub last_completed_player: Option<PlayerId>,
    /// When the last completion happened (Unix ms).
    #[serde(default)]
    pub last_completed_at: Option<u64>,
    /// Players receiving quest broadcasts.
    #[serde(default)]
    pub tracked_players: Vec<PlayerId>,
    /// The current quest.
    #[serde(default)]
    pub current: Option<QuestRecord>,
}

/// Reads and queues writes of `quest_state.toml`.
#[derive(Clone, Debug)]
pub struct QuestStore {
    path: PathBuf,
    writer: Arc<SnapshotWriter>,
}

impl QuestStore {
    /// Creates a store for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, writer: Arc<SnapshotWriter>) -> Self {
        Self {
            path: path.into(),
            writer,
        }
    }

    /// Loads the saved snapshot. Missing or unreadable files yield `None`.
    #[must_use]
    pub fn load(&self) -> Option<QuestSnapshot> {
        match load_snapshot(&self.path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::error!(%error, "Failed to load quest state, starting fresh");
                None
            }
        }
    }

    /// Queues a save.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or queued.
    pub fn save(&self, snapshot: &QuestSnapshot) -> PersistResult<()> {
        self.writer.submit(&self.path, snapshot).map(|_| ())
    }
}
