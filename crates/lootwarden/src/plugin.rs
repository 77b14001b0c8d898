//! # Plugin Lifecycle
//!
//! ```text
//! enable ──> running ──> disable
//!              │  ^
//!              └──┘ reload
//! ```
//!
//! - **enable** reads the config, restores persisted state, publishes the
//!   content snapshot and starts the timers.
//! - **reload** rebuilds the content off to the side and swaps it in. Running
//!   raids keep their definitions. Settings that shape threads and files
//!   (data directory, intervals, capacities) apply on the next enable.
//! - **disable** stops the timers, cancels raids and flushes state. Calling it
//!   again does nothing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lootwarden_loot::{ChestStore, ProcessedChestSet, Registry};
use lootwarden_mobs::{AbilityTracker, RaidManager};
use lootwarden_quest::{QuestState, QuestStore};
use lootwarden_shared::{SnapshotWriter, SnapshotWriterConfig};
use parking_lot::Mutex;

use crate::config::{PluginConfig, Settings};
use crate::content::{ContentReport, LootContent};
use crate::context::PluginContext;
use crate::error::{PluginError, PluginResult};
use crate::events::{EventBus, EventSender, HostAction};
use crate::listener::LootListener;
use crate::scheduler::RepeatingTask;

/// How long disable waits for pending snapshots.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// The running plugin.
pub struct Lootwarden {
    config_path: PathBuf,
    settings: Settings,
    context: Arc<PluginContext>,
    content: Arc<Registry<LootContent>>,
    writer: Arc<SnapshotWriter>,
    chests: Arc<ProcessedChestSet>,
    quests: Arc<QuestState>,
    raids: Arc<RaidManager>,
    listener: Arc<LootListener>,
    events: EventBus,
    tasks: Mutex<Vec<RepeatingTask>>,
    enabled: AtomicBool,
}

impl std::fmt::Debug for Lootwarden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lootwarden")
            .field("config_path", &self.config_path)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Lootwarden {
    /// Loads the config at `config_path` and starts the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read, a setting is invalid,
    /// the data directory cannot be created or a timer fails to start.
    pub fn enable(config_path: impl Into<PathBuf>, context: PluginContext) -> PluginResult<Self> {
        let config_path = config_path.into();
        let config = PluginConfig::load(&config_path)?;
        let settings = config.settings.clone();
        std::fs::create_dir_all(&settings.data_dir).map_err(|source| PluginError::DataDir {
            path: settings.data_dir.clone(),
            source,
        })?;

        let context = Arc::new(context);
        let catalog = context.catalog.as_ref();
        let content = LootContent::build(&config, catalog);
        let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));

        let chests = Arc::new(ProcessedChestSet::open(
            settings.processed_chest_capacity,
            settings.chest_save_batch,
            ChestStore::new(settings.processed_chests_path(), Arc::clone(&writer)),
        ));

        let quests = QuestState::new(
            content.quest_pool.clone(),
            Arc::clone(&context.catalog),
            Arc::clone(&context.clock),
        )
        .with_notifier(Arc::clone(&context.notifier))
        .with_store(QuestStore::new(settings.quest_state_path(), Arc::clone(&writer)));
        let quests = Arc::new(quests);
        // Picks a quest if none was restored, then cycles a stale one.
        quests.validate_current();
        quests.tick();

        let raids = Arc::new(RaidManager::new(
            content.raids.clone(),
            Arc::new(AbilityTracker::new()),
        ));
        let content = Arc::new(Registry::new(content));
        let listener = Arc::new(LootListener::new(
            Arc::clone(&context),
            Arc::clone(&content),
            Arc::clone(&chests),
            Arc::clone(&quests),
            Arc::clone(&raids),
        ));

        let plugin = Self {
            config_path,
            events: EventBus::new(settings.event_capacity),
            settings,
            context,
            content,
            writer,
            chests,
            quests,
            raids,
            listener,
            tasks: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        };
        plugin.start_tasks()?;
        tracing::info!(config = %plugin.config_path.display(), "Lootwarden enabled");
        Ok(plugin)
    }

    fn start_tasks(&self) -> PluginResult<()> {
        let quests = Arc::clone(&self.quests);
        let quest_task = RepeatingTask::spawn("quest-cycle", self.settings.quest_check_interval(), move || {
            quests.tick();
        })?;

        let raids = Arc::clone(&self.raids);
        let context = Arc::clone(&self.context);
        let listener = Arc::clone(&self.listener);
        let raid_task = RepeatingTask::spawn("raid-tick", self.settings.raid_tick_interval(), move || {
            raids.tick_all(context.raid_host.as_ref(), context.catalog.as_ref(), context.economy());
            raids.abilities().tick(context.ability_host.as_ref());
            listener.prune_elites();
        })?;

        let chests = Arc::clone(&self.chests);
        let chest_task = RepeatingTask::spawn("chest-save", self.settings.chest_save_interval(), move || {
            if let Err(error) = chests.save() {
                tracing::error!(%error, "Periodic processed chest save failed");
            }
        })?;

        self.tasks.lock().extend([quest_task, raid_task, chest_task]);
        Ok(())
    }

    /// Re-reads the config file and publishes the new content.
    ///
    /// On error the previous content stays active.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is disabled or the config cannot be
    /// read or parsed.
    pub fn reload(&self) -> PluginResult<ContentReport> {
        if !self.is_enabled() {
            return Err(PluginError::Disabled);
        }
        let config = match PluginConfig::load(&self.config_path) {
            Ok(config) => config,
            Err(error) => {
                tracing::error!(%error, "Reload failed, keeping previous configuration");
                return Err(error);
            }
        };
        if config.settings != self.settings {
            tracing::warn!("Changed [settings] take effect on the next enable");
        }
        let content = LootContent::build(&config, self.context.catalog.as_ref());
        let report = content.report;
        self.quests.reload_pool(content.quest_pool.clone());
        self.raids.reload(content.raids.clone());
        self.content.replace(content);
        tracing::info!(
            accepted = report.total().accepted,
            rejected = report.total().rejected,
            "Lootwarden reloaded"
        );
        Ok(report)
    }

    /// Stops timers, cancels raids and flushes persisted state.
    ///
    /// Returns false if the plugin was already disabled.
    pub fn disable(&self) -> bool {
        if !self.enabled.swap(false, Ordering::AcqRel) {
            return false;
        }
        for task in self.tasks.lock().drain(..) {
            task.cancel();
        }
        let cancelled = self.raids.stop_all(self.context.raid_host.as_ref());
        if let Err(error) = self.chests.save() {
            tracing::error!(%error, "Failed to save processed chests on disable");
        }
        self.quests.persist();
        if !self.writer.flush(FLUSH_TIMEOUT) {
            tracing::error!("Timed out flushing state on disable");
        }
        tracing::info!(cancelled_raids = cancelled, "Lootwarden disabled");
        true
    }

    /// Returns true between enable and disable.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sender the host adapter queues events on.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.events.sender()
    }

    /// Handles every queued event.
    pub fn process_events(&self) -> Vec<HostAction> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.listener.pump(&self.events.receiver())
    }

    /// The config file path.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The current content snapshot.
    #[must_use]
    pub fn content(&self) -> Arc<LootContent> {
        self.content.load()
    }

    /// The event listener.
    #[must_use]
    pub fn listener(&self) -> &LootListener {
        &self.listener
    }

    /// Quest state.
    #[must_use]
    pub fn quests(&self) -> &Arc<QuestState> {
        &self.quests
    }

    /// Raid manager.
    #[must_use]
    pub fn raids(&self) -> &Arc<RaidManager> {
        &self.raids
    }

    /// Processed chest set.
    #[must_use]
    pub fn chests(&self) -> &Arc<ProcessedChestSet> {
        &self.chests
    }

    /// The startup context.
    #[must_use]
    pub fn context(&self) -> &Arc<PluginContext> {
        &self.context
    }
}

impl Drop for Lootwarden {
    fn drop(&mut self) {
        self.disable();
    }
}
