//! # Quest State
//!
//! One quest is current at a time. It can be completed whenever
//! `now >= next_available_at`; each completion starts a cooldown (longer when
//! the same player completes twice in a row).
//!
//! ## Locking
//!
//! The quest record and its timestamps live behind one `RwLock` so readers
//! never see them half updated. Completion checks availability and assigns
//! the cooldown inside a single write-lock section, which makes it the only
//! at-most-once gate per availability window. Money deposits, notifications
//! and saves run after the lock is released.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use lootwarden_shared::constants::{QUEST_COOLDOWN, QUEST_MAX_DURATION, QUEST_REPEAT_COOLDOWN};
use lootwarden_shared::economy::deposit_reward;
use lootwarden_shared::time::millis;
use lootwarden_shared::{Clock, EconomyProvider, ItemCatalog, ItemStack, MoneyOutcome, PlayerId};
use parking_lot::{Mutex, RwLock};
use rand::Rng;

use crate::error::{QuestError, QuestResult};
use crate::quest::{QuestPool, QuestRecord};
use crate::store::{QuestSnapshot, QuestStore};

/// Receives quest broadcasts (implemented by the host adapter).
pub trait QuestNotifier: Send + Sync {
    /// A new quest was selected.
    fn quest_selected(&self, quest: &QuestRecord, recipients: &[PlayerId]);

    /// A player completed the quest.
    fn quest_completed(&self, receipt: &CompletionReceipt);
}

/// Notifier that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNotifier;

impl QuestNotifier for SilentNotifier {
    fn quest_selected(&self, _quest: &QuestRecord, _recipients: &[PlayerId]) {}

    fn quest_completed(&self, _receipt: &CompletionReceipt) {}
}

/// What a successful completion granted.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionReceipt {
    /// The completing player.
    pub player: PlayerId,
    /// The quest that was completed.
    pub quest: QuestRecord,
    /// Reward item, if the catalog could build it.
    pub reward: Option<ItemStack>,
    /// What happened to the money reward.
    pub money: MoneyOutcome,
    /// Cooldown that was assigned.
    pub cooldown: Duration,
    /// When the quest becomes available again (Unix ms).
    pub next_available_at: u64,
}

#[derive(Debug, Default)]
struct QuestInner {
    current: Option<QuestRecord>,
    start_time: u64,
    next_available_at: u64,
    last_completed_player: Option<PlayerId>,
    last_completed_at: Option<u64>,
    completed_players: HashSet<PlayerId>,
    pool: QuestPool,
}

impl QuestInner {
    fn reselect<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R) -> Option<QuestRecord> {
        let chosen = self.pool.choose(rng).cloned();
        self.current.clone_from(&chosen);
        self.start_time = now;
        self.completed_players.clear();
        chosen
    }

    fn has_run_too_long(&self, now: u64) -> bool {
        let since = self.start_time.max(self.last_completed_at.unwrap_or(0));
        now.saturating_sub(since) >= millis(QUEST_MAX_DURATION)
    }
}

/// The shared quest record.
pub struct QuestState {
    inner: RwLock<QuestInner>,
    tracked: Mutex<HashSet<PlayerId>>,
    persist_lock: Mutex<()>,
    catalog: Arc<dyn ItemCatalog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn QuestNotifier>,
    store: Option<QuestStore>,
}

impl std::fmt::Debug for QuestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestState")
            .field("inner", &*self.inner.read())
            .field("tracked", &self.tracked.lock().len())
            .finish_non_exhaustive()
    }
}

impl QuestState {
    /// Creates an empty state with no current quest.
    #[must_use]
    pub fn new(pool: QuestPool, catalog: Arc<dyn ItemCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(QuestInner {
                pool,
                ..QuestInner::default()
            }),
            tracked: Mutex::new(HashSet::new()),
            persist_lock: Mutex::new(()),
            catalog,
            clock,
            notifier: Arc::new(SilentNotifier),
            store: None,
        }
    }

    /// Sets the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn QuestNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Attaches a store and restores any saved state from it.
    #[must_use]
    pub fn with_store(mut self, store: QuestStore) -> Self {
        if let Some(snapshot) = store.load() {
            self.restore(snapshot);
        }
        self.store = Some(store);
        self
    }

    fn restore(&mut self, snapshot: QuestSnapshot) {
        let inner = self.inner.get_mut();
        inner.current = snapshot.current;
        inner.start_time = snapshot.start_time;
        inner.next_available_at = snapshot.next_available_at;
        inner.last_completed_player = snapshot.last_completed_player;
        inner.last_completed_at = snapshot.last_completed_at;
        *self.tracked.get_mut() = snapshot.tracked_players.into_iter().collect();
        tracing::info!(
            has_quest = inner.current.is_some(),
            tracked = self.tracked.get_mut().len(),
            "Quest state restored"
        );
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current quest.
    #[must_use]
    pub fn current(&self) -> Option<QuestRecord> {
        self.inner.read().current.clone()
    }

    /// Returns true if there is a quest and it is off cooldown.
    #[must_use]
    pub fn is_quest_available(&self) -> bool {
        let now = self.clock.now_millis();
        let inner = self.inner.read();
        inner.current.is_some() && now >= inner.next_available_at
    }

    /// Time left on the cooldown (zero when available).
    #[must_use]
    pub fn time_until_available(&self) -> Duration {
        let now = self.clock.now_millis();
        let next = self.inner.read().next_available_at;
        Duration::from_millis(next.saturating_sub(now))
    }

    /// When the current quest was selected (Unix ms).
    #[must_use]
    pub fn start_time(&self) -> u64 {
        self.inner.read().start_time
    }

    /// When the quest next becomes available (Unix ms).
    #[must_use]
    pub fn next_available_at(&self) -> u64 {
        self.inner.read().next_available_at
    }

    /// The last player to complete the quest.
    #[must_use]
    pub fn last_completed_player(&self) -> Option<PlayerId> {
        self.inner.read().last_completed_player
    }

    /// Returns true if the player completed the current quest.
    #[must_use]
    pub fn has_completed(&self, player: PlayerId) -> bool {
        self.inner.read().completed_players.contains(&player)
    }

    /// Number of players who completed the current quest.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.inner.read().completed_players.len()
    }

    /// Number of quests in the pool.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.inner.read().pool.len()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Picks a new quest uniformly at random from the pool.
    pub fn select_new_quest(&self) -> Option<QuestRecord> {
        self.select_new_quest_with_rng(&mut rand::thread_rng())
    }

    /// Picks a new quest with the given RNG.
    pub fn select_new_quest_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<QuestRecord> {
        let now = self.clock.now_millis();
        let selected = self.inner.write().reselect(now, rng);
        self.after_select(selected.as_ref());
        selected
    }

    /// Completes the quest for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::NoActiveQuest`] or [`QuestError::NotAvailable`]
    /// without changing any state.
    pub fn complete_quest_for_player(
        &self,
        player: PlayerId,
        economy: Option<&dyn EconomyProvider>,
    ) -> QuestResult<CompletionReceipt> {
        let now = self.clock.now_millis();
        let (quest, cooldown, next_available_at) = {
            let mut inner = self.inner.write();
            let quest = inner.current.clone().ok_or(QuestError::NoActiveQuest)?;
            if now < inner.next_available_at {
                return Err(QuestError::NotAvailable {
                    remaining: Duration::from_millis(inner.next_available_at - now),
                });
            }
            let cooldown = if inner.last_completed_player == Some(player) {
                QUEST_REPEAT_COOLDOWN
            } else {
                QUEST_COOLDOWN
            };
            inner.next_available_at = now.saturating_add(millis(cooldown));
            inner.last_completed_player = Some(player);
            inner.last_completed_at = Some(now);
            inner.completed_players.insert(player);
            (quest, cooldown, inner.next_available_at)
        };

        let money = deposit_reward(economy, player, quest.money_reward);
        let reward = self.catalog.build_stack(&quest.reward_item, 1);
        if reward.is_none() {
            tracing::warn!(item = %quest.reward_item, "Quest reward item could not be built");
        }
        let receipt = CompletionReceipt {
            player,
            quest,
            reward,
            money,
            cooldown,
            next_available_at,
        };
        tracing::info!(
            %player,
            cooldown_minutes = cooldown.as_secs() / 60,
            "Quest completed"
        );
        self.notifier.quest_completed(&receipt);
        self.persist();
        Ok(receipt)
    }

    /// Re-checks the current quest's items; reselects if either vanished.
    ///
    /// Returns true if the current quest was kept.
    pub fn validate_current(&self) -> bool {
        let now = self.clock.now_millis();
        let selected = {
            let mut inner = self.inner.write();
            match &inner.current {
                Some(quest) => match quest.check_items(self.catalog.as_ref()) {
                    Ok(()) => return true,
                    Err(error) => {
                        tracing::warn!(%error, "Current quest is no longer valid");
                    }
                },
                None => {
                    if inner.pool.is_empty() {
                        return false;
                    }
                }
            }
            inner.reselect(now, &mut rand::thread_rng())
        };
        self.after_select(selected.as_ref());
        false
    }

    /// Replaces the pool and revalidates the current quest.
    pub fn reload_pool(&self, pool: QuestPool) -> bool {
        self.inner.write().pool = pool;
        self.validate_current()
    }

    /// Periodic check: selects a quest when there is none, or when the
    /// current one has gone [`QUEST_MAX_DURATION`] without a completion.
    ///
    /// Returns true if a new quest was selected.
    pub fn tick(&self) -> bool {
        let now = self.clock.now_millis();
        let selected = {
            let mut inner = self.inner.write();
            let due = match inner.current {
                None => !inner.pool.is_empty(),
                Some(_) => inner.has_run_too_long(now),
            };
            if !due {
                return false;
            }
            inner.reselect(now, &mut rand::thread_rng())
        };
        tracing::info!("Quest auto-cycled");
        self.after_select(selected.as_ref());
        true
    }

    fn after_select(&self, selected: Option<&QuestRecord>) {
        match selected {
            Some(quest) => {
                tracing::info!(
                    required = %quest.required_item,
                    reward = %quest.reward_item,
                    "New quest selected"
                );
                let recipients = self.tracked_players();
                self.notifier.quest_selected(quest, &recipients);
            }
            None => tracing::warn!("Quest pool is empty, no quest is active"),
        }
        self.persist();
    }

    // =========================================================================
    // Tracked players
    // =========================================================================

    /// Subscribes a player to quest broadcasts.
    pub fn track(&self, player: PlayerId) -> bool {
        let added = self.tracked.lock().insert(player);
        if added {
            self.persist();
        }
        added
    }

    /// Unsubscribes a player.
    pub fn untrack(&self, player: PlayerId) -> bool {
        let removed = self.tracked.lock().remove(&player);
        if removed {
            self.persist();
        }
        removed
    }

    /// Returns true if the player receives broadcasts.
    #[must_use]
    pub fn is_tracked(&self, player: PlayerId) -> bool {
        self.tracked.lock().contains(&player)
    }

    /// All tracked players.
    #[must_use]
    pub fn tracked_players(&self) -> Vec<PlayerId> {
        self.tracked.lock().iter().copied().collect()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Consistent copy of the durable state.
    #[must_use]
    pub fn snapshot(&self) -> QuestSnapshot {
        let mut snapshot = {
            let inner = self.inner.read();
            QuestSnapshot {
                start_time: inner.start_time,
                next_available_at: inner.next_available_at,
                last_completed_player: inner.last_completed_player,
                last_completed_at: inner.last_completed_at,
                tracked_players: Vec::new(),
                current: inner.current.clone(),
            }
        };
        snapshot.tracked_players = self.tracked_players();
        snapshot
    }

    /// Queues a save of the current state.
    pub fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        // Snapshot and enqueue under one lock so saves reach the writer in order
        let _guard = self.persist_lock.lock();
        if let Err(error) = store.save(&self.snapshot()) {
            tracing::error!(%error, "Failed to queue quest state save");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::{DepositResponse, ManualClock, MemoryCatalog, SnapshotWriter, SnapshotWriterConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const START: u64 = 1_700_000_000_000;

    struct Bank;

    impl EconomyProvider for Bank {
        fn deposit(&self, _player: PlayerId, amount: f64) -> DepositResponse {
            DepositResponse::ok(amount)
        }
    }

    struct ClosedBank;

    impl EconomyProvider for ClosedBank {
        fn deposit(&self, _player: PlayerId, _amount: f64) -> DepositResponse {
            DepositResponse::failed("bank closed")
        }
    }

    /// Catalog whose contents can change after construction.
    #[derive(Default)]
    struct LiveCatalog {
        ids: RwLock<HashSet<String>>,
    }

    impl LiveCatalog {
        fn with(ids: &[&str]) -> Self {
            Self {
                ids: RwLock::new(ids.iter().map(|s| (*s).to_string()).collect()),
            }
        }

        fn remove(&self, id: &str) {
            self.ids.write().remove(id);
        }
    }

    impl ItemCatalog for LiveCatalog {
        fn exists(&self, item_id: &str) -> bool {
            self.ids.read().contains(item_id)
        }

        fn build(&self, item_id: &str) -> Option<ItemStack> {
            self.exists(item_id).then(|| ItemStack::new(item_id, 1))
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        selected: AtomicUsize,
        completed: AtomicUsize,
    }

    impl QuestNotifier for CountingNotifier {
        fn quest_selected(&self, _quest: &QuestRecord, _recipients: &[PlayerId]) {
            self.selected.fetch_add(1, Ordering::SeqCst);
        }

        fn quest_completed(&self, _receipt: &CompletionReceipt) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn quest(required: &str, reward: &str, money: f64) -> QuestRecord {
        QuestRecord {
            required_item: required.into(),
            reward_item: reward.into(),
            money_reward: money,
        }
    }

    fn setup() -> (QuestState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let catalog = Arc::new(MemoryCatalog::new(["ruby", "crown"]));
        let pool = QuestPool::new(vec![quest("ruby", "crown", 100.0)]);
        let state = QuestState::new(pool, catalog, clock.clone());
        state.select_new_quest();
        (state, clock)
    }

    #[test]
    fn test_complete_while_unavailable_changes_nothing() {
        let (state, clock) = setup();
        let first = PlayerId::random();
        let second = PlayerId::random();
        state.complete_quest_for_player(first, Some(&Bank)).unwrap();
        let next = state.next_available_at();

        clock.advance(Duration::from_secs(60));
        let result = state.complete_quest_for_player(second, Some(&Bank));
        assert!(matches!(result, Err(QuestError::NotAvailable { .. })));
        assert_eq!(state.next_available_at(), next);
        assert!(!state.has_completed(second));
        assert_eq!(state.last_completed_player(), Some(first));
    }

    #[test]
    fn test_repeat_completer_gets_longer_cooldown() {
        let (state, clock) = setup();
        let alice = PlayerId::random();
        let bob = PlayerId::random();

        let receipt = state.complete_quest_for_player(alice, None).unwrap();
        assert_eq!(receipt.cooldown, QUEST_COOLDOWN);

        clock.advance(QUEST_COOLDOWN);
        let receipt = state.complete_quest_for_player(alice, None).unwrap();
        assert_eq!(receipt.cooldown, QUEST_REPEAT_COOLDOWN);
        assert_eq!(receipt.next_available_at, clock.now_millis() + millis(QUEST_REPEAT_COOLDOWN));

        clock.advance(QUEST_REPEAT_COOLDOWN);
        let receipt = state.complete_quest_for_player(bob, None).unwrap();
        assert_eq!(receipt.cooldown, QUEST_COOLDOWN);
    }

    #[test]
    fn test_failed_deposit_still_assigns_cooldown() {
        let (state, _clock) = setup();
        let player = PlayerId::random();
        let receipt = state.complete_quest_for_player(player, Some(&ClosedBank)).unwrap();
        assert_eq!(receipt.money, MoneyOutcome::Failed("bank closed".into()));
        assert_eq!(receipt.reward, Some(ItemStack::new("crown", 1)));
        assert!(!state.is_quest_available());
    }

    #[test]
    fn test_concurrent_completions_single_winner() {
        let (state, _clock) = setup();
        let state = Arc::new(state);
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    let player = PlayerId::random();
                    if state.complete_quest_for_player(player, Some(&Bank)).is_ok() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(state.completed_count(), 1);
    }

    #[test]
    fn test_no_quest_means_no_completion() {
        let clock = Arc::new(ManualClock::new(START));
        let catalog = Arc::new(MemoryCatalog::new(["ruby"]));
        let state = QuestState::new(QuestPool::default(), catalog, clock);
        assert_eq!(state.select_new_quest(), None);
        assert!(!state.is_quest_available());
        assert_eq!(
            state.complete_quest_for_player(PlayerId::random(), None),
            Err(QuestError::NoActiveQuest)
        );
    }

    #[test]
    fn test_select_clears_completions_but_keeps_cooldown() {
        let (state, _clock) = setup();
        let player = PlayerId::random();
        state.complete_quest_for_player(player, None).unwrap();
        let next = state.next_available_at();

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        state.select_new_quest_with_rng(&mut rng);
        assert!(!state.has_completed(player));
        assert_eq!(state.next_available_at(), next);
    }

    #[test]
    fn test_auto_cycle_after_max_duration() {
        let clock = Arc::new(ManualClock::new(START));
        let catalog = Arc::new(MemoryCatalog::new(["ruby", "crown"]));
        let notifier = Arc::new(CountingNotifier::default());
        let pool = QuestPool::new(vec![quest("ruby", "crown", 0.0)]);
        let state = QuestState::new(pool, catalog, clock.clone()).with_notifier(notifier.clone());

        assert!(state.tick());
        assert_eq!(notifier.selected.load(Ordering::SeqCst), 1);

        clock.advance(QUEST_MAX_DURATION - Duration::from_secs(1));
        assert!(!state.tick());

        clock.advance(Duration::from_secs(1));
        assert!(state.tick());
        assert_eq!(state.start_time(), clock.now_millis());
        assert_eq!(notifier.selected.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_completion_postpones_auto_cycle() {
        let (state, clock) = setup();
        clock.advance(Duration::from_secs(4 * 60 * 60));
        state.complete_quest_for_player(PlayerId::random(), None).unwrap();
        clock.advance(Duration::from_secs(2 * 60 * 60));
        assert!(!state.tick());
    }

    #[test]
    fn test_validate_reselects_when_item_vanishes() {
        let clock = Arc::new(ManualClock::new(START));
        let catalog = Arc::new(LiveCatalog::with(&["ruby", "crown", "onyx", "sapphire"]));
        let pool = QuestPool::new(vec![quest("ruby", "crown", 0.0), quest("onyx", "sapphire", 0.0)]);
        let state = QuestState::new(pool, catalog.clone(), clock);
        state.select_new_quest();
        assert!(state.validate_current());

        let current = state.current().unwrap();
        catalog.remove(&current.reward_item);
        let valid_quest = if current.reward_item == "crown" {
            quest("onyx", "sapphire", 0.0)
        } else {
            quest("ruby", "crown", 0.0)
        };
        state.reload_pool(QuestPool::new(vec![valid_quest.clone()]));
        assert_eq!(state.current(), Some(valid_quest));
    }

    #[test]
    fn test_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quest_state.toml");
        let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));
        let clock = Arc::new(ManualClock::new(START));
        let catalog: Arc<dyn ItemCatalog> = Arc::new(MemoryCatalog::new(["ruby", "crown"]));
        let pool = QuestPool::new(vec![quest("ruby", "crown", 50.0)]);

        let player = PlayerId::random();
        let watcher = PlayerId::random();
        {
            let state = QuestState::new(pool.clone(), Arc::clone(&catalog), clock.clone())
                .with_store(QuestStore::new(&path, Arc::clone(&writer)));
            state.select_new_quest();
            state.track(watcher);
            state.complete_quest_for_player(player, None).unwrap();
            assert!(writer.flush(Duration::from_secs(5)));
        }

        let restored = QuestState::new(pool, catalog, clock)
            .with_store(QuestStore::new(&path, writer));
        assert_eq!(restored.current(), Some(quest("ruby", "crown", 50.0)));
        assert_eq!(restored.last_completed_player(), Some(player));
        assert_eq!(restored.next_available_at(), START + millis(QUEST_COOLDOWN));
        assert!(restored.is_tracked(watcher));
        assert!(restored.validate_current());
    }
}
