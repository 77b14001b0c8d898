//! Integration test for a full quest day: select, complete, cooldown, cycle.

use lootwarden_quest::{
    CompletionReceipt, QuestError, QuestNotifier, QuestPool, QuestRecord, QuestState, QuestStore,
    RawQuest,
};
use lootwarden_shared::{
    DepositResponse, EconomyProvider, ManualClock, MemoryCatalog, MoneyOutcome, PlayerId,
    SnapshotWriter, SnapshotWriterConfig,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Broadcasts {
    lines: Mutex<Vec<String>>,
}

impl QuestNotifier for Broadcasts {
    fn quest_selected(&self, quest: &QuestRecord, recipients: &[PlayerId]) {
        self.lines.lock().push(format!(
            "new quest {} -> {} for {}",
            quest.required_item,
            quest.reward_item,
            recipients.len()
        ));
    }

    fn quest_completed(&self, receipt: &CompletionReceipt) {
        self.lines.lock().push(format!("completed by {}", receipt.player));
    }
}

struct Bank;

impl EconomyProvider for Bank {
    fn deposit(&self, _player: PlayerId, amount: f64) -> DepositResponse {
        DepositResponse::ok(amount)
    }
}

#[test]
fn test_quest_day() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let catalog = Arc::new(MemoryCatalog::new(["ruby", "crown"]));
    let raw = vec![RawQuest {
        required_item: Some("ruby".into()),
        reward_item: Some("crown".into()),
        money_reward: 75.0,
    }];
    let (pool, rejected) = QuestPool::from_raw(&raw, catalog.as_ref());
    assert_eq!(rejected, 0);

    let broadcasts = Arc::new(Broadcasts::default());
    let quests = QuestState::new(pool, catalog, clock.clone())
        .with_notifier(broadcasts.clone())
        .with_store(QuestStore::new(dir.path().join("quest_state.toml"), Arc::clone(&writer)));

    let watcher = PlayerId::random();
    quests.track(watcher);
    assert!(!quests.validate_current());
    assert!(quests.is_quest_available());

    let player = PlayerId::random();
    let receipt = quests.complete_quest_for_player(player, Some(&Bank)).unwrap();
    assert_eq!(receipt.money, MoneyOutcome::Deposited(75.0));
    assert!(matches!(
        quests.complete_quest_for_player(player, Some(&Bank)),
        Err(QuestError::NotAvailable { .. })
    ));
    assert_eq!(quests.time_until_available(), Duration::from_secs(30 * 60));

    clock.advance(Duration::from_secs(30 * 60));
    assert!(quests.is_quest_available());

    clock.advance(Duration::from_secs(5 * 60 * 60));
    assert!(quests.tick());

    let lines = broadcasts.lines.lock().clone();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "new quest ruby -> crown for 1");
    assert!(lines[1].starts_with("completed by"));

    assert!(writer.flush(Duration::from_secs(5)));
    assert!(dir.path().join("quest_state.toml").exists());
}
