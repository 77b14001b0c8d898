//! Plugin lifecycle through the public facade: enable, events, reload,
//! disable and restart from persisted state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lootwarden::{GameEvent, HostAction, Lootwarden, PluginContext, PluginError, SpawnCause};
use lootwarden_loot::ToolItem;
use lootwarden_mobs::{RaidHost, SandboxWorld, SpawnRequest};
use lootwarden_shared::{
    ChestLocation, DepositResponse, EconomyProvider, ItemStack, ManualClock, MemoryCatalog, PlayerId, Position,
};
use tempfile::TempDir;

const CONTENT: &str = r#"
[[block-drops.diamond_ore]]
oraxen-item = "ruby"
chance = 100.0

[[mob-drops.zombie]]
oraxen-item = "rotten_gem"
chance = 100.0

[[chest-loot.village]]
oraxen-item = "ruby"
chance = 100.0
min-amount = 2
max-amount = 2

[elite-mobs.brute]
mob-type = "zombie"
display-name = "Brute"
spawn-chance = 100.0
health-multiplier = 3.0
damage-multiplier = 2.0
abilities = [{ type = "heal", amount = 4.0, cooldown-seconds = 5 }]
drops = [{ oraxen-item = "brute_fang", chance = 100.0 }]

[[mob-equipment.zombie]]
oraxen-item = "iron_crown"
slot = "head"
chance = 100.0

[[quests]]
required-item = "ruby"
reward-item = "crypt_key"
money-reward = 50.0

[raids.crypt]
allowed-biomes = ["plains"]
preparation-seconds = 5
waves = [{ mobs = [{ mob-type = "zombie", count = 2 }] }]
"#;

struct Bank;

impl EconomyProvider for Bank {
    fn deposit(&self, _player: PlayerId, amount: f64) -> DepositResponse {
        DepositResponse::ok(amount)
    }
}

struct Harness {
    dir: TempDir,
    config_path: PathBuf,
    world: Arc<SandboxWorld>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("lootwarden.toml");
        let harness = Self {
            dir,
            config_path,
            world: Arc::new(SandboxWorld::new()),
            clock: Arc::new(ManualClock::new(1_000_000)),
        };
        harness.write_config(CONTENT);
        harness
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Timers are slowed to an hour so the test drives everything itself.
    fn write_config(&self, content: &str) {
        let settings = format!(
            "[settings]\n\
             data-dir = '{}'\n\
             quest-check-interval-seconds = 3600\n\
             raid-tick-millis = 3600000\n\
             chest-save-interval-seconds = 3600\n",
            self.data_dir().display()
        );
        std::fs::write(&self.config_path, format!("{settings}\n{content}")).unwrap();
    }

    fn enable(&self) -> Lootwarden {
        let catalog = MemoryCatalog::new(["ruby", "sapphire", "rotten_gem", "brute_fang", "iron_crown", "crypt_key"]);
        let context = PluginContext::new(Arc::new(catalog), self.world.clone(), self.world.clone())
            .with_economy(Arc::new(Bank))
            .with_clock(self.clock.clone());
        Lootwarden::enable(&self.config_path, context).unwrap()
    }
}

fn chest_at(x: i32) -> ChestLocation {
    ChestLocation::new("world", x, 64, 0)
}

fn generated(location: ChestLocation, loot_table: &str) -> GameEvent {
    GameEvent::LootGenerated {
        location,
        loot_table: loot_table.to_string(),
    }
}

fn turn_in(player: PlayerId, held: Option<&str>) -> GameEvent {
    GameEvent::QuestTurnIn {
        player,
        held_item: held.map(str::to_string),
    }
}

fn messages(actions: &[HostAction]) -> Vec<&str> {
    actions
        .iter()
        .filter_map(|action| match action {
            HostAction::Message { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_enable_loads_content_and_picks_quest() {
    let harness = Harness::new();
    let plugin = harness.enable();

    assert!(plugin.is_enabled());
    assert!(harness.data_dir().is_dir());
    let content = plugin.content();
    assert!(content.block_drops.has_drops("diamond_ore"));
    assert_eq!(content.report.total().rejected, 0);
    assert_eq!(plugin.quests().current().map(|q| q.required_item), Some("ruby".to_string()));
    assert_eq!(plugin.raids().raid_ids(), vec!["crypt".to_string()]);
}

#[test]
fn test_block_break_drops_unless_silk_touch() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let sender = plugin.event_sender();
    let player = PlayerId::random();

    assert!(sender.send(GameEvent::BlockBroken {
        player,
        block: "minecraft:diamond_ore".to_string(),
        location: ChestLocation::new("world", 10, 12, -3),
        tool: Some(ToolItem::new("diamond_pickaxe")),
    }));
    assert!(sender.send(GameEvent::BlockBroken {
        player,
        block: "diamond_ore".to_string(),
        location: ChestLocation::new("world", 11, 12, -3),
        tool: Some(ToolItem::new("diamond_pickaxe").with_enchantment("silk_touch", 1)),
    }));

    let actions = plugin.process_events();
    assert_eq!(
        actions,
        vec![HostAction::DropItems {
            position: Position::new("world", 10.5, 12.5, -2.5),
            items: vec![ItemStack::new("ruby", 1)],
        }]
    );
}

#[test]
fn test_chest_filled_once() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let listener = plugin.listener();
    let table = "minecraft:chests/village/village_weaponsmith";

    let first = listener.handle(&generated(chest_at(1), table));
    assert_eq!(
        first,
        vec![HostAction::FillChest {
            location: chest_at(1),
            items: vec![ItemStack::new("ruby", 2)],
        }]
    );
    assert!(listener.handle(&generated(chest_at(1), table)).is_empty());

    // No configured loot: nothing filled, nothing remembered.
    assert!(listener.handle(&generated(chest_at(2), "minecraft:chests/igloo_chest")).is_empty());
    assert!(!plugin.chests().contains(&chest_at(2)));
    assert_eq!(plugin.chests().len(), 1);
}

#[test]
fn test_elite_spawn_and_death() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let listener = plugin.listener();

    let spawned = listener.handle(&GameEvent::EntitySpawned {
        entity: 7,
        mob_type: "zombie".to_string(),
        biome: Some("plains".to_string()),
        cause: SpawnCause::Natural,
    });
    assert!(matches!(
        &spawned[0],
        HostAction::MakeElite { entity: 7, elite_id, display_name, .. }
            if elite_id == "brute" && display_name == "Brute"
    ));
    assert!(matches!(&spawned[1], HostAction::Equip { entity: 7, assignments } if assignments.len() == 1));
    assert_eq!(listener.elite_of(7).as_deref(), Some("brute"));
    assert_eq!(plugin.raids().abilities().len(), 1);

    let died = listener.handle(&GameEvent::EntityDied {
        entity: 7,
        mob_type: "zombie".to_string(),
        position: Position::new("world", 0.0, 64.0, 0.0),
        killer: Some(PlayerId::random()),
        weapon: None,
    });
    let HostAction::DropItems { items, .. } = &died[0] else {
        panic!("expected drops, got {died:?}");
    };
    assert_eq!(items, &vec![ItemStack::new("rotten_gem", 1), ItemStack::new("brute_fang", 1)]);
    assert_eq!(listener.active_elites(), 0);
    assert!(plugin.raids().abilities().is_empty());
}

fn natural_zombie(entity: u64) -> GameEvent {
    GameEvent::EntitySpawned {
        entity,
        mob_type: "zombie".to_string(),
        biome: Some("plains".to_string()),
        cause: SpawnCause::Natural,
    }
}

#[test]
fn test_vanished_elites_are_forgotten() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let listener = plugin.listener();

    // Entities the world never spawned count as gone.
    for entity in 1000..2000 {
        listener.handle(&natural_zombie(entity));
    }
    let living = harness
        .world
        .spawn_mob(&SpawnRequest {
            mob_type: "zombie",
            position: Position::new("world", 0.0, 64.0, 0.0),
            max_health: 20.0,
            attack_damage: 3.0,
            equipment: false,
            raid_name: String::new(),
        })
        .unwrap();
    listener.handle(&natural_zombie(living));
    assert_eq!(listener.active_elites(), 1001);

    assert_eq!(listener.prune_elites(), 1000);
    assert_eq!(listener.active_elites(), 1);
    assert_eq!(listener.elite_of(living).as_deref(), Some("brute"));
    assert_eq!(plugin.raids().abilities().len(), 1);

    assert!(listener.handle(&GameEvent::EntityRemoved { entity: living }).is_empty());
    assert_eq!(listener.active_elites(), 0);
    assert!(plugin.raids().abilities().is_empty());
}

#[test]
fn test_raid_spawns_are_never_elite() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let listener = plugin.listener();

    let bare = listener.handle(&GameEvent::EntitySpawned {
        entity: 1,
        mob_type: "zombie".to_string(),
        biome: Some("plains".to_string()),
        cause: SpawnCause::Raid { equipment: false },
    });
    assert!(bare.is_empty());

    let equipped = listener.handle(&GameEvent::EntitySpawned {
        entity: 2,
        mob_type: "zombie".to_string(),
        biome: Some("plains".to_string()),
        cause: SpawnCause::Raid { equipment: true },
    });
    assert!(matches!(equipped.as_slice(), [HostAction::Equip { entity: 2, .. }]));
    assert_eq!(listener.active_elites(), 0);
}

#[test]
fn test_mob_without_player_killer_drops_nothing() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let died = plugin.listener().handle(&GameEvent::EntityDied {
        entity: 3,
        mob_type: "zombie".to_string(),
        position: Position::new("world", 0.0, 64.0, 0.0),
        killer: None,
        weapon: None,
    });
    assert!(died.is_empty());
}

#[test]
fn test_quest_turn_in() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let listener = plugin.listener();
    let alice = PlayerId::random();
    let bob = PlayerId::random();

    let wrong = listener.handle(&turn_in(alice, Some("sapphire")));
    assert_eq!(messages(&wrong), vec!["Bring ruby to complete the quest."]);

    let done = listener.handle(&turn_in(alice, Some("ruby")));
    assert_eq!(
        done[..2],
        [
            HostAction::TakeItem {
                player: alice,
                item_id: "ruby".to_string(),
                amount: 1,
            },
            HostAction::GiveItems {
                player: alice,
                items: vec![ItemStack::new("crypt_key", 1)],
            },
        ]
    );
    assert_eq!(messages(&done), vec!["Quest complete! You earned 50.00."]);

    // Cooldown applies to everyone.
    let early = listener.handle(&turn_in(bob, Some("ruby")));
    assert_eq!(early.len(), 1);
    assert!(messages(&early)[0].starts_with("quest available again in"));
}

#[test]
fn test_player_quit_cancels_raid() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let player = harness.world.join("plains");

    plugin.raids().start_raid(player, "crypt", harness.world.as_ref()).unwrap();
    assert!(plugin.raids().is_in_raid(player));

    assert!(plugin.event_sender().send(GameEvent::PlayerQuit { player }));
    assert!(plugin.process_events().is_empty());
    assert!(!plugin.raids().is_in_raid(player));
}

#[test]
fn test_reload_swaps_content_and_keeps_it_on_error() {
    let harness = Harness::new();
    let plugin = harness.enable();

    harness.write_config(&CONTENT.replacen("oraxen-item = \"ruby\"", "oraxen-item = \"sapphire\"", 1));
    let report = plugin.reload().unwrap();
    assert_eq!(report.block_drops.accepted, 1);
    let item = |plugin: &Lootwarden| plugin.content().block_drops.entries("diamond_ore").unwrap()[0].item_id.clone();
    assert_eq!(item(&plugin), "sapphire");

    std::fs::write(&harness.config_path, "[[block-drops.diamond_ore]\nbroken").unwrap();
    assert!(matches!(plugin.reload(), Err(PluginError::ParseConfig { .. })));
    assert_eq!(item(&plugin), "sapphire");
}

#[test]
fn test_disable_is_idempotent() {
    let harness = Harness::new();
    let plugin = harness.enable();
    let player = harness.world.join("plains");
    plugin.raids().start_raid(player, "crypt", harness.world.as_ref()).unwrap();

    assert!(plugin.disable());
    assert!(!plugin.disable());
    assert!(!plugin.is_enabled());
    assert_eq!(plugin.raids().active_count(), 0);
    assert!(matches!(plugin.reload(), Err(PluginError::Disabled)));

    assert!(plugin.event_sender().send(turn_in(player, Some("ruby"))));
    assert!(plugin.process_events().is_empty());
}

#[test]
fn test_state_survives_restart() {
    let harness = Harness::new();
    let table = "minecraft:chests/village/village_weaponsmith";
    let alice = PlayerId::random();

    let plugin = harness.enable();
    assert_eq!(plugin.listener().handle(&generated(chest_at(1), table)).len(), 1);
    assert_eq!(messages(&plugin.listener().handle(&turn_in(alice, Some("ruby")))).len(), 1);
    assert!(plugin.disable());
    drop(plugin);

    assert!(file_exists(&harness.data_dir(), lootwarden::config::PROCESSED_CHESTS_FILE));
    assert!(file_exists(&harness.data_dir(), lootwarden::config::QUEST_STATE_FILE));

    let plugin = harness.enable();
    assert!(plugin.chests().contains(&chest_at(1)));
    assert!(plugin.listener().handle(&generated(chest_at(1), table)).is_empty());
    assert_eq!(plugin.quests().last_completed_player(), Some(alice));
    assert!(!plugin.quests().is_quest_available());
}

fn file_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}
