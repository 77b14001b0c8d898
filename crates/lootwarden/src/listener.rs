//! # Loot Listener
//!
//! Turns host events into host actions. Every handler reads the content
//! snapshot once and works on it, so a reload in the middle of an event never
//! mixes old and new tables.
//!
//! ## Rules
//!
//! - Silk Touch breaks roll no custom drops.
//! - Mob drops need a player killer. Elites add their private drops on top of
//!   the mob-type drops.
//! - A container is filled at most once, tracked by [`ProcessedChestSet`].
//!   Loot-table keys without configured loot are not recorded.

use std::collections::HashMap;
use std::sync::Arc;

use lootwarden_loot::{EnchantmentKind, ProcessedChestSet, Registry, ToolItem};
use lootwarden_mobs::RaidManager;
use lootwarden_quest::QuestState;
use lootwarden_shared::{ChestLocation, EntityId, ItemStack, MoneyOutcome, PlayerId, Position};
use parking_lot::Mutex;

use crate::content::LootContent;
use crate::context::PluginContext;
use crate::events::{EventReceiver, GameEvent, HostAction, SpawnCause};

/// Handles host events.
pub struct LootListener {
    context: Arc<PluginContext>,
    content: Arc<Registry<LootContent>>,
    chests: Arc<ProcessedChestSet>,
    quests: Arc<QuestState>,
    raids: Arc<RaidManager>,
    elites: Mutex<HashMap<EntityId, String>>,
}

impl std::fmt::Debug for LootListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LootListener")
            .field("active_elites", &self.elites.lock().len())
            .finish_non_exhaustive()
    }
}

impl LootListener {
    /// Creates a listener over shared plugin state.
    #[must_use]
    pub fn new(
        context: Arc<PluginContext>,
        content: Arc<Registry<LootContent>>,
        chests: Arc<ProcessedChestSet>,
        quests: Arc<QuestState>,
        raids: Arc<RaidManager>,
    ) -> Self {
        Self {
            context,
            content,
            chests,
            quests,
            raids,
            elites: Mutex::new(HashMap::new()),
        }
    }

    /// Handles every pending event of `receiver`.
    pub fn pump(&self, receiver: &EventReceiver) -> Vec<HostAction> {
        receiver
            .drain()
            .iter()
            .flat_map(|event| self.handle(event))
            .collect()
    }

    /// Handles one event.
    pub fn handle(&self, event: &GameEvent) -> Vec<HostAction> {
        match event {
            GameEvent::BlockBroken {
                block, location, tool, ..
            } => self.on_block_broken(block, location, tool.as_ref()),
            GameEvent::EntityDied {
                entity,
                mob_type,
                position,
                killer,
                weapon,
            } => self.on_entity_died(*entity, mob_type, position, *killer, weapon.as_ref()),
            GameEvent::EntitySpawned {
                entity,
                mob_type,
                biome,
                cause,
            } => self.on_entity_spawned(*entity, mob_type, biome.as_deref(), *cause),
            GameEvent::EntityRemoved { entity } => {
                self.forget(*entity);
                Vec::new()
            }
            GameEvent::LootGenerated { location, loot_table } => self.on_loot_generated(location, loot_table),
            GameEvent::QuestTurnIn { player, held_item } => self.on_quest_turn_in(*player, held_item.as_deref()),
            GameEvent::PlayerQuit { player } => {
                self.raids.on_player_quit(*player, self.context.raid_host.as_ref());
                Vec::new()
            }
        }
    }

    /// Elites currently alive.
    #[must_use]
    pub fn active_elites(&self) -> usize {
        self.elites.lock().len()
    }

    /// Elite id of a living entity.
    #[must_use]
    pub fn elite_of(&self, entity: EntityId) -> Option<String> {
        self.elites.lock().get(&entity).cloned()
    }

    /// Forgets elites the host no longer reports alive, with their abilities.
    ///
    /// Catches mobs that left the world without a death or removal event.
    /// Returns how many were forgotten.
    pub fn prune_elites(&self) -> usize {
        let tracked: Vec<EntityId> = self.elites.lock().keys().copied().collect();
        let host = self.context.raid_host.as_ref();
        let gone: Vec<EntityId> = tracked.into_iter().filter(|entity| !host.is_alive(*entity)).collect();
        for entity in &gone {
            self.forget(*entity);
        }
        if !gone.is_empty() {
            tracing::debug!(count = gone.len(), "Pruned vanished elites");
        }
        gone.len()
    }

    fn forget(&self, entity: EntityId) -> Option<String> {
        let elite = self.elites.lock().remove(&entity);
        self.raids.abilities().detach(entity);
        elite
    }

    fn on_block_broken(
        &self,
        block: &str,
        location: &ChestLocation,
        tool: Option<&ToolItem>,
    ) -> Vec<HostAction> {
        let resolver = &self.context.enchantments;
        if resolver.has_flag(tool, EnchantmentKind::SilkTouch) {
            tracing::debug!(%block, "Silk Touch break, no custom drops");
            return Vec::new();
        }
        let level = resolver.resolve_level(tool, EnchantmentKind::Fortune);
        let content = self.content.load();
        let items = content.block_drops.get_drops(block, level, self.context.catalog.as_ref());
        drop_items(block_center(location), items)
    }

    fn on_entity_died(
        &self,
        entity: EntityId,
        mob_type: &str,
        position: &Position,
        killer: Option<PlayerId>,
        weapon: Option<&ToolItem>,
    ) -> Vec<HostAction> {
        let elite = self.forget(entity);
        if killer.is_none() {
            return Vec::new();
        }

        let level = self.context.enchantments.resolve_level(weapon, EnchantmentKind::Looting);
        let catalog = self.context.catalog.as_ref();
        let content = self.content.load();
        let mut items = content.mob_drops.get_drops(mob_type, level, catalog);
        if let Some(elite_id) = elite {
            let elite_items = content.elites.elite_drops(&elite_id, level, catalog);
            tracing::debug!(elite = %elite_id, drops = elite_items.len(), "Elite killed");
            items.extend(elite_items);
        }
        drop_items(position.clone(), items)
    }

    fn on_entity_spawned(
        &self,
        entity: EntityId,
        mob_type: &str,
        biome: Option<&str>,
        cause: SpawnCause,
    ) -> Vec<HostAction> {
        let content = self.content.load();
        let mut actions = Vec::new();
        match cause {
            SpawnCause::Other | SpawnCause::Raid { equipment: false } => return actions,
            SpawnCause::Raid { equipment: true } => {}
            SpawnCause::Natural => {
                if let Some(elite) = content.elites.roll_elite(mob_type, biome) {
                    self.elites.lock().insert(entity, elite.id.clone());
                    self.raids.abilities().attach(entity, &elite.abilities);
                    tracing::debug!(entity, elite = %elite.id, "Elite spawned");
                    actions.push(HostAction::MakeElite {
                        entity,
                        elite_id: elite.id.clone(),
                        display_name: elite.display_name.clone(),
                        health_multiplier: elite.health_multiplier,
                        damage_multiplier: elite.damage_multiplier,
                    });
                }
            }
        }
        let assignments = content.equipment.roll(mob_type, self.context.catalog.as_ref());
        if !assignments.is_empty() {
            actions.push(HostAction::Equip { entity, assignments });
        }
        actions
    }

    fn on_loot_generated(&self, location: &ChestLocation, loot_table: &str) -> Vec<HostAction> {
        let content = self.content.load();
        if content.chest_loot.resolve(loot_table).is_none() {
            return Vec::new();
        }
        if !self.chests.mark_processed(location.clone()) {
            tracing::trace!(%location, "Chest already processed");
            return Vec::new();
        }
        let items = content
            .chest_loot
            .get_drops(loot_table, 0, self.context.catalog.as_ref());
        if items.is_empty() {
            return Vec::new();
        }
        vec![HostAction::FillChest {
            location: location.clone(),
            items,
        }]
    }

    fn on_quest_turn_in(&self, player: PlayerId, held_item: Option<&str>) -> Vec<HostAction> {
        let Some(quest) = self.quests.current() else {
            return vec![message(player, "There is no quest right now.")];
        };
        if held_item != Some(quest.required_item.as_str()) {
            return vec![message(player, format!("Bring {} to complete the quest.", quest.required_item))];
        }
        match self.quests.complete_quest_for_player(player, self.context.economy()) {
            Ok(receipt) => {
                let mut actions = vec![HostAction::TakeItem {
                    player,
                    item_id: receipt.quest.required_item.clone(),
                    amount: 1,
                }];
                if let Some(reward) = receipt.reward {
                    actions.push(HostAction::GiveItems {
                        player,
                        items: vec![reward],
                    });
                }
                let text = match receipt.money {
                    MoneyOutcome::Deposited(amount) => format!("Quest complete! You earned {amount:.2}."),
                    _ => "Quest complete!".to_string(),
                };
                actions.push(message(player, text));
                actions
            }
            Err(error) => vec![message(player, error.to_string())],
        }
    }
}

fn block_center(location: &ChestLocation) -> Position {
    Position::new(
        location.world.clone(),
        f64::from(location.x) + 0.5,
        f64::from(location.y) + 0.5,
        f64::from(location.z) + 0.5,
    )
}

fn drop_items(position: Position, items: Vec<ItemStack>) -> Vec<HostAction> {
    if items.is_empty() {
        Vec::new()
    } else {
        vec![HostAction::DropItems { position, items }]
    }
}

fn message(player: PlayerId, text: impl Into<String>) -> HostAction {
    HostAction::Message {
        player,
        text: text.into(),
    }
}
