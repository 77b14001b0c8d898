//! In-memory world implementing [`RaidHost`] and [`AbilityHost`].
//!
//! Used by tests and by the loot simulator to run raids without a server.

use std::collections::HashMap;

use lootwarden_shared::{EntityId, ItemStack, PlayerId, Position};
use parking_lot::Mutex;

use crate::ability::{AbilityHost, AbilityTrigger};
use crate::raid::instance::{RaidEvent, RaidHost, SpawnRequest};

const SANDBOX_WORLD: &str = "world";

#[derive(Debug)]
struct SandboxPlayer {
    online: bool,
    position: Position,
    biome: String,
}

#[derive(Debug, Default)]
struct SandboxState {
    players: HashMap<PlayerId, SandboxPlayer>,
    entities: HashMap<EntityId, SpawnRequest>,
    next_entity: EntityId,
    spawns: Vec<SpawnRequest>,
    given: HashMap<PlayerId, Vec<ItemStack>>,
    events: Vec<(PlayerId, RaidEvent)>,
    abilities_performed: usize,
    refuse_spawns: bool,
}

/// A flat world with players, mobs and an event log.
#[derive(Debug, Default)]
pub struct SandboxWorld {
    state: Mutex<SandboxState>,
}

impl SandboxWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an online player at the origin, standing in `biome`.
    pub fn join(&self, biome: &str) -> PlayerId {
        let player = PlayerId::random();
        self.state.lock().players.insert(
            player,
            SandboxPlayer {
                online: true,
                position: Position::new(SANDBOX_WORLD, 0.0, 64.0, 0.0),
                biome: biome.to_string(),
            },
        );
        player
    }

    /// Marks a player offline.
    pub fn leave(&self, player: PlayerId) {
        if let Some(entry) = self.state.lock().players.get_mut(&player) {
            entry.online = false;
        }
    }

    /// Moves a player horizontally.
    pub fn move_player(&self, player: PlayerId, dx: f64, dz: f64) {
        if let Some(entry) = self.state.lock().players.get_mut(&player) {
            entry.position = entry.position.offset(dx, dz);
        }
    }

    /// Makes every following spawn fail.
    pub fn refuse_spawns(&self, refuse: bool) {
        self.state.lock().refuse_spawns = refuse;
    }

    /// Kills one entity. Returns false if it was not alive.
    pub fn kill(&self, entity: EntityId) -> bool {
        self.state.lock().entities.remove(&entity).is_some()
    }

    /// Kills every living entity. Returns how many died.
    pub fn kill_all(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.entities.len();
        state.entities.clear();
        count
    }

    /// Living entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.state.lock().entities.len()
    }

    /// Every spawn request ever accepted.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.state.lock().spawns.len()
    }

    /// The most recent accepted spawn.
    #[must_use]
    pub fn last_spawn(&self) -> Option<SpawnRequest> {
        self.state.lock().spawns.last().cloned()
    }

    /// Items handed to a player.
    #[must_use]
    pub fn given(&self, player: PlayerId) -> Vec<ItemStack> {
        self.state.lock().given.get(&player).cloned().unwrap_or_default()
    }

    /// Abilities performed by living entities.
    #[must_use]
    pub fn abilities_performed(&self) -> usize {
        self.state.lock().abilities_performed
    }

    /// Raid events shown to a player, oldest first.
    #[must_use]
    pub fn events(&self, player: PlayerId) -> Vec<RaidEvent> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(owner, _)| *owner == player)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl RaidHost for SandboxWorld {
    fn is_online(&self, player: PlayerId) -> bool {
        self.state.lock().players.get(&player).is_some_and(|p| p.online)
    }

    fn player_position(&self, player: PlayerId) -> Option<Position> {
        self.state.lock().players.get(&player).map(|p| p.position.clone())
    }

    fn player_biome(&self, player: PlayerId) -> Option<String> {
        self.state.lock().players.get(&player).map(|p| p.biome.clone())
    }

    fn spawn_mob(&self, request: &SpawnRequest) -> Option<EntityId> {
        let mut state = self.state.lock();
        if state.refuse_spawns {
            return None;
        }
        state.next_entity += 1;
        let entity = state.next_entity;
        state.entities.insert(entity, request.clone());
        state.spawns.push(request.clone());
        Some(entity)
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.state.lock().entities.contains_key(&entity)
    }

    fn remove_entity(&self, entity: EntityId) {
        self.state.lock().entities.remove(&entity);
    }

    fn give_items(&self, player: PlayerId, items: &[ItemStack]) {
        self.state
            .lock()
            .given
            .entry(player)
            .or_default()
            .extend_from_slice(items);
    }

    fn notify(&self, player: PlayerId, event: &RaidEvent) {
        self.state.lock().events.push((player, event.clone()));
    }
}

impl AbilityHost for SandboxWorld {
    fn perform(&self, trigger: &AbilityTrigger) -> bool {
        let mut state = self.state.lock();
        if !state.entities.contains_key(&trigger.entity) {
            return false;
        }
        state.abilities_performed += 1;
        true
    }
}
