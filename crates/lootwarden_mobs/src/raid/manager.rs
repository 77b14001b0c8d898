//! # Raid Manager
//!
//! Owns every running raid, keyed by player.
//!
//! ## Rules
//!
//! 1. A player has at most one raid. Starting a second one is rejected, the
//!    running raid is never replaced.
//! 2. Every start check runs under the active-raid lock, so two concurrent
//!    starts for one player cannot both pass.
//! 3. A rejected start changes nothing: no instance, no spawns, no events.
//! 4. Host callbacks run while the lock is held and must not call back into
//!    the manager.

use std::collections::HashMap;
use std::sync::Arc;

use lootwarden_loot::Registry;
use lootwarden_shared::catalog::normalize_id;
use lootwarden_shared::{EconomyProvider, ItemCatalog, PlayerId};
use parking_lot::Mutex;

use crate::ability::AbilityTracker;
use crate::error::RaidStartError;
use crate::raid::config::RaidConfig;
use crate::raid::instance::{CancelReason, RaidContext, RaidEvent, RaidHost, RaidInstance, RaidPhase};

/// Raid definitions by id.
pub type RaidMap = HashMap<String, Arc<RaidConfig>>;

/// All running raids.
#[derive(Debug)]
pub struct RaidManager {
    raids: Registry<RaidMap>,
    active: Mutex<HashMap<PlayerId, RaidInstance>>,
    abilities: Arc<AbilityTracker>,
}

impl RaidManager {
    /// Creates a manager with the given definitions and ability arena.
    #[must_use]
    pub fn new(raids: RaidMap, abilities: Arc<AbilityTracker>) -> Self {
        Self {
            raids: Registry::new(raids),
            active: Mutex::new(HashMap::new()),
            abilities,
        }
    }

    /// The ability arena raid mobs are attached to.
    #[must_use]
    pub fn abilities(&self) -> &Arc<AbilityTracker> {
        &self.abilities
    }

    /// Configured raid ids, sorted.
    #[must_use]
    pub fn raid_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.raids.load().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Looks up a raid definition.
    #[must_use]
    pub fn raid(&self, raid_id: &str) -> Option<Arc<RaidConfig>> {
        self.raids.load().get(&normalize_id(raid_id)).cloned()
    }

    /// Starts a raid for `player` at their current position.
    ///
    /// # Errors
    ///
    /// Returns why the raid could not start. Nothing changed in that case.
    pub fn start_raid(&self, player: PlayerId, raid_id: &str, host: &dyn RaidHost) -> Result<(), RaidStartError> {
        let config = self
            .raid(raid_id)
            .ok_or_else(|| RaidStartError::UnknownRaid(raid_id.to_string()))?;

        let mut active = self.active.lock();
        if active.contains_key(&player) {
            return Err(RaidStartError::AlreadyActive);
        }
        if !host.is_online(player) {
            return Err(RaidStartError::PlayerOffline);
        }
        let anchor = host.player_position(player).ok_or(RaidStartError::PlayerOffline)?;
        let biome = host.player_biome(player);
        if !config.allowed_biomes.allows(biome.as_deref()) {
            return Err(RaidStartError::BiomeNotAllowed(
                biome.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        let seconds = config.preparation_seconds;
        tracing::info!(raid = %config.id, %player, waves = config.wave_count(), "Raid started");
        active.insert(player, RaidInstance::new(player, config, anchor));
        host.notify(player, &RaidEvent::Countdown { seconds });
        Ok(())
    }

    /// Stops a player's raid. Returns false if none was running.
    pub fn stop_raid(&self, player: PlayerId, host: &dyn RaidHost) -> bool {
        self.cancel(player, host, CancelReason::Stopped)
    }

    /// Cancels the raid of a player who disconnected.
    pub fn on_player_quit(&self, player: PlayerId, host: &dyn RaidHost) -> bool {
        self.cancel(player, host, CancelReason::PlayerLeft)
    }

    fn cancel(&self, player: PlayerId, host: &dyn RaidHost, reason: CancelReason) -> bool {
        let Some(mut raid) = self.active.lock().remove(&player) else {
            return false;
        };
        raid.cancel(host, &self.abilities, reason);
        true
    }

    /// Cancels every running raid (shutdown). Returns how many were running.
    pub fn stop_all(&self, host: &dyn RaidHost) -> usize {
        let drained: Vec<RaidInstance> = self.active.lock().drain().map(|(_, raid)| raid).collect();
        let count = drained.len();
        for mut raid in drained {
            raid.cancel(host, &self.abilities, CancelReason::Stopped);
        }
        if count > 0 {
            tracing::info!(count, "Stopped all raids");
        }
        count
    }

    /// Advances every raid by one second and drops the finished ones.
    ///
    /// Returns the players whose raid finished on this tick, with the final
    /// phase.
    pub fn tick_all(
        &self,
        host: &dyn RaidHost,
        catalog: &dyn ItemCatalog,
        economy: Option<&dyn EconomyProvider>,
    ) -> Vec<(PlayerId, RaidPhase)> {
        let ctx = RaidContext {
            host,
            catalog,
            economy,
            abilities: &self.abilities,
        };
        let mut active = self.active.lock();
        let mut finished = Vec::new();
        for (player, raid) in active.iter_mut() {
            let phase = raid.tick(ctx);
            if phase.is_finished() {
                finished.push((*player, phase));
            }
        }
        for (player, _) in &finished {
            active.remove(player);
        }
        finished
    }

    /// Replaces the raid definitions. Running raids keep their old definition.
    pub fn reload(&self, raids: RaidMap) {
        let count = raids.len();
        self.raids.replace(raids);
        tracing::info!(raids = count, running = self.active_count(), "Raid definitions reloaded");
    }

    /// Number of running raids.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Returns true if the player has a running raid.
    #[must_use]
    pub fn is_in_raid(&self, player: PlayerId) -> bool {
        self.active.lock().contains_key(&player)
    }

    /// Phase of a player's raid.
    #[must_use]
    pub fn phase_of(&self, player: PlayerId) -> Option<RaidPhase> {
        self.active.lock().get(&player).map(RaidInstance::phase)
    }

    /// Id of the raid a player is running.
    #[must_use]
    pub fn raid_of(&self, player: PlayerId) -> Option<String> {
        self.active.lock().get(&player).map(|raid| raid.config().id.clone())
    }
}
