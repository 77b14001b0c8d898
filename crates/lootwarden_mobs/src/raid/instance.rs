//! # Raid State Machine
//!
//! One running raid for one player.
//!
//! ## States
//!
//! - **Preparing**: countdown before the first wave.
//! - **Active**: a wave is alive. Once every mob of the wave is dead, an
//!   intermission of `wave-delay-seconds` ticks runs before the next wave.
//! - **Completed**: the last wave was cleared and rewards were paid.
//! - **Cancelled**: stopped, the player left, or the player strayed too far.
//!
//! [`RaidInstance::tick`] is called once per second. Completed and cancelled
//! are terminal: the manager drops the instance afterwards.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use lootwarden_shared::constants::SPAWN_JITTER_RADIUS;
use lootwarden_shared::economy::deposit_reward;
use lootwarden_shared::{
    EconomyProvider, EntityId, ItemCatalog, ItemStack, MoneyOutcome, PlayerId, Position,
};
use rand::Rng;

use crate::ability::{AbilitySpec, AbilityTracker};
use crate::raid::config::{MobSpawnSpec, RaidConfig};

/// Why a raid was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// Stopped by command or shutdown.
    Stopped,
    /// The player disconnected.
    PlayerLeft,
    /// The player moved beyond the raid radius.
    Strayed,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::PlayerLeft => "player left",
            Self::Strayed => "player left the raid area",
        })
    }
}

/// Lifecycle state of a raid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaidPhase {
    /// Counting down to wave 1.
    Preparing {
        /// Seconds left.
        remaining: u32,
    },
    /// Fighting wave `wave` (1-based).
    Active {
        /// Current wave.
        wave: usize,
        /// Set once the wave is cleared: seconds until the next wave.
        next_wave_in: Option<u32>,
    },
    /// All waves cleared.
    Completed,
    /// Cancelled before completion.
    Cancelled(CancelReason),
}

impl RaidPhase {
    /// Returns true for completed and cancelled.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled(_))
    }
}

/// A mob the host should spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Mob type id.
    pub mob_type: &'static str,
    /// Where to spawn it.
    pub position: Position,
    /// Max health, already scaled by difficulty.
    pub max_health: f64,
    /// Attack damage, already scaled by difficulty.
    pub attack_damage: f64,
    /// Whether to apply configured spawn equipment.
    pub equipment: bool,
    /// Raid display name, for the mob's name tag.
    pub raid_name: String,
}

/// Progress notifications shown to the raiding player.
#[derive(Clone, Debug, PartialEq)]
pub enum RaidEvent {
    /// Preparation countdown.
    Countdown {
        /// Seconds left.
        seconds: u32,
    },
    /// A wave spawned.
    WaveStarted {
        /// Wave number (1-based).
        wave: usize,
        /// Total waves.
        total: usize,
        /// Mobs actually spawned.
        mobs: usize,
    },
    /// A wave was cleared and another follows.
    WaveCleared {
        /// Wave number (1-based).
        wave: usize,
        /// Seconds until the next wave.
        next_in: u32,
    },
    /// All waves cleared.
    Completed {
        /// Items handed out.
        items: Vec<ItemStack>,
        /// Money outcome.
        money: MoneyOutcome,
    },
    /// The raid was cancelled; the host tears down raid UI.
    Cancelled {
        /// Why.
        reason: CancelReason,
    },
}

/// World access for raids (implemented by the host adapter).
///
/// Implementations must not call back into the raid manager.
pub trait RaidHost: Send + Sync {
    /// Returns true if the player is online.
    fn is_online(&self, player: PlayerId) -> bool;
    /// The player's position.
    fn player_position(&self, player: PlayerId) -> Option<Position>;
    /// Biome id at the player's position.
    fn player_biome(&self, player: PlayerId) -> Option<String>;
    /// Spawns a mob. `None` if the spawn failed.
    fn spawn_mob(&self, request: &SpawnRequest) -> Option<EntityId>;
    /// Returns true if the entity is alive.
    fn is_alive(&self, entity: EntityId) -> bool;
    /// Removes an entity from the world.
    fn remove_entity(&self, entity: EntityId);
    /// Gives items to the player.
    fn give_items(&self, player: PlayerId, items: &[ItemStack]);
    /// Shows raid progress to the player.
    fn notify(&self, player: PlayerId, event: &RaidEvent);
}

/// Everything a tick may touch.
#[derive(Clone, Copy)]
pub struct RaidContext<'a> {
    /// World access.
    pub host: &'a dyn RaidHost,
    /// Builds reward items.
    pub catalog: &'a dyn ItemCatalog,
    /// Optional economy for money rewards.
    pub economy: Option<&'a dyn EconomyProvider>,
    /// Ability arena for spawned mobs.
    pub abilities: &'a AbilityTracker,
}

/// One running raid.
#[derive(Debug)]
pub struct RaidInstance {
    player: PlayerId,
    config: Arc<RaidConfig>,
    anchor: Position,
    phase: RaidPhase,
    alive: HashSet<EntityId>,
    ticks: u64,
    spawned_total: usize,
}

impl RaidInstance {
    /// Creates a raid in the preparing state.
    #[must_use]
    pub fn new(player: PlayerId, config: Arc<RaidConfig>, anchor: Position) -> Self {
        let remaining = config.preparation_seconds;
        Self {
            player,
            config,
            anchor,
            phase: RaidPhase::Preparing { remaining },
            alive: HashSet::new(),
            ticks: 0,
            spawned_total: 0,
        }
    }

    /// The raiding player.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// The raid definition.
    #[must_use]
    pub fn config(&self) -> &RaidConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RaidPhase {
        self.phase
    }

    /// Where the raid started.
    #[must_use]
    pub const fn anchor(&self) -> &Position {
        &self.anchor
    }

    /// Entities of the current wave still alive.
    #[must_use]
    pub fn alive(&self) -> &HashSet<EntityId> {
        &self.alive
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Mobs spawned over the whole raid.
    #[must_use]
    pub const fn spawned_total(&self) -> usize {
        self.spawned_total
    }

    /// Advances the raid by one second with the thread RNG.
    ///
    /// Returns the phase after the tick.
    pub fn tick(&mut self, ctx: RaidContext<'_>) -> RaidPhase {
        self.tick_with_rng(ctx, &mut rand::thread_rng())
    }

    /// Advances the raid by one second.
    pub fn tick_with_rng<R: Rng + ?Sized>(&mut self, ctx: RaidContext<'_>, rng: &mut R) -> RaidPhase {
        if self.phase.is_finished() {
            return self.phase;
        }
        self.ticks += 1;

        if !ctx.host.is_online(self.player) {
            self.cancel(ctx.host, ctx.abilities, CancelReason::PlayerLeft);
            return self.phase;
        }
        if self.has_strayed(ctx.host) {
            self.cancel(ctx.host, ctx.abilities, CancelReason::Strayed);
            return self.phase;
        }

        match self.phase {
            RaidPhase::Preparing { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.start_wave(ctx, 1, rng);
                } else {
                    self.phase = RaidPhase::Preparing { remaining };
                    ctx.host.notify(self.player, &RaidEvent::Countdown { seconds: remaining });
                }
            }
            RaidPhase::Active { wave, next_wave_in: None } => {
                let host = ctx.host;
                self.alive.retain(|entity| host.is_alive(*entity));
                if self.alive.is_empty() {
                    self.wave_cleared(ctx, wave, rng);
                }
            }
            RaidPhase::Active {
                wave,
                next_wave_in: Some(remaining),
            } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.start_wave(ctx, wave + 1, rng);
                } else {
                    self.phase = RaidPhase::Active {
                        wave,
                        next_wave_in: Some(remaining),
                    };
                }
            }
            RaidPhase::Completed | RaidPhase::Cancelled(_) => {}
        }
        self.phase
    }

    /// Cancels the raid, removing every raid mob. No-op once finished.
    pub fn cancel(&mut self, host: &dyn RaidHost, abilities: &AbilityTracker, reason: CancelReason) {
        if self.phase.is_finished() {
            return;
        }
        for entity in self.alive.drain() {
            host.remove_entity(entity);
            abilities.detach(entity);
        }
        self.transition_to(RaidPhase::Cancelled(reason));
        host.notify(self.player, &RaidEvent::Cancelled { reason });
    }

    fn has_strayed(&self, host: &dyn RaidHost) -> bool {
        let Some(position) = host.player_position(self.player) else {
            return true;
        };
        match position.distance_squared(&self.anchor) {
            Some(distance_sq) => distance_sq > self.config.radius * self.config.radius,
            None => true,
        }
    }

    fn wave_cleared<R: Rng + ?Sized>(&mut self, ctx: RaidContext<'_>, wave: usize, rng: &mut R) {
        if wave >= self.config.wave_count() {
            self.complete(ctx);
            return;
        }
        let delay = self.config.wave_delay_seconds;
        if delay == 0 {
            self.start_wave(ctx, wave + 1, rng);
            return;
        }
        self.phase = RaidPhase::Active {
            wave,
            next_wave_in: Some(delay),
        };
        ctx.host.notify(self.player, &RaidEvent::WaveCleared { wave, next_in: delay });
    }

    fn start_wave<R: Rng + ?Sized>(&mut self, ctx: RaidContext<'_>, wave: usize, rng: &mut R) {
        let Some(wave_config) = self.config.waves.get(wave - 1) else {
            self.complete(ctx);
            return;
        };
        let multiplier = self.config.difficulty_multiplier;
        let mut spawned = 0;
        for spec in &wave_config.mobs {
            for _ in 0..spec.count {
                let request = self.spawn_request(spec, multiplier, rng);
                if let Some(entity) = ctx.host.spawn_mob(&request) {
                    attach_abilities(ctx.abilities, entity, &spec.abilities);
                    self.alive.insert(entity);
                    spawned += 1;
                }
            }
        }
        self.spawned_total += spawned;
        self.transition_to(RaidPhase::Active {
            wave,
            next_wave_in: None,
        });
        ctx.host.notify(
            self.player,
            &RaidEvent::WaveStarted {
                wave,
                total: self.config.wave_count(),
                mobs: spawned,
            },
        );
    }

    fn spawn_request<R: Rng + ?Sized>(&self, spec: &MobSpawnSpec, multiplier: f64, rng: &mut R) -> SpawnRequest {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let distance = rng.gen_range(0.0..=SPAWN_JITTER_RADIUS);
        SpawnRequest {
            mob_type: spec.mob_type,
            position: self.anchor.offset(angle.cos() * distance, angle.sin() * distance),
            max_health: spec.health * multiplier,
            attack_damage: spec.damage * multiplier,
            equipment: spec.equipment,
            raid_name: self.config.display_name.clone(),
        }
    }

    fn complete(&mut self, ctx: RaidContext<'_>) {
        let rewards = &self.config.rewards;
        let items: Vec<ItemStack> = rewards
            .items
            .iter()
            .filter_map(|(item_id, amount)| {
                let built = ctx.catalog.build_stack(item_id, *amount);
                if built.is_none() {
                    tracing::warn!(item = %item_id, "Raid reward item could not be built");
                }
                built
            })
            .collect();
        if !items.is_empty() {
            ctx.host.give_items(self.player, &items);
        }
        let money = deposit_reward(ctx.economy, self.player, rewards.money);
        self.transition_to(RaidPhase::Completed);
        ctx.host.notify(self.player, &RaidEvent::Completed { items, money });
    }

    fn transition_to(&mut self, next: RaidPhase) {
        let previous = self.phase;
        self.phase = next;
        tracing::info!(
            raid = %self.config.id,
            player = %self.player,
            tick = self.ticks,
            "Raid transition: {:?} -> {:?}",
            previous,
            next
        );
    }
}

fn attach_abilities(tracker: &AbilityTracker, entity: EntityId, specs: &[AbilitySpec]) {
    if !specs.is_empty() {
        tracker.attach(entity, specs);
    }
}
