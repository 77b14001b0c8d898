//! # Event System
//!
//! Host events flow into the plugin through a bounded crossbeam channel; the
//! listener answers each one with [`HostAction`]s the adapter applies to the
//! world.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌──────────────┐
//! │ Host server │─────>│  EventBus   │─────>│ LootListener │
//! │  (adapter)  │      │  (bounded)  │      │              │
//! └─────────────┘      └─────────────┘      └──────┬───────┘
//!        ^                                         │
//!        └─────────────── Vec<HostAction> ─────────┘
//! ```
//!
//! A full queue drops the event rather than blocking the server thread.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lootwarden_loot::{EquipmentAssignment, ToolItem};
use lootwarden_shared::{ChestLocation, EntityId, ItemStack, PlayerId, Position};

/// Why an entity spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnCause {
    /// Natural or spawner spawn: may become elite and get equipment.
    Natural,
    /// Spawned by a raid wave.
    Raid {
        /// Whether the wave asked for spawn equipment.
        equipment: bool,
    },
    /// Spawned by anything else (commands, abilities): left alone.
    Other,
}

/// Events the host delivers to the plugin.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A player broke a block.
    BlockBroken {
        /// Who broke it.
        player: PlayerId,
        /// Block material (`diamond_ore`).
        block: String,
        /// Block coordinates.
        location: ChestLocation,
        /// Tool in hand.
        tool: Option<ToolItem>,
    },

    /// A mob died.
    EntityDied {
        /// The mob.
        entity: EntityId,
        /// Mob type (`zombie`).
        mob_type: String,
        /// Where it died.
        position: Position,
        /// Player who killed it.
        killer: Option<PlayerId>,
        /// Weapon the killer held.
        weapon: Option<ToolItem>,
    },

    /// A mob spawned.
    EntitySpawned {
        /// The mob.
        entity: EntityId,
        /// Mob type.
        mob_type: String,
        /// Biome at the spawn point.
        biome: Option<String>,
        /// Why it spawned.
        cause: SpawnCause,
    },

    /// A mob left the world without dying (despawn, unload, removal).
    EntityRemoved {
        /// The mob.
        entity: EntityId,
    },

    /// A container generated its loot table for the first time.
    LootGenerated {
        /// Container coordinates.
        location: ChestLocation,
        /// Host loot-table key (`minecraft:chests/village/village_weaponsmith`).
        loot_table: String,
    },

    /// A player used the quest NPC.
    QuestTurnIn {
        /// Who.
        player: PlayerId,
        /// Item id in their hand, if it is a custom item.
        held_item: Option<String>,
    },

    /// A player disconnected.
    PlayerQuit {
        /// Who.
        player: PlayerId,
    },
}

/// World changes the host adapter applies after handling an event.
#[derive(Clone, Debug, PartialEq)]
pub enum HostAction {
    /// Drop items on the ground.
    DropItems {
        /// Where.
        position: Position,
        /// What.
        items: Vec<ItemStack>,
    },
    /// Add items to a container's generated loot.
    FillChest {
        /// Container.
        location: ChestLocation,
        /// What.
        items: Vec<ItemStack>,
    },
    /// Turn a freshly spawned mob into an elite.
    MakeElite {
        /// The mob.
        entity: EntityId,
        /// Elite id.
        elite_id: String,
        /// Name tag.
        display_name: String,
        /// Max health multiplier.
        health_multiplier: f64,
        /// Attack damage multiplier.
        damage_multiplier: f64,
    },
    /// Put equipment on a freshly spawned mob.
    Equip {
        /// The mob.
        entity: EntityId,
        /// One assignment per slot.
        assignments: Vec<EquipmentAssignment>,
    },
    /// Take items from a player's hand.
    TakeItem {
        /// Who.
        player: PlayerId,
        /// Item id.
        item_id: String,
        /// How many.
        amount: u32,
    },
    /// Give items to a player.
    GiveItems {
        /// Who.
        player: PlayerId,
        /// What.
        items: Vec<ItemStack>,
    },
    /// Tell a player something.
    Message {
        /// Who.
        player: PlayerId,
        /// Text.
        text: String,
    },
}

/// Event queue between the host adapter and the listener.
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` pending events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Queues an event without blocking.
    ///
    /// Returns `false` if the queue is full or closed; the event is dropped.
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "Event queue full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    #[must_use]
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if events are pending.
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
