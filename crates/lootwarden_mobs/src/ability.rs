//! # Ability Attachments
//!
//! Abilities are plain data: a tagged variant with its parameters. Every
//! attached ability has a cooldown counted in ticks; when it runs out the
//! single executor [`execute`] hands an [`AbilityTrigger`] to the host and the
//! cooldown restarts.
//!
//! Cooldown state lives in one arena keyed by `(entity, kind)`, so an entity
//! carries at most one ability of each kind.

use std::collections::HashMap;

use lootwarden_shared::EntityId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const fn default_cooldown() -> u32 {
    10
}

/// An ability and its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum Ability {
    /// Teleport near the current target.
    Teleport {
        /// Maximum distance in blocks.
        range: f64,
    },
    /// Summon helpers.
    Summon {
        /// Mob type to summon.
        mob: String,
        /// How many.
        count: u32,
    },
    /// Restore health.
    Heal {
        /// Health points restored.
        amount: f64,
    },
    /// Launch a fireball at the target.
    Fireball {
        /// Explosion power.
        power: f64,
    },
    /// Push nearby players away.
    Knockback {
        /// Push strength.
        strength: f64,
        /// Affected radius in blocks.
        radius: f64,
    },
    /// Apply a potion effect to nearby players.
    Potion {
        /// Effect id (`slowness`).
        effect: String,
        /// Effect amplifier (0 = level I).
        #[serde(default)]
        amplifier: u32,
        /// Effect duration in seconds.
        duration_seconds: u32,
    },
}

/// Discriminant of [`Ability`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbilityKind {
    /// [`Ability::Teleport`].
    Teleport,
    /// [`Ability::Summon`].
    Summon,
    /// [`Ability::Heal`].
    Heal,
    /// [`Ability::Fireball`].
    Fireball,
    /// [`Ability::Knockback`].
    Knockback,
    /// [`Ability::Potion`].
    Potion,
}

impl Ability {
    /// The kind of this ability.
    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        match self {
            Self::Teleport { .. } => AbilityKind::Teleport,
            Self::Summon { .. } => AbilityKind::Summon,
            Self::Heal { .. } => AbilityKind::Heal,
            Self::Fireball { .. } => AbilityKind::Fireball,
            Self::Knockback { .. } => AbilityKind::Knockback,
            Self::Potion { .. } => AbilityKind::Potion,
        }
    }
}

/// An ability with its cooldown, as configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AbilitySpec {
    /// The ability.
    #[serde(flatten)]
    pub ability: Ability,
    /// Seconds (ticks) between activations.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u32,
}

/// A request for the host to perform an ability.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityTrigger {
    /// The acting entity.
    pub entity: EntityId,
    /// What to do.
    pub ability: Ability,
}

/// Performs abilities in the world (implemented by the host adapter).
pub trait AbilityHost: Send + Sync {
    /// Performs the ability. Returns false if the entity no longer exists.
    fn perform(&self, trigger: &AbilityTrigger) -> bool;
}

#[derive(Clone, Debug)]
struct Attachment {
    ability: Ability,
    cooldown: u32,
    remaining: u32,
}

/// Cooldown arena for attached abilities.
#[derive(Debug, Default)]
pub struct AbilityTracker {
    slots: Mutex<HashMap<(EntityId, AbilityKind), Attachment>>,
}

impl AbilityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches abilities to an entity. The first cooldown starts full.
    pub fn attach(&self, entity: EntityId, specs: &[AbilitySpec]) {
        if specs.is_empty() {
            return;
        }
        let mut slots = self.slots.lock();
        for spec in specs {
            let cooldown = spec.cooldown_seconds.max(1);
            slots.insert(
                (entity, spec.ability.kind()),
                Attachment {
                    ability: spec.ability.clone(),
                    cooldown,
                    remaining: cooldown,
                },
            );
        }
    }

    /// Removes every ability of an entity. Returns how many were removed.
    pub fn detach(&self, entity: EntityId) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|(owner, _), _| *owner != entity);
        before - slots.len()
    }

    /// Kinds attached to an entity.
    #[must_use]
    pub fn attached(&self, entity: EntityId) -> Vec<AbilityKind> {
        let mut kinds: Vec<AbilityKind> = self
            .slots
            .lock()
            .keys()
            .filter(|(owner, _)| *owner == entity)
            .map(|(_, kind)| *kind)
            .collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Advances every cooldown by one tick and fires the ones that ran out.
    ///
    /// Entities the host reports as gone are detached. Returns the number of
    /// abilities fired.
    pub fn tick(&self, host: &dyn AbilityHost) -> usize {
        let due: Vec<AbilityTrigger> = {
            let mut slots = self.slots.lock();
            slots
                .iter_mut()
                .filter_map(|((entity, _), attachment)| {
                    attachment.remaining = attachment.remaining.saturating_sub(1);
                    if attachment.remaining > 0 {
                        return None;
                    }
                    attachment.remaining = attachment.cooldown;
                    Some(AbilityTrigger {
                        entity: *entity,
                        ability: attachment.ability.clone(),
                    })
                })
                .collect()
        };

        let mut fired = 0;
        for trigger in &due {
            if execute(host, trigger) {
                fired += 1;
            } else {
                self.detach(trigger.entity);
            }
        }
        fired
    }
}

/// Runs one ability through the host.
///
/// Returns false if the entity is gone.
pub fn execute(host: &dyn AbilityHost, trigger: &AbilityTrigger) -> bool {
    match &trigger.ability {
        Ability::Summon { count: 0, .. } => return true,
        Ability::Summon { mob, count } => {
            tracing::debug!(entity = trigger.entity, %mob, count, "Summon ability");
        }
        Ability::Potion { effect, amplifier, .. } => {
            tracing::debug!(entity = trigger.entity, %effect, amplifier, "Potion ability");
        }
        other => {
            tracing::debug!(entity = trigger.entity, kind = ?other.kind(), "Ability fired");
        }
    }
    host.perform(trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingHost {
        dead: HashSet<EntityId>,
        performed: Mutex<Vec<AbilityTrigger>>,
    }

    impl AbilityHost for RecordingHost {
        fn perform(&self, trigger: &AbilityTrigger) -> bool {
            if self.dead.contains(&trigger.entity) {
                return false;
            }
            self.performed.lock().push(trigger.clone());
            true
        }
    }

    fn heal(cooldown: u32) -> AbilitySpec {
        AbilitySpec {
            ability: Ability::Heal { amount: 4.0 },
            cooldown_seconds: cooldown,
        }
    }

    #[test]
    fn test_fires_after_cooldown_and_restarts() {
        let tracker = AbilityTracker::new();
        let host = RecordingHost::default();
        tracker.attach(7, &[heal(3)]);

        assert_eq!(tracker.tick(&host), 0);
        assert_eq!(tracker.tick(&host), 0);
        assert_eq!(tracker.tick(&host), 1);
        assert_eq!(tracker.tick(&host), 0);
        assert_eq!(tracker.tick(&host), 0);
        assert_eq!(tracker.tick(&host), 1);
        assert_eq!(host.performed.lock().len(), 2);
    }

    #[test]
    fn test_one_attachment_per_kind() {
        let tracker = AbilityTracker::new();
        tracker.attach(1, &[heal(3), heal(5)]);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.attached(1), vec![AbilityKind::Heal]);
    }

    #[test]
    fn test_dead_entities_are_detached() {
        let tracker = AbilityTracker::new();
        let host = RecordingHost {
            dead: HashSet::from([2]),
            ..RecordingHost::default()
        };
        tracker.attach(2, &[heal(1)]);
        tracker.attach(3, &[heal(1)]);
        assert_eq!(tracker.tick(&host), 1);
        assert!(tracker.attached(2).is_empty());
        assert_eq!(tracker.detach(3), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_abilities_parse_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            abilities: Vec<AbilitySpec>,
        }
        let text = r#"
            abilities = [
                { type = "fireball", power = 2.0, cooldown-seconds = 8 },
                { type = "potion", effect = "slowness", duration-seconds = 5 },
                { type = "summon", mob = "zombie", count = 2 },
            ]
        "#;
        let parsed: Wrapper = toml::from_str(text).unwrap();
        assert_eq!(parsed.abilities[0].ability.kind(), AbilityKind::Fireball);
        assert_eq!(parsed.abilities[0].cooldown_seconds, 8);
        assert_eq!(
            parsed.abilities[1].ability,
            Ability::Potion {
                effect: "slowness".into(),
                amplifier: 0,
                duration_seconds: 5
            }
        );
        assert_eq!(parsed.abilities[2].cooldown_seconds, 10);
    }
}
