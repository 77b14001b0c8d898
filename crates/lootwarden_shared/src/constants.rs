//! # Gameplay Constants
//!
//! Balance values that are not exposed in the configuration file.
//!
//! **CRITICAL:** Changing any of these changes observable drop rates or
//! quest pacing on live servers.

use std::time::Duration;

// =============================================================================
// DROP CHANCES
// =============================================================================

/// Upper bound for any modified drop chance (percent). No drop is ever certain
/// once a modifier has been applied.
pub const SOFT_CAP_PERCENT: f64 = 95.0;

/// Scale applied to the base probability of each extra trial in the
/// bonus-roll model.
pub const BONUS_ROLL_SCALE: f64 = 0.25;

// =============================================================================
// CHEST LOOT
// =============================================================================

/// Maximum number of chest locations remembered as already populated.
pub const MAX_PROCESSED_CHESTS: usize = 10_000;

/// Number of insertions between two saves of the processed-chest set.
pub const CHEST_SAVE_BATCH: usize = 50;

// =============================================================================
// QUESTS
// =============================================================================

/// Cooldown after a quest completion by a new player.
pub const QUEST_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// Cooldown after the same player completes the quest twice in a row.
pub const QUEST_REPEAT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// A quest that runs this long without a completion is replaced.
pub const QUEST_MAX_DURATION: Duration = Duration::from_secs(5 * 60 * 60);

/// How often the quest auto-cycle timer polls.
pub const QUEST_CHECK_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// RAIDS
// =============================================================================

/// Raid timers tick once per second.
pub const RAID_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default preparation countdown before the first wave (seconds).
pub const DEFAULT_PREPARATION_SECONDS: u32 = 10;

/// Default pause between two waves (seconds).
pub const DEFAULT_WAVE_DELAY_SECONDS: u32 = 5;

/// Default distance a player may stray from the raid anchor (blocks).
pub const DEFAULT_RAID_RADIUS: f64 = 64.0;

/// Maximum horizontal offset of a raid mob from the anchor (blocks).
pub const SPAWN_JITTER_RADIUS: f64 = 6.0;
