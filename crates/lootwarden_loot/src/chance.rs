//! # Drop Chance Engine
//!
//! Converts a base drop chance (percent) and a modifier level (Fortune or
//! Looting) into the chance actually rolled.
//!
//! ## Rarity Tiers
//!
//! | Tier       | Base chance   | Bonus per level                   |
//! |------------|---------------|-----------------------------------|
//! | Common     | `> 50`        | `level`                           |
//! | Uncommon   | `(10, 50]`    | `level * 0.5`                     |
//! | Rare       | `(1, 10]`     | `ln(level + 1) * base * 0.15`     |
//! | Very rare  | `(0.1, 1]`    | `sqrt(level) * base * 0.1`        |
//! | Legendary  | `<= 0.1`      | `ln(level + 1) * base * 0.02`     |
//!
//! The result is capped at [`SOFT_CAP_PERCENT`] and never drops below the base:
//! a base already above the cap is returned unchanged.
//!
//! ## Models
//!
//! - [`ChanceModel::Tiered`]: the table above.
//! - [`ChanceModel::BonusRoll`]: each level grants an extra independent trial
//!   with probability `p * 0.25 / (i + 1)`. The trials are collapsed into their
//!   exact combined probability, so one roll is made either way.
//! - [`ChanceModel::Hybrid`]: the mean of the two.

use lootwarden_shared::constants::{BONUS_ROLL_SCALE, SOFT_CAP_PERCENT};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Levels above this are treated as this for the iterative formulas.
pub const MAX_EFFECTIVE_LEVEL: u32 = 255;

/// Rarity tier derived from the base chance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropRarity {
    /// Base chance above 50%.
    Common,
    /// Base chance in (10, 50].
    Uncommon,
    /// Base chance in (1, 10].
    Rare,
    /// Base chance in (0.1, 1].
    VeryRare,
    /// Base chance of 0.1% or less.
    Legendary,
}

impl DropRarity {
    /// Classifies a base chance.
    #[must_use]
    pub fn classify(base_chance: f64) -> Self {
        if base_chance > 50.0 {
            Self::Common
        } else if base_chance > 10.0 {
            Self::Uncommon
        } else if base_chance > 1.0 {
            Self::Rare
        } else if base_chance > 0.1 {
            Self::VeryRare
        } else {
            Self::Legendary
        }
    }

    /// Additive bonus this tier grants at `level`.
    #[must_use]
    pub fn bonus(self, base_chance: f64, level: u32) -> f64 {
        let level = f64::from(level.min(MAX_EFFECTIVE_LEVEL));
        match self {
            Self::Common => level,
            Self::Uncommon => level * 0.5,
            Self::Rare => (level + 1.0).ln() * base_chance * 0.15,
            Self::VeryRare => level.sqrt() * base_chance * 0.1,
            Self::Legendary => (level + 1.0).ln() * base_chance * 0.02,
        }
    }
}

/// How the modifier level influences a roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChanceModel {
    /// Tiered diminishing returns.
    #[default]
    Tiered,
    /// Extra independent trials per level.
    BonusRoll,
    /// Average of tiered and bonus-roll.
    Hybrid,
}

impl ChanceModel {
    /// Chance (percent) rolled for `base_chance` at `level`.
    #[must_use]
    pub fn effective_chance(self, base_chance: f64, level: u32) -> f64 {
        match self {
            Self::Tiered => final_chance(base_chance, level),
            Self::BonusRoll => bonus_roll_chance(base_chance, level),
            Self::Hybrid => hybrid_chance(base_chance, level),
        }
    }

    /// Rolls once against the effective chance.
    pub fn roll<R: Rng + ?Sized>(self, base_chance: f64, level: u32, rng: &mut R) -> bool {
        roll_success(self.effective_chance(base_chance, level), rng)
    }
}

/// Tiered final chance.
///
/// Level 0 and bases at or above the soft cap return the base unchanged.
#[must_use]
pub fn final_chance(base_chance: f64, level: u32) -> f64 {
    if level == 0 || base_chance >= SOFT_CAP_PERCENT {
        return base_chance;
    }
    let bonus = DropRarity::classify(base_chance).bonus(base_chance, level);
    (base_chance + bonus).min(SOFT_CAP_PERCENT).max(base_chance)
}

/// Combined probability of the base trial plus `level` bonus trials.
#[must_use]
pub fn bonus_roll_chance(base_chance: f64, level: u32) -> f64 {
    if level == 0 || base_chance >= SOFT_CAP_PERCENT {
        return base_chance;
    }
    let p = (base_chance / 100.0).clamp(0.0, 1.0);
    let mut miss_all = 1.0 - p;
    for i in 0..level.min(MAX_EFFECTIVE_LEVEL) {
        let extra = p * BONUS_ROLL_SCALE / f64::from(i + 1);
        miss_all *= 1.0 - extra;
    }
    let combined = (1.0 - miss_all) * 100.0;
    combined.min(SOFT_CAP_PERCENT).max(base_chance)
}

/// Mean of [`final_chance`] and [`bonus_roll_chance`].
#[must_use]
pub fn hybrid_chance(base_chance: f64, level: u32) -> f64 {
    if level == 0 {
        return base_chance;
    }
    (final_chance(base_chance, level) + bonus_roll_chance(base_chance, level)) / 2.0
}

/// Returns true with probability `chance_percent / 100`.
pub fn roll_success<R: Rng + ?Sized>(chance_percent: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() * 100.0 < chance_percent
}

/// Uniform amount in `[min, max]` plus one extra item per level with
/// probability `1 / (i + 1)`.
pub fn amount_with_bonus<R: Rng + ?Sized>(min: u32, max: u32, level: u32, rng: &mut R) -> u32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let mut amount = rng.gen_range(low..=high);
    for i in 0..level.min(MAX_EFFECTIVE_LEVEL) {
        if rng.gen_bool(1.0 / f64::from(i + 1)) {
            amount = amount.saturating_add(1);
        }
    }
    amount
}
