//! # Static Catalogs
//!
//! Stable string identifiers for biomes, mob types and structures, each with a
//! display name and a category tag. Lookups are case-insensitive and accept an
//! optional `minecraft:` namespace.
//!
//! The host adapter is responsible for mapping engine-native enums onto these
//! ids; nothing here knows about the engine.

/// Normalizes an engine identifier: lowercase, no namespace, `_` separators.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_ns = trimmed.rsplit_once(':').map_or(trimmed, |(_, rest)| rest);
    without_ns
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Returns true if `raw` is shaped like a block material name.
///
/// Materials are not catalogued (there are over a thousand); the host adapter
/// rejects names it cannot map, this only filters obvious garbage.
#[must_use]
pub fn is_material_name(raw: &str) -> bool {
    let id = normalize_id(raw);
    !id.is_empty()
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// =============================================================================
// BIOMES
// =============================================================================

/// Coarse climate grouping of a biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeCategory {
    /// Plains, forests, swamps.
    Temperate,
    /// Snowy and frozen biomes.
    Cold,
    /// Deserts, savannas, badlands.
    Dry,
    /// Oceans and rivers.
    Aquatic,
    /// Hills, peaks and slopes.
    Mountain,
    /// Caves and the deep dark.
    Underground,
    /// Nether biomes.
    Nether,
    /// End biomes.
    End,
}

/// A catalogued biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BiomeType {
    /// Stable id (`plains`).
    pub id: &'static str,
    /// Human readable name.
    pub display_name: &'static str,
    /// Category tag.
    pub category: BiomeCategory,
}

macro_rules! biome {
    ($id:literal, $name:literal, $cat:ident) => {
        BiomeType {
            id: $id,
            display_name: $name,
            category: BiomeCategory::$cat,
        }
    };
}

/// Every biome known to the plugin.
pub const BIOMES: &[BiomeType] = &[
    biome!("plains", "Plains", Temperate),
    biome!("sunflower_plains", "Sunflower Plains", Temperate),
    biome!("forest", "Forest", Temperate),
    biome!("flower_forest", "Flower Forest", Temperate),
    biome!("birch_forest", "Birch Forest", Temperate),
    biome!("dark_forest", "Dark Forest", Temperate),
    biome!("cherry_grove", "Cherry Grove", Temperate),
    biome!("meadow", "Meadow", Temperate),
    biome!("swamp", "Swamp", Temperate),
    biome!("mangrove_swamp", "Mangrove Swamp", Temperate),
    biome!("jungle", "Jungle", Temperate),
    biome!("bamboo_jungle", "Bamboo Jungle", Temperate),
    biome!("mushroom_fields", "Mushroom Fields", Temperate),
    biome!("taiga", "Taiga", Cold),
    biome!("snowy_plains", "Snowy Plains", Cold),
    biome!("snowy_taiga", "Snowy Taiga", Cold),
    biome!("ice_spikes", "Ice Spikes", Cold),
    biome!("frozen_river", "Frozen River", Cold),
    biome!("snowy_beach", "Snowy Beach", Cold),
    biome!("grove", "Grove", Cold),
    biome!("desert", "Desert", Dry),
    biome!("savanna", "Savanna", Dry),
    biome!("savanna_plateau", "Savanna Plateau", Dry),
    biome!("badlands", "Badlands", Dry),
    biome!("eroded_badlands", "Eroded Badlands", Dry),
    biome!("wooded_badlands", "Wooded Badlands", Dry),
    biome!("ocean", "Ocean", Aquatic),
    biome!("deep_ocean", "Deep Ocean", Aquatic),
    biome!("warm_ocean", "Warm Ocean", Aquatic),
    biome!("lukewarm_ocean", "Lukewarm Ocean", Aquatic),
    biome!("cold_ocean", "Cold Ocean", Aquatic),
    biome!("frozen_ocean", "Frozen Ocean", Aquatic),
    biome!("river", "River", Aquatic),
    biome!("beach", "Beach", Aquatic),
    biome!("windswept_hills", "Windswept Hills", Mountain),
    biome!("jagged_peaks", "Jagged Peaks", Mountain),
    biome!("frozen_peaks", "Frozen Peaks", Mountain),
    biome!("stony_peaks", "Stony Peaks", Mountain),
    biome!("snowy_slopes", "Snowy Slopes", Mountain),
    biome!("dripstone_caves", "Dripstone Caves", Underground),
    biome!("lush_caves", "Lush Caves", Underground),
    biome!("deep_dark", "Deep Dark", Underground),
    biome!("nether_wastes", "Nether Wastes", Nether),
    biome!("crimson_forest", "Crimson Forest", Nether),
    biome!("warped_forest", "Warped Forest", Nether),
    biome!("soul_sand_valley", "Soul Sand Valley", Nether),
    biome!("basalt_deltas", "Basalt Deltas", Nether),
    biome!("the_end", "The End", End),
    biome!("end_highlands", "End Highlands", End),
    biome!("end_midlands", "End Midlands", End),
    biome!("small_end_islands", "Small End Islands", End),
    biome!("end_barrens", "End Barrens", End),
];

impl BiomeType {
    /// Finds a biome by id.
    #[must_use]
    pub fn find(raw: &str) -> Option<&'static Self> {
        let id = normalize_id(raw);
        BIOMES.iter().find(|b| b.id == id)
    }
}

// =============================================================================
// MOBS
// =============================================================================

/// Behaviour grouping of a mob type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MobCategory {
    /// Attacks on sight.
    Hostile,
    /// Attacks when provoked.
    Neutral,
    /// Never attacks.
    Passive,
    /// Boss mobs.
    Boss,
}

/// A catalogued mob type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobType {
    /// Stable id (`zombie`).
    pub id: &'static str,
    /// Human readable name.
    pub display_name: &'static str,
    /// Category tag.
    pub category: MobCategory,
}

macro_rules! mob {
    ($id:literal, $name:literal, $cat:ident) => {
        MobType {
            id: $id,
            display_name: $name,
            category: MobCategory::$cat,
        }
    };
}

/// Every mob type known to the plugin.
pub const MOBS: &[MobType] = &[
    mob!("zombie", "Zombie", Hostile),
    mob!("husk", "Husk", Hostile),
    mob!("drowned", "Drowned", Hostile),
    mob!("zombie_villager", "Zombie Villager", Hostile),
    mob!("skeleton", "Skeleton", Hostile),
    mob!("stray", "Stray", Hostile),
    mob!("wither_skeleton", "Wither Skeleton", Hostile),
    mob!("creeper", "Creeper", Hostile),
    mob!("spider", "Spider", Neutral),
    mob!("cave_spider", "Cave Spider", Neutral),
    mob!("enderman", "Enderman", Neutral),
    mob!("witch", "Witch", Hostile),
    mob!("slime", "Slime", Hostile),
    mob!("magma_cube", "Magma Cube", Hostile),
    mob!("blaze", "Blaze", Hostile),
    mob!("ghast", "Ghast", Hostile),
    mob!("phantom", "Phantom", Hostile),
    mob!("silverfish", "Silverfish", Hostile),
    mob!("endermite", "Endermite", Hostile),
    mob!("guardian", "Guardian", Hostile),
    mob!("elder_guardian", "Elder Guardian", Hostile),
    mob!("shulker", "Shulker", Hostile),
    mob!("vindicator", "Vindicator", Hostile),
    mob!("evoker", "Evoker", Hostile),
    mob!("pillager", "Pillager", Hostile),
    mob!("ravager", "Ravager", Hostile),
    mob!("vex", "Vex", Hostile),
    mob!("piglin", "Piglin", Neutral),
    mob!("piglin_brute", "Piglin Brute", Hostile),
    mob!("zombified_piglin", "Zombified Piglin", Neutral),
    mob!("hoglin", "Hoglin", Hostile),
    mob!("zoglin", "Zoglin", Hostile),
    mob!("warden", "Warden", Hostile),
    mob!("breeze", "Breeze", Hostile),
    mob!("bogged", "Bogged", Hostile),
    mob!("wolf", "Wolf", Neutral),
    mob!("iron_golem", "Iron Golem", Neutral),
    mob!("polar_bear", "Polar Bear", Neutral),
    mob!("bee", "Bee", Neutral),
    mob!("cow", "Cow", Passive),
    mob!("pig", "Pig", Passive),
    mob!("sheep", "Sheep", Passive),
    mob!("chicken", "Chicken", Passive),
    mob!("rabbit", "Rabbit", Passive),
    mob!("horse", "Horse", Passive),
    mob!("villager", "Villager", Passive),
    mob!("ender_dragon", "Ender Dragon", Boss),
    mob!("wither", "Wither", Boss),
];

impl MobType {
    /// Finds a mob type by id.
    #[must_use]
    pub fn find(raw: &str) -> Option<&'static Self> {
        let id = normalize_id(raw);
        MOBS.iter().find(|m| m.id == id)
    }
}

// =============================================================================
// STRUCTURES
// =============================================================================

/// A catalogued structure with the loot-table segments that belong to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureType {
    /// Stable id (`village`).
    pub id: &'static str,
    /// Human readable name.
    pub display_name: &'static str,
    /// Loot-table path segments owned by this structure.
    pub aliases: &'static [&'static str],
}

/// Every structure known to the plugin.
pub const STRUCTURES: &[StructureType] = &[
    StructureType {
        id: "village",
        display_name: "Village",
        aliases: &[
            "village", "armorer", "butcher", "cartographer", "fisher", "fletcher", "mason",
            "shepherd", "tannery", "temple", "toolsmith", "weaponsmith", "desert_house",
            "plains_house", "savanna_house", "snowy_house", "taiga_house",
        ],
    },
    StructureType {
        id: "desert_pyramid",
        display_name: "Desert Pyramid",
        aliases: &["desert_pyramid", "desert_temple", "desert_pyramid_archaeology"],
    },
    StructureType {
        id: "jungle_temple",
        display_name: "Jungle Temple",
        aliases: &["jungle_temple", "jungle_pyramid", "jungle_temple_dispenser"],
    },
    StructureType {
        id: "mineshaft",
        display_name: "Mineshaft",
        aliases: &["mineshaft", "abandoned_mineshaft"],
    },
    StructureType {
        id: "stronghold",
        display_name: "Stronghold",
        aliases: &["stronghold", "stronghold_corridor", "stronghold_crossing", "stronghold_library"],
    },
    StructureType {
        id: "dungeon",
        display_name: "Dungeon",
        aliases: &["dungeon", "simple_dungeon", "monster_room"],
    },
    StructureType {
        id: "shipwreck",
        display_name: "Shipwreck",
        aliases: &["shipwreck", "shipwreck_map", "shipwreck_supply", "shipwreck_treasure"],
    },
    StructureType {
        id: "buried_treasure",
        display_name: "Buried Treasure",
        aliases: &["buried_treasure"],
    },
    StructureType {
        id: "ocean_ruin",
        display_name: "Ocean Ruin",
        aliases: &["ocean_ruin", "underwater_ruin", "underwater_ruin_big", "underwater_ruin_small"],
    },
    StructureType {
        id: "pillager_outpost",
        display_name: "Pillager Outpost",
        aliases: &["pillager_outpost", "outpost"],
    },
    StructureType {
        id: "woodland_mansion",
        display_name: "Woodland Mansion",
        aliases: &["woodland_mansion", "mansion"],
    },
    StructureType {
        id: "igloo",
        display_name: "Igloo",
        aliases: &["igloo", "igloo_chest"],
    },
    StructureType {
        id: "ruined_portal",
        display_name: "Ruined Portal",
        aliases: &["ruined_portal"],
    },
    StructureType {
        id: "nether_fortress",
        display_name: "Nether Fortress",
        aliases: &["nether_fortress", "nether_bridge", "fortress"],
    },
    StructureType {
        id: "bastion_remnant",
        display_name: "Bastion Remnant",
        aliases: &["bastion", "bastion_remnant", "bastion_bridge", "bastion_hoglin_stable", "bastion_other", "bastion_treasure"],
    },
    StructureType {
        id: "end_city",
        display_name: "End City",
        aliases: &["end_city", "end_city_treasure"],
    },
    StructureType {
        id: "ancient_city",
        display_name: "Ancient City",
        aliases: &["ancient_city", "ancient_city_ice_box"],
    },
    StructureType {
        id: "trail_ruins",
        display_name: "Trail Ruins",
        aliases: &["trail_ruins", "trail_ruins_common", "trail_ruins_rare"],
    },
    StructureType {
        id: "trial_chambers",
        display_name: "Trial Chambers",
        aliases: &["trial_chambers", "trial_chambers_reward", "trial_chambers_supply", "trial_chambers_corridor"],
    },
];

impl StructureType {
    /// Finds a structure by id.
    #[must_use]
    pub fn find(raw: &str) -> Option<&'static Self> {
        let id = normalize_id(raw);
        STRUCTURES.iter().find(|s| s.id == id)
    }

    /// Maps a loot-table path segment to the structure that owns it.
    #[must_use]
    pub fn from_loot_segment(segment: &str) -> Option<&'static Self> {
        let segment = normalize_id(segment);
        STRUCTURES
            .iter()
            .find(|s| s.aliases.iter().any(|alias| *alias == segment))
    }
}
