//! # Loot Simulator
//!
//! Offline checks for config authors:
//!
//! ```text
//! loot_sim drops  --config lootwarden.toml --section block --key diamond_ore --level 3
//! loot_sim chance --base 0.5 --max-level 5
//! loot_sim raid   --config lootwarden.toml --raid crypt
//! ```
//!
//! Item ids are not checked against a real catalog; every id is accepted.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use lootwarden::config::PluginConfig;
use lootwarden::content::LootContent;
use lootwarden_loot::{run_statistics, ChanceModel, DropRarity, LootTable};
use lootwarden_mobs::{AbilityTracker, RaidHost, RaidManager, SandboxWorld};
use lootwarden_shared::{ItemCatalog, ItemStack};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Upper bound on simulated raid ticks.
const MAX_RAID_TICKS: u32 = 10_000;

#[derive(Parser, Debug)]
#[command(name = "loot_sim", about = "Simulate lootwarden drop tables and raids")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Roll a drop table many times and report observed rates.
    Drops {
        /// Plugin config file.
        #[arg(long)]
        config: PathBuf,
        /// Which section to roll.
        #[arg(long, value_enum, default_value_t = Section::Block)]
        section: Section,
        /// Trigger key (`diamond_ore`, `zombie`).
        #[arg(long)]
        key: String,
        /// Fortune or Looting level.
        #[arg(long, default_value_t = 0)]
        level: u32,
        /// Number of simulated triggers.
        #[arg(long, default_value_t = 100_000)]
        iterations: u64,
        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the effective chance of a base chance per level.
    Chance {
        /// Base chance in percent.
        #[arg(long)]
        base: f64,
        /// Highest level to print.
        #[arg(long, default_value_t = 5)]
        max_level: u32,
        /// Chance model.
        #[arg(long, value_enum, default_value_t = Model::Tiered)]
        model: Model,
    },
    /// Run a raid in a sandbox where every wave dies immediately.
    Raid {
        /// Plugin config file.
        #[arg(long)]
        config: PathBuf,
        /// Raid id.
        #[arg(long)]
        raid: String,
        /// Biome the sandbox player stands in.
        #[arg(long, default_value = "plains")]
        biome: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Section {
    Block,
    Mob,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Model {
    Tiered,
    BonusRoll,
    Hybrid,
}

impl From<Model> for ChanceModel {
    fn from(model: Model) -> Self {
        match model {
            Model::Tiered => Self::Tiered,
            Model::BonusRoll => Self::BonusRoll,
            Model::Hybrid => Self::Hybrid,
        }
    }
}

/// Accepts every item id.
struct AnyItemCatalog;

impl ItemCatalog for AnyItemCatalog {
    fn exists(&self, item_id: &str) -> bool {
        !item_id.trim().is_empty()
    }

    fn build(&self, item_id: &str) -> Option<ItemStack> {
        self.exists(item_id).then(|| ItemStack::new(item_id, 1))
    }
}

fn load_content(path: &Path) -> Result<LootContent, String> {
    let config = PluginConfig::load(path).map_err(|error| error.to_string())?;
    Ok(LootContent::build(&config, &AnyItemCatalog))
}

fn run_drops(
    config: &Path,
    section: Section,
    key: &str,
    level: u32,
    iterations: u64,
    seed: u64,
) -> Result<(), String> {
    let content = load_content(config)?;
    let table: &LootTable = match section {
        Section::Block => &content.block_drops,
        Section::Mob => &content.mob_drops,
    };
    let Some(entries) = table.entries(key) else {
        return Err(format!("no drops configured for {key}"));
    };

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let stats = run_statistics(table, key, level, &AnyItemCatalog, iterations, &mut rng);

    println!("{key} at level {level}, {iterations} rolls, model {:?}", table.model());
    println!("any drop: {:.3}%", stats.drop_rate_percent());
    println!("{:<24} {:>9} {:>11} {:>10} {:>10}", "item", "base %", "expected %", "observed %", "avg amt");
    for entry in entries {
        let (hits, total) = stats.item_counts.get(&entry.item_id).copied().unwrap_or((0, 0));
        #[allow(clippy::cast_precision_loss)]
        let average = if hits == 0 { 0.0 } else { total as f64 / hits as f64 };
        println!(
            "{:<24} {:>9.3} {:>11.3} {:>10.3} {:>10.2}",
            entry.item_id,
            entry.chance,
            table.model().effective_chance(entry.chance, level),
            stats.item_rate_percent(&entry.item_id),
            average
        );
    }
    Ok(())
}

fn run_chance(base: f64, max_level: u32, model: Model) -> Result<(), String> {
    if !(base > 0.0 && base <= 100.0) {
        return Err(format!("base chance {base} is outside (0, 100]"));
    }
    let model = ChanceModel::from(model);
    println!("base {base}% ({:?}), model {model:?}", DropRarity::classify(base));
    for level in 0..=max_level {
        println!("level {level:>3}: {:.4}%", model.effective_chance(base, level));
    }
    Ok(())
}

fn run_raid(config: &Path, raid_id: &str, biome: &str) -> Result<(), String> {
    let content = load_content(config)?;
    let manager = RaidManager::new(content.raids, std::sync::Arc::new(AbilityTracker::new()));
    let world = SandboxWorld::new();
    let player = world.join(biome);
    manager
        .start_raid(player, raid_id, &world)
        .map_err(|error| error.to_string())?;

    let mut ticks = 0;
    while manager.is_in_raid(player) && ticks < MAX_RAID_TICKS {
        ticks += 1;
        for (_, phase) in manager.tick_all(&world, &AnyItemCatalog, None) {
            println!("tick {ticks}: finished {phase:?}");
        }
        world.kill_all();
        manager.abilities().tick(&world);
    }
    if manager.is_in_raid(player) {
        manager.stop_raid(player, &world);
    }
    for event in world.events(player) {
        println!("{event:?}");
    }
    println!(
        "{} mobs spawned, online at end: {}",
        world.spawn_count(),
        world.is_online(player)
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Drops {
            config,
            section,
            key,
            level,
            iterations,
            seed,
        } => run_drops(&config, section, &key, level, iterations, seed),
        Command::Chance { base, max_level, model } => run_chance(base, max_level, model),
        Command::Raid { config, raid, biome } => run_raid(&config, &raid, &biome),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
