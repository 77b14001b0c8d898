//! Benchmark for drop chance and loot table rolls.
//!
//! Run with: cargo bench --package lootwarden_loot --bench chance_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lootwarden_loot::chance::{bonus_roll_chance, final_chance};
use lootwarden_loot::{run_statistics, ChanceModel, DropEntry, LootTable};
use lootwarden_shared::MemoryCatalog;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn create_test_table(catalog: &MemoryCatalog) -> LootTable {
    let mut table = LootTable::new(ChanceModel::Tiered);
    table.insert(
        "diamond_ore",
        vec![
            DropEntry::new("ruby", 70.0, 1, 3, catalog).unwrap(),
            DropEntry::new("sapphire", 20.0, 1, 1, catalog).unwrap(),
            DropEntry::new("onyx", 5.0, 1, 1, catalog).unwrap(),
            DropEntry::new("starshard", 0.05, 1, 1, catalog).unwrap(),
        ],
    );
    table
}

fn benchmark_final_chance(c: &mut Criterion) {
    c.bench_function("final_chance", |b| {
        let mut level = 0u32;
        b.iter(|| {
            level = (level + 1) % 10;
            black_box(final_chance(black_box(5.0), black_box(level)))
        });
    });

    c.bench_function("bonus_roll_chance_level_5", |b| {
        b.iter(|| black_box(bonus_roll_chance(black_box(5.0), black_box(5))));
    });
}

fn benchmark_table_rolls(c: &mut Criterion) {
    let catalog = MemoryCatalog::new(["ruby", "sapphire", "onyx", "starshard"]);
    let table = create_test_table(&catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let mut group = c.benchmark_group("table_rolls");
    group.throughput(Throughput::Elements(100_000));
    group.sample_size(10);

    group.bench_function("100k_rolls_fortune_3", |b| {
        b.iter(|| {
            for _ in 0..100_000 {
                black_box(table.get_drops_with_rng("diamond_ore", 3, &catalog, &mut rng));
            }
        });
    });

    group.finish();
}

fn benchmark_statistics(c: &mut Criterion) {
    let catalog = MemoryCatalog::new(["ruby", "sapphire", "onyx", "starshard"]);
    let table = create_test_table(&catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    c.bench_function("statistics_10k", |b| {
        b.iter(|| {
            black_box(run_statistics(
                &table,
                black_box("diamond_ore"),
                black_box(3),
                &catalog,
                black_box(10_000),
                &mut rng,
            ))
        });
    });
}

criterion_group!(
    benches,
    benchmark_final_chance,
    benchmark_table_rolls,
    benchmark_statistics
);
criterion_main!(benches);
