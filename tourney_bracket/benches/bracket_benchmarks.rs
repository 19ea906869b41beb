use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tourney_bracket::bracket::{RandomSeeder, Seeder, parent_position, plan_bracket};

/// Benchmark laying out brackets of increasing size
fn bench_plan_bracket(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_bracket");

    for participants in [4i64, 13, 64, 257, 1024] {
        let roster: Vec<i64> = (1..=participants).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &roster,
            |b, roster| {
                b.iter(|| plan_bracket(black_box("open"), black_box(roster)));
            },
        );
    }

    group.finish();
}

/// Benchmark shuffling a roster before pairing
fn bench_random_seeding(c: &mut Criterion) {
    let seeder = RandomSeeder::from_seed(42);
    let mut roster: Vec<i64> = (1..=256).collect();

    c.bench_function("random_seeding_256", |b| {
        b.iter(|| seeder.seed(black_box(&mut roster)));
    });
}

/// Benchmark the advancement index arithmetic
fn bench_parent_position(c: &mut Criterion) {
    c.bench_function("parent_position_1024", |b| {
        b.iter(|| {
            for m in 1..=1024u32 {
                black_box(parent_position(black_box(m)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_plan_bracket,
    bench_random_seeding,
    bench_parent_position
);
criterion_main!(benches);
