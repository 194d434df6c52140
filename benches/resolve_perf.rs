use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use limoka_search::model::types::Module;
use limoka_search::search::{Resolver, ScoredConfig, flatten};
use std::hint::black_box;

/// Deterministic catalog of `n` modules with three commands each.
fn synthetic_catalog(n: usize) -> Vec<Module> {
    (0..n)
        .map(|i| {
            Module::new(
                i as i64 + 1,
                format!("module{i}"),
                format!("Module number {i} handles chat tasks like notes, reminders and stickers"),
            )
            .with_command(format!("cmd{i}a"), "first command")
            .with_command(format!("cmd{i}b"), "second command")
            .with_command(format!("cmd{i}c"), "third command")
        })
        .collect()
}

fn bench_flatten(c: &mut Criterion) {
    let catalog = synthetic_catalog(1000);
    c.bench_function("flatten_1000_modules", |b| {
        b.iter(|| black_box(flatten(&catalog)))
    });
}

/// Boolean hit, fuzzy hit, and a full miss that runs every stage.
fn bench_staged_stages(c: &mut Criterion) {
    let resolver = Resolver::default();
    let mut group = c.benchmark_group("staged_resolve");
    for size in [100usize, 1000] {
        let catalog = synthetic_catalog(size);
        for (label, query) in [("boolean", "reminders"), ("fuzzy", "remindrs"), ("miss", "qqqqqq")] {
            group.bench_with_input(BenchmarkId::new(label, size), &catalog, |b, catalog| {
                b.iter(|| black_box(resolver.resolve(query, catalog).unwrap()))
            });
        }
    }
    group.finish();
}

fn bench_scored(c: &mut Criterion) {
    let resolver = Resolver::scored(ScoredConfig::default());
    let catalog = synthetic_catalog(1000);
    c.bench_function("scored_resolve_1000_modules", |b| {
        b.iter(|| black_box(resolver.resolve("module500", &catalog).unwrap()))
    });
}

criterion_group!(benches, bench_flatten, bench_staged_stages, bench_scored);
criterion_main!(benches);
