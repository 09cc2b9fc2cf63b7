use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use btree_multiset::BTree;

const N: usize = 10_000;
const ORDERS: [usize; 3] = [4, 16, 64];

// ─── Helper functions to generate value sequences ───────────────────────────

fn random_values(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut values = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        values.push((x >> 33) as i64);
    }
    values
}

fn sorted_values(n: usize) -> Vec<i64> {
    let mut values = random_values(n);
    values.sort_unstable();
    values
}

// ─── Construction ───────────────────────────────────────────────────────────

fn bench_insert_random(c: &mut Criterion) {
    let values = random_values(N);
    let mut group = c.benchmark_group("insert_random");

    for order in ORDERS {
        group.bench_function(BenchmarkId::new("BTree", order), |b| {
            b.iter(|| {
                let mut tree = BTree::new(order);
                for &v in &values {
                    tree.insert(v);
                }
                tree
            });
        });
    }

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = BTreeSet::new();
            for &v in &values {
                set.insert(v);
            }
            set
        });
    });

    group.finish();
}

fn bench_bulkload(c: &mut Criterion) {
    let values = sorted_values(N);
    let mut group = c.benchmark_group("bulkload");

    for order in ORDERS {
        group.bench_function(BenchmarkId::new("bulkload", order), |b| {
            b.iter(|| BTree::bulkload(values.iter().copied(), order));
        });

        group.bench_function(BenchmarkId::new("insert_sorted", order), |b| {
            b.iter(|| {
                let mut tree = BTree::new(order);
                for &v in &values {
                    tree.insert_after(v);
                }
                tree
            });
        });
    }

    group.finish();
}

// ─── Removal ────────────────────────────────────────────────────────────────

fn bench_remove_random(c: &mut Criterion) {
    let values = random_values(N);
    let mut group = c.benchmark_group("remove_random");

    for order in ORDERS {
        let tree = BTree::bulkload(sorted_values(N), order);
        group.bench_function(BenchmarkId::new("BTree", order), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    for v in &values {
                        let _ = tree.remove(v);
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_pull_prefix(c: &mut Criterion) {
    let values = sorted_values(N);
    let mut group = c.benchmark_group("pull_prefix");

    for order in ORDERS {
        let tree = BTree::bulkload(values.iter().copied(), order);
        for fraction in [1, 10, 50] {
            let pivot = values[N * fraction / 100];
            group.bench_function(BenchmarkId::new(format!("order_{order}"), format!("{fraction}%")), |b| {
                b.iter_batched(|| tree.clone(), |mut tree| tree.pull_prefix(&pivot).count(), BatchSize::LargeInput);
            });
        }
    }

    group.finish();
}

// ─── Timer workload ─────────────────────────────────────────────────────────

fn bench_timer_ticks(c: &mut Criterion) {
    let delays: Vec<u64> = random_values(N).into_iter().map(|v| v.unsigned_abs() % 1_000).collect();
    let mut group = c.benchmark_group("timer_ticks");

    group.bench_function(BenchmarkId::new("BTree", N), |b| {
        b.iter(|| {
            let mut timers = BTree::new(16);
            let mut fired = 0;
            for (now, &delay) in (0u64..).zip(&delays) {
                timers.insert((now + delay, now));
                fired += timers.pull_prefix(&(now, u64::MAX)).count();
            }
            fired
        });
    });

    group.bench_function(BenchmarkId::new("BinaryHeap", N), |b| {
        b.iter(|| {
            let mut timers = BinaryHeap::new();
            let mut fired = 0;
            for (now, &delay) in (0u64..).zip(&delays) {
                timers.push(Reverse((now + delay, now)));
                while timers.peek().is_some_and(|Reverse((deadline, _))| *deadline <= now) {
                    timers.pop();
                    fired += 1;
                }
            }
            fired
        });
    });

    group.finish();
}

criterion_group!(construction_benches, bench_insert_random, bench_bulkload);

criterion_group!(removal_benches, bench_remove_random, bench_pull_prefix);

criterion_group!(timer_benches, bench_timer_ticks);

criterion_main!(construction_benches, removal_benches, timer_benches);
