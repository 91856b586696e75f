use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use tree_multimap::{DfsOrder, IterationType, TreeMultimap};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn filled(n: usize, seed: u64) -> TreeMultimap<u64, u64> {
    let mut t = TreeMultimap::new();
    for (i, x) in lcg(seed).take(n).enumerate() {
        t.add(x % (n as u64 / 2).max(1), i as u64);
    }
    t
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("tree_multimap_add_10k", |b| {
        b.iter_batched(
            TreeMultimap::<u64, u64>::new,
            |mut t| {
                // Half as many distinct keys as adds, so counts get bumped too.
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.add(x % 5_000, i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("tree_multimap_get_hit", |b| {
        let t = filled(20_000, 7);
        let keys: Vec<u64> = t.keys().copied().collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.get(k));
        })
    });
}

fn bench_delete_10k(c: &mut Criterion) {
    c.bench_function("tree_multimap_delete_10k_of_20k", |b| {
        b.iter_batched(
            || {
                let t = filled(20_000, 5);
                let victims: Vec<u64> = t.keys().copied().step_by(2).collect();
                (t, victims)
            },
            |(mut t, victims)| {
                for k in &victims {
                    let _ = t.delete(k, true);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_perfectly_balance(c: &mut Criterion) {
    for (name, it) in [
        ("tree_multimap_rebuild_recursive_10k", IterationType::Recursive),
        ("tree_multimap_rebuild_iterative_10k", IterationType::Iterative),
    ] {
        c.bench_function(name, |b| {
            b.iter_batched(
                || filled(10_000, 11),
                |mut t| {
                    t.perfectly_balance(Some(it));
                    black_box(t)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_in_order(c: &mut Criterion) {
    c.bench_function("tree_multimap_dfs_in_order_20k", |b| {
        let t = filled(20_000, 13);
        b.iter(|| black_box(t.dfs(DfsOrder::In)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_add, bench_get_hit, bench_delete_10k, bench_perfectly_balance, bench_in_order
}
criterion_main!(benches);
