use criterion::{criterion_group, criterion_main, Criterion};

use csdf_graph::algo::mcr::{max_cycle_ratio, RatioEdge};

fn ring(n: usize) -> Vec<RatioEdge> {
    (0..n)
        .map(|i| {
            let to = (i + 1) % n;
            RatioEdge {
                from: i,
                to,
                weight: (i as i64 + 1) * 7,
                tokens: (i as i64 % 3) + 1,
                edge: (i, to, 0),
            }
        })
        .collect()
}

fn mcr_on_rings(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("max_cycle_ratio/ring");

    for size in [6usize, 64, 512] {
        let edges = ring(size);
        group.bench_with_input(format!("n={size}"), &edges, |bench, edges| {
            bench.iter(|| max_cycle_ratio(size, edges).unwrap());
        });
    }
}

criterion_group!(mcr, mcr_on_rings);
criterion_main!(mcr);
