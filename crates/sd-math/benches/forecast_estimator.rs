use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sd_math::estimate;

fn bench_estimate(c: &mut Criterion) {
    let full = [Some(100.0), Some(110.0), Some(120.0), Some(130.0), Some(132.0)];
    let sparse = [None, Some(18.5), None, None, Some(21.0)];

    c.bench_function("estimate_full_window", |b| {
        b.iter(|| estimate(black_box(&full)))
    });
    c.bench_function("estimate_sparse_window", |b| {
        b.iter(|| estimate(black_box(&sparse)))
    });
}

criterion_group!(benches, bench_estimate);
criterion_main!(benches);
