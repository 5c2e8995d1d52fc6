//! Benchmarks for the leaf embedding hot paths.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use treelin::embedding::LeafEmbedder;
use treelin::testing::two_cluster_dataset;
use treelin::training::GBDTParams;
use treelin::utils::Parallelism;

fn params() -> GBDTParams {
    GBDTParams { n_trees: 50, max_depth: 3, ..Default::default() }
}

fn bench_transform(c: &mut Criterion) {
    let train = two_cluster_dataset(2000, 10, 0);
    let embedding = LeafEmbedder::new(params())
        .fit(&train, Parallelism::Sequential)
        .expect("fit succeeds on synthetic data");

    let mut group = c.benchmark_group("transform");
    for &n_rows in &[100usize, 1000, 10_000] {
        let batch = two_cluster_dataset(n_rows, 10, 1);
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &batch, |b, batch| {
            b.iter(|| embedding.transform(black_box(&batch.features())).unwrap());
        });
    }
    group.finish();
}

fn bench_fit_transform(c: &mut Criterion) {
    let train = two_cluster_dataset(1000, 10, 2);

    c.bench_function("fit_transform/1000x10", |b| {
        b.iter(|| {
            LeafEmbedder::new(params())
                .fit_transform(black_box(&train), Parallelism::Sequential)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_transform, bench_fit_transform);
criterion_main!(benches);
