use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use linfa::prelude::*;
use linfa_lars::{Lars, LarsCv};
use ndarray::{Array1, Array2, Ix1};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn sparse_dataset(n_samples: usize, n_features: usize) -> Dataset<f64, f64, Ix1> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let x = Array2::<f64>::random_using((n_samples, n_features), StandardNormal, &mut rng);
    let noise = Array1::<f64>::random_using(n_samples, StandardNormal, &mut rng);
    let beta = Array1::from_shape_fn(n_features, |j| if j % 10 == 0 { 1.0 } else { 0.0 });
    let y = x.dot(&beta) + noise;
    Dataset::new(x, y)
}

fn path(c: &mut Criterion) {
    let mut benchmark = c.benchmark_group("lars path");
    benchmark.sample_size(20);

    for (n_samples, n_features) in [(200, 20), (200, 100), (100, 400)] {
        let dataset = sparse_dataset(n_samples, n_features);
        benchmark.bench_function(
            BenchmarkId::new("fit", format!("{}x{}", n_samples, n_features)),
            |bencher| {
                bencher.iter(|| Lars::params().fit(black_box(&dataset)).unwrap());
            },
        );
    }
    benchmark.finish();
}

fn cross_validation(c: &mut Criterion) {
    let mut benchmark = c.benchmark_group("lars cv");
    benchmark.sample_size(10);

    let dataset = sparse_dataset(200, 50);
    for n_folds in [5, 10] {
        benchmark.bench_function(BenchmarkId::new("folds", n_folds), |bencher| {
            bencher.iter(|| {
                LarsCv::params()
                    .n_folds(n_folds)
                    .fit(black_box(&dataset))
                    .unwrap()
            });
        });
    }
    benchmark.finish();
}

criterion_group!(benches, path, cross_validation);
criterion_main!(benches);
