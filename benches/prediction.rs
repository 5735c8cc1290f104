//! Prediction benchmarks for the interpreted and compiled tree backends.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jit_trees::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn generate_data(samples: usize, features: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((samples, features), |_| rng.gen_range(-1.0..1.0));
    let y = x
        .rows()
        .into_iter()
        .map(|row| row.iter().enumerate().map(|(j, v)| v * (j % 3) as f64).sum::<f64>())
        .collect();
    (x, y)
}

fn fit_model(backend: TreeBackendKind, threads: usize) -> Result<GradientBoosting> {
    let (x, y) = generate_data(2_000, 16, 42);
    let training = TrainingConfigBuilder::new()
        .tree_count(100)
        .tree_depth(6)
        .learning_rate(0.3)
        .build()?;
    let mut model = GradientBoosting::new(ModelConfig {
        use_early_stopping: false,
        thread_count: threads,
        backend,
        ..ModelConfig::default()
    })?;
    model.fit(x.view(), y.view(), x.view(), y.view(), &training)?;
    Ok(model)
}

fn backends() -> Vec<(&'static str, TreeBackendKind)> {
    let mut backends = vec![("interpreted", TreeBackendKind::Interpreted)];
    #[cfg(feature = "jit")]
    {
        use jit_trees::holder::jit::{compiler_available, default_compiler};
        if compiler_available(&default_compiler()) {
            backends.push(("if_else", TreeBackendKind::compiled(SourceStyle::IfElse)));
            backends.push(("loop", TreeBackendKind::compiled(SourceStyle::Loop)));
        }
    }
    backends
}

fn bench_single_sample(c: &mut Criterion) {
    let (x, _) = generate_data(1, 16, 7);
    let sample = x.row(0).to_vec();

    let mut group = c.benchmark_group("predict/single");
    for (name, backend) in backends() {
        let model = fit_model(backend, 1).expect("benchmark model");
        group.bench_function(name, |b| {
            b.iter(|| black_box(model.predict(black_box(&sample)).unwrap()))
        });
    }
    group.finish();
}

fn bench_batch_thread_scaling(c: &mut Criterion) {
    let batch_size = 10_000;
    let (x, _) = generate_data(batch_size, 16, 11);

    let mut group = c.benchmark_group("predict/batch");
    group.throughput(Throughput::Elements(batch_size as u64));
    for (name, backend) in backends() {
        for threads in [1, 2, 4] {
            let model = fit_model(backend.clone(), threads).expect("benchmark model");
            group.bench_with_input(BenchmarkId::new(name, threads), &x, |b, x| {
                b.iter(|| black_box(model.predict_batch(black_box(x.view())).unwrap()))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_single_sample, bench_batch_thread_scaling);
criterion_main!(benches);
